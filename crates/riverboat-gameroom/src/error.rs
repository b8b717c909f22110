use riverboat_engine::ActionError;
use riverboat_records::LedgerError;
use riverboat_pg::PgErr;

/// Wire error codes.
///
/// Every failed request is answered with `success = false` and an error
/// string of the form `"[CODE] human message"`.
pub mod code {
    pub const UNAUTHENTICATED: &str = "UNAUTHENTICATED";
    pub const INVALID_DATA: &str = "INVALID_DATA";
    pub const TABLE_NOT_FOUND: &str = "TABLE_NOT_FOUND";
    pub const NOT_AT_TABLE: &str = "NOT_AT_TABLE";
    pub const ALREADY_AT_TABLE: &str = "ALREADY_AT_TABLE";
    pub const TABLE_FULL: &str = "TABLE_FULL";
    pub const INVALID_PASSWORD: &str = "INVALID_PASSWORD";
    pub const INSUFFICIENT_FUNDS: &str = "INSUFFICIENT_FUNDS";
    pub const BUY_IN_OUT_OF_RANGE: &str = "BUY_IN_OUT_OF_RANGE";
    pub const GAME_NOT_ACTIVE: &str = "GAME_NOT_ACTIVE";
    pub const NOT_AUTHORIZED: &str = "NOT_AUTHORIZED";
    pub const REQUEST_TIMEOUT: &str = "REQUEST_TIMEOUT";
    pub const INTERNAL: &str = "INTERNAL";
}

/// A request failure: a stable code plus a human-readable message.
///
/// Engine rejections pass their own codes through (`OUT_OF_TURN`,
/// `ILLEGAL_RAISE_AMOUNT`, ...); everything else uses the constants in
/// [`code`].
#[derive(Debug, Clone)]
pub struct Fault {
    code: &'static str,
    message: String,
}

impl Fault {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
    pub fn code(&self) -> &'static str {
        self.code
    }
    pub fn message(&self) -> &str {
        &self.message
    }
    /// The `error` field of a reply envelope.
    pub fn wire(&self) -> String {
        format!("[{}] {}", self.code, self.message)
    }

    pub fn unauthenticated() -> Self {
        Self::new(code::UNAUTHENTICATED, "authenticate first")
    }
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(code::INVALID_DATA, message)
    }
    pub fn table_not_found() -> Self {
        Self::new(code::TABLE_NOT_FOUND, "no such table")
    }
    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::new(code::INTERNAL, err.to_string())
    }
}

impl std::fmt::Display for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for Fault {}

impl From<ActionError> for Fault {
    fn from(e: ActionError) -> Self {
        Self::new(e.code(), e.to_string())
    }
}

impl From<PgErr> for Fault {
    fn from(e: PgErr) -> Self {
        log::error!("store error: {}", e);
        Self::new(code::INTERNAL, "store failure")
    }
}

impl From<LedgerError> for Fault {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InsufficientFunds => {
                Self::new(code::INSUFFICIENT_FUNDS, "not enough diamonds")
            }
            LedgerError::Store(err) => Self::from(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format() {
        let fault = Fault::new(code::TABLE_FULL, "all seats taken");
        assert_eq!(fault.wire(), "[TABLE_FULL] all seats taken");
    }

    #[test]
    fn engine_codes_pass_through() {
        let fault = Fault::from(ActionError::OutOfTurn);
        assert_eq!(fault.code(), "OUT_OF_TURN");
    }
}
