use riverboat_core::Chips;
use riverboat_core::Position;
use serde::Deserialize;

/// `auth` payload: the opaque credential to validate.
#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    pub token: String,
}

/// `table_create` payload.
#[derive(Debug, Deserialize)]
pub struct CreateTableRequest {
    pub name: String,
    #[serde(default = "holdem")]
    pub game_type: String,
    pub max_players: i16,
    pub min_buy_in: Chips,
    pub max_buy_in: Chips,
    pub small_blind: Chips,
    pub big_blind: Chips,
    /// Fraction of the pot in [0, 1]; converted to basis points at creation.
    #[serde(default)]
    pub rake_percent: f64,
    #[serde(default)]
    pub max_rake: Chips,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub turn_timeout_secs: Option<i64>,
}

fn holdem() -> String {
    "texas_holdem".to_string()
}

/// `table_join` payload.
#[derive(Debug, Deserialize)]
pub struct JoinTableRequest {
    pub table_id: uuid::Uuid,
    pub buy_in_amount: Chips,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub preferred_seat: Option<Position>,
}

/// Payload for requests that only name a table: `table_leave`,
/// `table_set_ready`, `table_start_game`, `table_close`, `get_game_state`,
/// `join_table_room`.
#[derive(Debug, Deserialize)]
pub struct TableRequest {
    pub table_id: uuid::Uuid,
}

/// `poker_action` payload.
#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub table_id: uuid::Uuid,
    pub action: String,
    #[serde(default)]
    pub amount: Option<Chips>,
}

/// `hand_history` payload.
#[derive(Debug, Deserialize)]
pub struct HistoryRequest {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl Default for HistoryRequest {
    fn default() -> Self {
        Self {
            limit: default_limit(),
        }
    }
}

fn default_limit() -> i64 {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_defaults() {
        let req: CreateTableRequest = serde_json::from_value(serde_json::json!({
            "name": "river run",
            "max_players": 6,
            "min_buy_in": 400,
            "max_buy_in": 2000,
            "small_blind": 10,
            "big_blind": 20,
        }))
        .unwrap();
        assert_eq!(req.game_type, "texas_holdem");
        assert_eq!(req.rake_percent, 0.0);
        assert!(!req.is_private);
        assert!(req.password.is_none());
    }

    #[test]
    fn action_amount_optional() {
        let req: ActionRequest = serde_json::from_value(serde_json::json!({
            "table_id": uuid::Uuid::nil(),
            "action": "fold",
        }))
        .unwrap();
        assert_eq!(req.action, "fold");
        assert!(req.amount.is_none());
    }
}
