use riverboat_core::Chips;

/// A player's voluntary decision at the table.
///
/// `Bet` opens a street (no bet to match); `Raise` carries the street total
/// the player is raising TO, not the increment. `AllIn` pushes the whole
/// stack and is interpreted as a bet or raise depending on the street state.
#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
pub enum Action {
    Fold,
    Check,
    Call,
    Bet(Chips),
    Raise(Chips),
    AllIn,
}

impl Action {
    /// Wire and persistence label.
    pub fn label(&self) -> &'static str {
        match self {
            Action::Fold => "fold",
            Action::Check => "check",
            Action::Call => "call",
            Action::Bet(_) => "bet",
            Action::Raise(_) => "raise",
            Action::AllIn => "all_in",
        }
    }
    /// The declared amount, where the action carries one.
    pub fn amount(&self) -> Option<Chips> {
        match *self {
            Action::Bet(amount) | Action::Raise(amount) => Some(amount),
            _ => None,
        }
    }
    /// Builds an action from its wire label and optional amount.
    pub fn parse(label: &str, amount: Option<Chips>) -> Result<Self, &'static str> {
        match label {
            "fold" => Ok(Action::Fold),
            "check" => Ok(Action::Check),
            "call" => Ok(Action::Call),
            "all_in" => Ok(Action::AllIn),
            "bet" => amount
                .filter(|a| *a > 0)
                .map(Action::Bet)
                .ok_or("bet requires a positive amount"),
            "raise" => amount
                .filter(|a| *a > 0)
                .map(Action::Raise)
                .ok_or("raise requires a positive amount"),
            _ => Err("unknown action"),
        }
    }
}

impl TryFrom<&str> for Action {
    type Error = &'static str;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        let amount = parts.get(1).and_then(|n| n.parse().ok());
        parts
            .first()
            .ok_or("empty action")
            .and_then(|label| Self::parse(&label.to_lowercase(), amount))
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.amount() {
            Some(amount) => write!(f, "{} {}", self.label(), amount),
            None => write!(f, "{}", self.label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_roundtrip() {
        for action in [
            Action::Fold,
            Action::Check,
            Action::Call,
            Action::Bet(40),
            Action::Raise(120),
            Action::AllIn,
        ] {
            assert_eq!(action, Action::try_from(action.to_string().as_str()).unwrap());
        }
    }

    #[test]
    fn parse_rejects_bad_amounts() {
        assert!(Action::try_from("bet").is_err());
        assert!(Action::try_from("raise 0").is_err());
        assert!(Action::try_from("levitate").is_err());
    }
}
