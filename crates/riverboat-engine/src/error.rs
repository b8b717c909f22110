/// Why a player action was rejected.
///
/// Every rejection leaves the engine untouched: invalid actions never consume
/// the player's turn and never move chips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionError {
    OutOfTurn,
    NotInHand,
    AlreadyAllIn,
    IllegalCheck,
    IllegalBetAmount,
    IllegalRaiseAmount,
    InsufficientChips,
    InvalidAction,
}

impl ActionError {
    /// The bracketed wire code for this rejection.
    pub fn code(&self) -> &'static str {
        match self {
            Self::OutOfTurn => "OUT_OF_TURN",
            Self::NotInHand => "NOT_IN_HAND",
            Self::AlreadyAllIn => "ALREADY_ALL_IN",
            Self::IllegalCheck => "ILLEGAL_CHECK",
            Self::IllegalBetAmount => "ILLEGAL_BET_AMOUNT",
            Self::IllegalRaiseAmount => "ILLEGAL_RAISE_AMOUNT",
            Self::InsufficientChips => "INSUFFICIENT_CHIPS",
            Self::InvalidAction => "INVALID_ACTION",
        }
    }
}

impl std::fmt::Display for ActionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfTurn => write!(f, "it is not your turn to act"),
            Self::NotInHand => write!(f, "you are not in this hand"),
            Self::AlreadyAllIn => write!(f, "you are already all in"),
            Self::IllegalCheck => write!(f, "cannot check facing a bet"),
            Self::IllegalBetAmount => write!(f, "bet amount out of bounds"),
            Self::IllegalRaiseAmount => write!(f, "raise below the minimum"),
            Self::InsufficientChips => write!(f, "not enough chips"),
            Self::InvalidAction => write!(f, "action not available in this state"),
        }
    }
}

impl std::error::Error for ActionError {}
