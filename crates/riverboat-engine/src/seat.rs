use riverboat_cards::Hole;
use riverboat_core::Chips;
use riverboat_core::Position;

/// A player's in-memory state for the current hand.
///
/// Identity stays outside the engine: a seat is addressed by its table seat
/// `number`, and the game manager maps users to numbers. The `cards` field
/// is private information and must never leave the engine unredacted.
///
/// # Fields
///
/// - `state` — Betting, Shoving (all-in), or Folding
/// - `stack` — Chips behind (not yet committed)
/// - `stake` — Chips committed this street
/// - `spent` — Total chips committed this hand
/// - `acted` — Whether the player has acted since the last bet or raise
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seat {
    number: Position,
    state: State,
    stack: Chips,
    stake: Chips,
    spent: Chips,
    acted: bool,
    cards: Hole,
}

impl From<(Position, Chips, Hole)> for Seat {
    fn from((number, stack, cards): (Position, Chips, Hole)) -> Self {
        Self {
            number,
            cards,
            stack,
            spent: 0,
            stake: 0,
            acted: false,
            state: State::Betting,
        }
    }
}

impl Seat {
    /// Table seat number (1-based, stable across hands).
    pub fn number(&self) -> Position {
        self.number
    }
    /// Chips behind (not committed to pot).
    pub fn stack(&self) -> Chips {
        self.stack
    }
    /// Chips committed this street.
    pub fn stake(&self) -> Chips {
        self.stake
    }
    /// Total chips committed this hand.
    pub fn spent(&self) -> Chips {
        self.spent
    }
    /// Current betting status.
    pub fn state(&self) -> State {
        self.state
    }
    /// Whether the player has acted since the last aggression.
    pub fn acted(&self) -> bool {
        self.acted
    }
    /// Hole cards (private information).
    pub fn cards(&self) -> Hole {
        self.cards
    }
    /// Commits chips from stack toward the pot.
    pub fn bet(&mut self, bet: Chips) {
        debug_assert!(bet <= self.stack);
        self.stack -= bet;
        self.stake += bet;
        self.spent += bet;
        if self.stack == 0 {
            self.state = State::Shoving;
        }
    }
    /// Adds winnings to stack.
    pub fn win(&mut self, win: Chips) {
        self.stack += win;
    }
    pub fn fold(&mut self) {
        self.state = State::Folding;
    }
    pub fn touch(&mut self) {
        self.acted = true;
    }
    pub fn untouch(&mut self) {
        self.acted = false;
    }
    /// Street transition: stakes and action flags reset.
    pub fn reset_stake(&mut self) {
        self.stake = 0;
        self.acted = false;
    }
}

impl std::fmt::Display for Seat {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "#{} {} {} {}",
            self.number,
            self.state,
            format!("${:>6}", self.stack),
            self.cards
        )
    }
}

/// Player betting status within a hand.
///
/// - `Betting` — Active and can still make decisions
/// - `Shoving` — All-in, no more decisions but still in the pot
/// - `Folding` — Out of the hand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Betting,
    Shoving,
    Folding,
}

impl State {
    /// True if the player is still competing for the pot.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Betting | Self::Shoving)
    }
    /// Persistence label for the player-hand row.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Betting => "active",
            Self::Shoving => "all_in",
            Self::Folding => "folded",
        }
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            State::Betting => write!(f, "P"),
            State::Shoving => write!(f, "S"),
            State::Folding => write!(f, "F"),
        }
    }
}
