use riverboat_auth::Member;
use riverboat_core::ID;
use riverboat_core::Position;
use riverboat_core::Sequence;
use riverboat_engine::Engine;
use riverboat_records::HandRecord;
use std::collections::HashMap;
use tokio_postgres::Client;

/// Per-table mutable state, owned by the table's lock.
///
/// Every path that reads or mutates engine state or writes hand rows for a
/// table goes through `Games::session(table)` and holds this behind the
/// table's mutex. The session owns a dedicated database connection so its
/// writes can run inside transactions without contending with other tables.
pub struct Session {
    /// Dedicated transactional connection.
    pub(crate) db: Client,
    /// The live hand's engine; None between hands and while waiting.
    pub(crate) engine: Option<Engine>,
    /// The live hand's persistent record, kept current as the hand moves.
    pub(crate) hand: Option<HandRecord>,
    /// Dealt-in users for the live hand, by seat number.
    pub(crate) players: HashMap<Position, Player>,
    /// Bet sequence within the current betting round.
    pub(crate) seq: Sequence,
    /// Seat number that last held the button at this table.
    pub(crate) button: Option<Position>,
    /// Bumped whenever the actor changes or the hand ends; pending action
    /// timers compare epochs and fire only if theirs is still current.
    pub(crate) epoch: u64,
}

/// Identity of a dealt-in player.
#[derive(Debug, Clone)]
pub struct Player {
    pub user: ID<Member>,
    pub username: String,
}

impl Session {
    pub(crate) fn new(db: Client) -> Self {
        Self {
            db,
            engine: None,
            hand: None,
            players: HashMap::new(),
            seq: 0,
            button: None,
            epoch: 0,
        }
    }
    /// The seat number a user is dealt in at, if any.
    pub(crate) fn seat_of(&self, user: ID<Member>) -> Option<Position> {
        self.players
            .iter()
            .find(|(_, p)| p.user == user)
            .map(|(number, _)| *number)
    }
    /// Audience of the live hand: every dealt-in user.
    pub(crate) fn audience(&self) -> Vec<ID<Member>> {
        self.players.values().map(|p| p.user).collect()
    }
}
