use super::TableRecord;
use riverboat_auth::Member;
use riverboat_cards::Hand;
use riverboat_cards::Hole;
use riverboat_cards::Street;
use riverboat_core::Chips;
use riverboat_core::HandNumber;
use riverboat_core::ID;
use riverboat_core::Position;
use riverboat_core::Unique;
use riverboat_pg::*;
use tokio_postgres::GenericClient;

/// One dealt hand. At most one row per table is unfinished at any time, and
/// `(table_id, hand_number)` is unique.
#[derive(Debug, Clone)]
pub struct HandRecord {
    id: ID<Self>,
    pub table: ID<TableRecord>,
    pub number: HandNumber,
    pub dealer_seat: Position,
    pub sb_seat: Position,
    pub bb_seat: Position,
    pub board: Hand,
    pub pot: Chips,
    pub rake: Chips,
    pub phase: HandPhase,
    pub winners: Vec<ID<Member>>,
}

impl HandRecord {
    pub fn new(
        table: ID<TableRecord>,
        number: HandNumber,
        dealer_seat: Position,
        sb_seat: Position,
        bb_seat: Position,
    ) -> Self {
        Self {
            id: ID::default(),
            table,
            number,
            dealer_seat,
            sb_seat,
            bb_seat,
            board: Hand::empty(),
            pot: 0,
            rake: 0,
            phase: HandPhase::Preflop,
            winners: Vec::new(),
        }
    }
}

impl Unique for HandRecord {
    fn id(&self) -> ID<Self> {
        self.id
    }
}

/// Where a hand is in its lifecycle. `Finished` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandPhase {
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
    Finished,
}

impl HandPhase {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Preflop => "preflop",
            Self::Flop => "flop",
            Self::Turn => "turn",
            Self::River => "river",
            Self::Showdown => "showdown",
            Self::Finished => "finished",
        }
    }
}

impl From<Street> for HandPhase {
    fn from(street: Street) -> Self {
        match street {
            Street::Pref => Self::Preflop,
            Street::Flop => Self::Flop,
            Street::Turn => Self::Turn,
            Street::Rive => Self::River,
        }
    }
}

impl TryFrom<&str> for HandPhase {
    type Error = String;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "preflop" => Ok(Self::Preflop),
            "flop" => Ok(Self::Flop),
            "turn" => Ok(Self::Turn),
            "river" => Ok(Self::River),
            "showdown" => Ok(Self::Showdown),
            "finished" => Ok(Self::Finished),
            other => Err(format!("unknown hand phase {}", other)),
        }
    }
}

impl std::fmt::Display for HandPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Schema for HandRecord {
    fn name() -> &'static str {
        HANDS
    }
    fn creates() -> &'static str {
        const_format::concatcp!(
            "CREATE TABLE IF NOT EXISTS ",
            HANDS,
            " (
                id          UUID PRIMARY KEY,
                table_id    UUID NOT NULL REFERENCES ",
            TABLES,
            "(id),
                hand_number BIGINT NOT NULL,
                dealer_seat SMALLINT NOT NULL,
                sb_seat     SMALLINT NOT NULL,
                bb_seat     SMALLINT NOT NULL,
                board       BIGINT NOT NULL DEFAULT 0,
                pot         BIGINT NOT NULL DEFAULT 0,
                rake        BIGINT NOT NULL DEFAULT 0,
                status      VARCHAR(16) NOT NULL,
                winners     UUID[] NOT NULL DEFAULT '{}',
                started_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
                finished_at TIMESTAMPTZ,
                UNIQUE (table_id, hand_number)
            );"
        )
    }
    fn indices() -> &'static str {
        const_format::concatcp!(
            "CREATE INDEX IF NOT EXISTS idx_hands_table ON ",
            HANDS,
            " (table_id);"
        )
    }
}

/// A player's participation in one hand. Hole cards are stored as a card
/// bitset and never cross the wire unredacted.
#[derive(Debug, Clone)]
pub struct PlayerHandRecord {
    pub hand: ID<HandRecord>,
    pub user: ID<Member>,
    pub seat_number: Position,
    pub hole: Hole,
    pub total_bet: Chips,
    pub status: &'static str,
    pub last_action: Option<String>,
}

impl PlayerHandRecord {
    pub fn new(hand: ID<HandRecord>, user: ID<Member>, seat_number: Position, hole: Hole) -> Self {
        Self {
            hand,
            user,
            seat_number,
            hole,
            total_bet: 0,
            status: "active",
            last_action: None,
        }
    }
}

impl Schema for PlayerHandRecord {
    fn name() -> &'static str {
        PLAYER_HANDS
    }
    fn creates() -> &'static str {
        const_format::concatcp!(
            "CREATE TABLE IF NOT EXISTS ",
            PLAYER_HANDS,
            " (
                hand_id     UUID NOT NULL REFERENCES ",
            HANDS,
            "(id) ON DELETE CASCADE,
                user_id     UUID NOT NULL REFERENCES ",
            USERS,
            "(id),
                seat_number SMALLINT NOT NULL,
                hole        BIGINT NOT NULL,
                total_bet   BIGINT NOT NULL DEFAULT 0,
                status      VARCHAR(16) NOT NULL DEFAULT 'active',
                last_action VARCHAR(16),
                best_rank   VARCHAR(24),
                best_cards  BIGINT,
                PRIMARY KEY (hand_id, user_id)
            );"
        )
    }
    fn indices() -> &'static str {
        const_format::concatcp!(
            "CREATE INDEX IF NOT EXISTS idx_player_hands_user ON ",
            PLAYER_HANDS,
            " (user_id);"
        )
    }
}

/// Repository for hand and player-hand rows.
#[allow(async_fn_in_trait)]
pub trait HandRepository {
    /// The next monotonic hand number for a table, starting at 1.
    async fn next_hand_number(&self, table: ID<TableRecord>) -> Result<HandNumber, PgErr>;
    async fn create_hand(&self, hand: &HandRecord) -> Result<(), PgErr>;
    async fn create_player_hand(&self, player: &PlayerHandRecord) -> Result<(), PgErr>;
    /// Persists the board and phase after a street advance.
    async fn set_hand_progress(
        &self,
        hand: ID<HandRecord>,
        phase: HandPhase,
        board: Hand,
    ) -> Result<(), PgErr>;
    /// Terminal update: board, pot, rake, winners, finish stamp.
    async fn finish_hand(&self, hand: &HandRecord) -> Result<(), PgErr>;
    async fn update_player_hand(
        &self,
        hand: ID<HandRecord>,
        user: ID<Member>,
        status: &str,
        total_bet: Chips,
        last_action: &str,
    ) -> Result<(), PgErr>;
    /// Records the evaluated five-card hand for a non-folded player.
    async fn mark_best_hand(
        &self,
        hand: ID<HandRecord>,
        user: ID<Member>,
        rank: &str,
        cards: Hand,
    ) -> Result<(), PgErr>;
    /// Recent finished hands a user was dealt into, newest first.
    async fn hands_of(
        &self,
        user: ID<Member>,
        limit: i64,
    ) -> Result<Vec<HandRecord>, PgErr>;
}

fn hydrate(row: &tokio_postgres::Row) -> HandRecord {
    HandRecord {
        id: ID::from(row.get::<_, uuid::Uuid>(0)),
        table: ID::from(row.get::<_, uuid::Uuid>(1)),
        number: row.get(2),
        dealer_seat: row.get::<_, i16>(3) as Position,
        sb_seat: row.get::<_, i16>(4) as Position,
        bb_seat: row.get::<_, i16>(5) as Position,
        board: Hand::from(row.get::<_, i64>(6) as u64),
        pot: row.get(7),
        rake: row.get(8),
        phase: HandPhase::try_from(row.get::<_, &str>(9)).expect("valid phase"),
        winners: row
            .get::<_, Vec<uuid::Uuid>>(10)
            .into_iter()
            .map(ID::from)
            .collect(),
    }
}

const COLUMNS: &str = "h.id, h.table_id, h.hand_number, h.dealer_seat, h.sb_seat, \
                       h.bb_seat, h.board, h.pot, h.rake, h.status, h.winners";

impl<C> HandRepository for C
where
    C: GenericClient + Sync,
{
    async fn next_hand_number(&self, table: ID<TableRecord>) -> Result<HandNumber, PgErr> {
        self.query_one(
            const_format::concatcp!(
                "SELECT COALESCE(MAX(hand_number), 0) + 1 FROM ",
                HANDS,
                " WHERE table_id = $1"
            ),
            &[&table.inner()],
        )
        .await
        .map(|row| row.get(0))
    }

    async fn create_hand(&self, hand: &HandRecord) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!(
                "INSERT INTO ",
                HANDS,
                " (id, table_id, hand_number, dealer_seat, sb_seat, bb_seat, status) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)"
            ),
            &[
                &hand.id().inner(),
                &hand.table.inner(),
                &hand.number,
                &(hand.dealer_seat as i16),
                &(hand.sb_seat as i16),
                &(hand.bb_seat as i16),
                &hand.phase.label(),
            ],
        )
        .await
        .map(|_| ())
    }

    async fn create_player_hand(&self, player: &PlayerHandRecord) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!(
                "INSERT INTO ",
                PLAYER_HANDS,
                " (hand_id, user_id, seat_number, hole, total_bet, status) \
                 VALUES ($1, $2, $3, $4, $5, $6)"
            ),
            &[
                &player.hand.inner(),
                &player.user.inner(),
                &(player.seat_number as i16),
                &(u64::from(Hand::from(player.hole)) as i64),
                &player.total_bet,
                &player.status,
            ],
        )
        .await
        .map(|_| ())
    }

    async fn set_hand_progress(
        &self,
        hand: ID<HandRecord>,
        phase: HandPhase,
        board: Hand,
    ) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!(
                "UPDATE ",
                HANDS,
                " SET status = $2, board = $3 WHERE id = $1"
            ),
            &[&hand.inner(), &phase.label(), &(u64::from(board) as i64)],
        )
        .await
        .map(|_| ())
    }

    async fn finish_hand(&self, hand: &HandRecord) -> Result<(), PgErr> {
        let winners: Vec<uuid::Uuid> = hand.winners.iter().map(|w| w.inner()).collect();
        self.execute(
            const_format::concatcp!(
                "UPDATE ",
                HANDS,
                " SET status = 'finished', board = $2, pot = $3, rake = $4, \
                      winners = $5, finished_at = now() \
                 WHERE id = $1"
            ),
            &[
                &hand.id().inner(),
                &(u64::from(hand.board) as i64),
                &hand.pot,
                &hand.rake,
                &winners,
            ],
        )
        .await
        .map(|_| ())
    }

    async fn update_player_hand(
        &self,
        hand: ID<HandRecord>,
        user: ID<Member>,
        status: &str,
        total_bet: Chips,
        last_action: &str,
    ) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!(
                "UPDATE ",
                PLAYER_HANDS,
                " SET status = $3, total_bet = $4, last_action = $5 \
                 WHERE hand_id = $1 AND user_id = $2"
            ),
            &[
                &hand.inner(),
                &user.inner(),
                &status,
                &total_bet,
                &last_action,
            ],
        )
        .await
        .map(|_| ())
    }

    async fn mark_best_hand(
        &self,
        hand: ID<HandRecord>,
        user: ID<Member>,
        rank: &str,
        cards: Hand,
    ) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!(
                "UPDATE ",
                PLAYER_HANDS,
                " SET best_rank = $3, best_cards = $4 \
                 WHERE hand_id = $1 AND user_id = $2"
            ),
            &[
                &hand.inner(),
                &user.inner(),
                &rank,
                &(u64::from(cards) as i64),
            ],
        )
        .await
        .map(|_| ())
    }

    async fn hands_of(&self, user: ID<Member>, limit: i64) -> Result<Vec<HandRecord>, PgErr> {
        self.query(
            const_format::concatcp!(
                "SELECT ",
                COLUMNS,
                " FROM ",
                HANDS,
                " h JOIN ",
                PLAYER_HANDS,
                " p ON p.hand_id = h.id \
                 WHERE p.user_id = $1 AND h.status = 'finished' \
                 ORDER BY h.id DESC LIMIT $2"
            ),
            &[&user.inner(), &limit],
        )
        .await
        .map(|rows| rows.iter().map(hydrate).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_follows_street() {
        assert_eq!(HandPhase::from(Street::Pref), HandPhase::Preflop);
        assert_eq!(HandPhase::from(Street::Rive), HandPhase::River);
    }

    #[test]
    fn phase_label_roundtrip() {
        for phase in [
            HandPhase::Preflop,
            HandPhase::Flop,
            HandPhase::Turn,
            HandPhase::River,
            HandPhase::Showdown,
            HandPhase::Finished,
        ] {
            assert_eq!(HandPhase::try_from(phase.label()).unwrap(), phase);
        }
    }
}
