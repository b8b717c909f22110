use super::TableRecord;
use riverboat_auth::Member;
use riverboat_core::Chips;
use riverboat_core::ID;
use riverboat_core::Position;
use riverboat_pg::*;
use tokio_postgres::GenericClient;

/// An occupied seat at a table.
///
/// Seats are soft-deleted: leaving sets `left_at`, and the partial unique
/// indices only constrain live rows, so a user can rejoin a seat later.
#[derive(Debug, Clone)]
pub struct SeatRecord {
    pub table: ID<TableRecord>,
    pub user: ID<Member>,
    pub username: String,
    pub number: Position,
    pub chips: Chips,
    pub status: SeatStatus,
}

impl SeatRecord {
    pub fn new(
        table: ID<TableRecord>,
        user: ID<Member>,
        username: String,
        number: Position,
        chips: Chips,
    ) -> Self {
        Self {
            table,
            user,
            username,
            number,
            chips,
            status: SeatStatus::Sitting,
        }
    }
}

/// Seat occupancy status.
///
/// `Playing` seats are dealt into the next hand ("ready"); `Sitting` seats
/// hold chips but wait out hands; `Away` marks a disconnected player whose
/// seat is preserved until timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatStatus {
    Sitting,
    Playing,
    SittingOut,
    Away,
}

impl SeatStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Sitting => "sitting",
            Self::Playing => "playing",
            Self::SittingOut => "sitting_out",
            Self::Away => "away",
        }
    }
}

impl TryFrom<&str> for SeatStatus {
    type Error = String;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "sitting" => Ok(Self::Sitting),
            "playing" => Ok(Self::Playing),
            "sitting_out" => Ok(Self::SittingOut),
            "away" => Ok(Self::Away),
            other => Err(format!("unknown seat status {}", other)),
        }
    }
}

impl std::fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Schema for SeatRecord {
    fn name() -> &'static str {
        SEATS
    }
    fn creates() -> &'static str {
        const_format::concatcp!(
            "CREATE TABLE IF NOT EXISTS ",
            SEATS,
            " (
                table_id    UUID NOT NULL REFERENCES ",
            TABLES,
            "(id),
                user_id     UUID NOT NULL REFERENCES ",
            USERS,
            "(id),
                seat_number SMALLINT NOT NULL,
                chip_count  BIGINT NOT NULL CHECK (chip_count >= 0),
                status      VARCHAR(16) NOT NULL,
                joined_at   TIMESTAMPTZ NOT NULL DEFAULT now(),
                away_since  TIMESTAMPTZ,
                left_at     TIMESTAMPTZ
            );"
        )
    }
    fn indices() -> &'static str {
        const_format::concatcp!(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_seats_table_seat ON ",
            SEATS,
            " (table_id, seat_number) WHERE left_at IS NULL;
             CREATE UNIQUE INDEX IF NOT EXISTS idx_seats_table_user ON ",
            SEATS,
            " (table_id, user_id) WHERE left_at IS NULL;
             CREATE INDEX IF NOT EXISTS idx_seats_user ON ",
            SEATS,
            " (user_id) WHERE left_at IS NULL;"
        )
    }
}

fn hydrate(row: &tokio_postgres::Row) -> SeatRecord {
    SeatRecord {
        table: ID::from(row.get::<_, uuid::Uuid>(0)),
        user: ID::from(row.get::<_, uuid::Uuid>(1)),
        username: row.get(2),
        number: row.get::<_, i16>(3) as Position,
        chips: row.get(4),
        status: SeatStatus::try_from(row.get::<_, &str>(5)).expect("valid status"),
    }
}

/// Live-seat projection joined with the username for display.
const COLUMNS: &str = const_format::concatcp!(
    "s.table_id, s.user_id, u.username, s.seat_number, s.chip_count, s.status FROM ",
    SEATS,
    " s JOIN ",
    USERS,
    " u ON u.id = s.user_id"
);

/// Repository for live seat rows. Every query here is scoped to
/// `left_at IS NULL`; history stays in the table but out of play.
#[allow(async_fn_in_trait)]
pub trait SeatRepository {
    async fn create_seat(&self, seat: &SeatRecord) -> Result<(), PgErr>;
    async fn seats_at(&self, table: ID<TableRecord>) -> Result<Vec<SeatRecord>, PgErr>;
    async fn seat_of(
        &self,
        table: ID<TableRecord>,
        user: ID<Member>,
    ) -> Result<Option<SeatRecord>, PgErr>;
    /// All tables where the user currently holds a seat.
    async fn seats_of(&self, user: ID<Member>) -> Result<Vec<SeatRecord>, PgErr>;
    async fn set_seat_status(
        &self,
        table: ID<TableRecord>,
        user: ID<Member>,
        status: SeatStatus,
    ) -> Result<(), PgErr>;
    async fn set_seat_chips(
        &self,
        table: ID<TableRecord>,
        user: ID<Member>,
        chips: Chips,
    ) -> Result<(), PgErr>;
    /// Marks a seat away and stamps the moment, for the sweeper.
    async fn mark_away(&self, table: ID<TableRecord>, user: ID<Member>) -> Result<(), PgErr>;
    /// Soft-deletes a seat.
    async fn release_seat(&self, table: ID<TableRecord>, user: ID<Member>) -> Result<(), PgErr>;
    /// Away seats older than the cutoff, ready to be reclaimed.
    async fn stale_away(&self, cutoff_secs: f64) -> Result<Vec<SeatRecord>, PgErr>;
}

impl<C> SeatRepository for C
where
    C: GenericClient + Sync,
{
    async fn create_seat(&self, seat: &SeatRecord) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!(
                "INSERT INTO ",
                SEATS,
                " (table_id, user_id, seat_number, chip_count, status) \
                 VALUES ($1, $2, $3, $4, $5)"
            ),
            &[
                &seat.table.inner(),
                &seat.user.inner(),
                &(seat.number as i16),
                &seat.chips,
                &seat.status.label(),
            ],
        )
        .await
        .map(|_| ())
    }

    async fn seats_at(&self, table: ID<TableRecord>) -> Result<Vec<SeatRecord>, PgErr> {
        self.query(
            const_format::concatcp!(
                "SELECT ",
                COLUMNS,
                " WHERE s.table_id = $1 AND s.left_at IS NULL ORDER BY s.seat_number"
            ),
            &[&table.inner()],
        )
        .await
        .map(|rows| rows.iter().map(hydrate).collect())
    }

    async fn seat_of(
        &self,
        table: ID<TableRecord>,
        user: ID<Member>,
    ) -> Result<Option<SeatRecord>, PgErr> {
        self.query_opt(
            const_format::concatcp!(
                "SELECT ",
                COLUMNS,
                " WHERE s.table_id = $1 AND s.user_id = $2 AND s.left_at IS NULL"
            ),
            &[&table.inner(), &user.inner()],
        )
        .await
        .map(|opt| opt.as_ref().map(hydrate))
    }

    async fn seats_of(&self, user: ID<Member>) -> Result<Vec<SeatRecord>, PgErr> {
        self.query(
            const_format::concatcp!(
                "SELECT ",
                COLUMNS,
                " WHERE s.user_id = $1 AND s.left_at IS NULL"
            ),
            &[&user.inner()],
        )
        .await
        .map(|rows| rows.iter().map(hydrate).collect())
    }

    async fn set_seat_status(
        &self,
        table: ID<TableRecord>,
        user: ID<Member>,
        status: SeatStatus,
    ) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!(
                "UPDATE ",
                SEATS,
                " SET status = $3, away_since = NULL \
                 WHERE table_id = $1 AND user_id = $2 AND left_at IS NULL"
            ),
            &[&table.inner(), &user.inner(), &status.label()],
        )
        .await
        .map(|_| ())
    }

    async fn set_seat_chips(
        &self,
        table: ID<TableRecord>,
        user: ID<Member>,
        chips: Chips,
    ) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!(
                "UPDATE ",
                SEATS,
                " SET chip_count = $3 \
                 WHERE table_id = $1 AND user_id = $2 AND left_at IS NULL"
            ),
            &[&table.inner(), &user.inner(), &chips],
        )
        .await
        .map(|_| ())
    }

    async fn mark_away(&self, table: ID<TableRecord>, user: ID<Member>) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!(
                "UPDATE ",
                SEATS,
                " SET status = 'away', away_since = now() \
                 WHERE table_id = $1 AND user_id = $2 AND left_at IS NULL"
            ),
            &[&table.inner(), &user.inner()],
        )
        .await
        .map(|_| ())
    }

    async fn release_seat(&self, table: ID<TableRecord>, user: ID<Member>) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!(
                "UPDATE ",
                SEATS,
                " SET left_at = now() \
                 WHERE table_id = $1 AND user_id = $2 AND left_at IS NULL"
            ),
            &[&table.inner(), &user.inner()],
        )
        .await
        .map(|_| ())
    }

    async fn stale_away(&self, cutoff_secs: f64) -> Result<Vec<SeatRecord>, PgErr> {
        self.query(
            const_format::concatcp!(
                "SELECT ",
                COLUMNS,
                " WHERE s.left_at IS NULL AND s.status = 'away' \
                   AND s.away_since < now() - ($1 * interval '1 second')"
            ),
            &[&cutoff_secs],
        )
        .await
        .map(|rows| rows.iter().map(hydrate).collect())
    }
}
