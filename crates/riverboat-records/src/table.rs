use riverboat_auth::Member;
use riverboat_core::Chips;
use riverboat_core::ID;
use riverboat_core::Unique;
use riverboat_pg::*;
use tokio_postgres::GenericClient;

/// A poker table and its betting structure.
#[derive(Debug, Clone)]
pub struct TableRecord {
    id: ID<Self>,
    pub name: String,
    pub game_type: String,
    pub max_players: i16,
    pub min_buy_in: Chips,
    pub max_buy_in: Chips,
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub rake_bps: Chips,
    pub max_rake: Chips,
    pub status: TableStatus,
    pub created_by: ID<Member>,
    pub is_private: bool,
    pub password_hash: Option<String>,
    pub turn_timeout_secs: Option<i64>,
}

impl TableRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: String,
        game_type: String,
        max_players: i16,
        min_buy_in: Chips,
        max_buy_in: Chips,
        small_blind: Chips,
        big_blind: Chips,
        rake_bps: Chips,
        max_rake: Chips,
        created_by: ID<Member>,
        password_hash: Option<String>,
        turn_timeout_secs: Option<i64>,
    ) -> Self {
        Self {
            id: ID::default(),
            name,
            game_type,
            max_players,
            min_buy_in,
            max_buy_in,
            small_blind,
            big_blind,
            rake_bps,
            max_rake,
            status: TableStatus::Waiting,
            created_by,
            is_private: password_hash.is_some(),
            password_hash,
            turn_timeout_secs,
        }
    }
}

impl Unique for TableRecord {
    fn id(&self) -> ID<Self> {
        self.id
    }
}

/// Table lifecycle status. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    Waiting,
    Playing,
    Paused,
    Closed,
}

impl TableStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Closed => "closed",
        }
    }
}

impl TryFrom<&str> for TableStatus {
    type Error = String;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "waiting" => Ok(Self::Waiting),
            "playing" => Ok(Self::Playing),
            "paused" => Ok(Self::Paused),
            "closed" => Ok(Self::Closed),
            other => Err(format!("unknown table status {}", other)),
        }
    }
}

impl std::fmt::Display for TableStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Schema for TableRecord {
    fn name() -> &'static str {
        TABLES
    }
    fn creates() -> &'static str {
        const_format::concatcp!(
            "CREATE TABLE IF NOT EXISTS ",
            TABLES,
            " (
                id              UUID PRIMARY KEY,
                name            VARCHAR(64) NOT NULL,
                game_type       VARCHAR(32) NOT NULL,
                max_players     SMALLINT NOT NULL,
                min_buy_in      BIGINT NOT NULL,
                max_buy_in      BIGINT NOT NULL,
                small_blind     BIGINT NOT NULL,
                big_blind       BIGINT NOT NULL,
                rake_bps        BIGINT NOT NULL,
                max_rake        BIGINT NOT NULL,
                status          VARCHAR(16) NOT NULL,
                created_by      UUID NOT NULL REFERENCES ",
            USERS,
            "(id),
                is_private      BOOLEAN NOT NULL DEFAULT FALSE,
                password_hash   TEXT,
                turn_timeout    BIGINT,
                created_at      TIMESTAMPTZ NOT NULL DEFAULT now()
            );"
        )
    }
    fn indices() -> &'static str {
        const_format::concatcp!(
            "CREATE INDEX IF NOT EXISTS idx_tables_status ON ",
            TABLES,
            " (status);"
        )
    }
}

const COLUMNS: &str = "id, name, game_type, max_players, min_buy_in, max_buy_in, \
                       small_blind, big_blind, rake_bps, max_rake, status, created_by, \
                       is_private, password_hash, turn_timeout";

fn hydrate(row: &tokio_postgres::Row) -> TableRecord {
    TableRecord {
        id: ID::from(row.get::<_, uuid::Uuid>(0)),
        name: row.get(1),
        game_type: row.get(2),
        max_players: row.get(3),
        min_buy_in: row.get(4),
        max_buy_in: row.get(5),
        small_blind: row.get(6),
        big_blind: row.get(7),
        rake_bps: row.get(8),
        max_rake: row.get(9),
        status: TableStatus::try_from(row.get::<_, &str>(10)).expect("valid status"),
        created_by: ID::from(row.get::<_, uuid::Uuid>(11)),
        is_private: row.get(12),
        password_hash: row.get(13),
        turn_timeout_secs: row.get(14),
    }
}

/// Repository for table rows.
#[allow(async_fn_in_trait)]
pub trait TableRepository {
    async fn create_table(&self, table: &TableRecord) -> Result<(), PgErr>;
    async fn get_table(&self, id: ID<TableRecord>) -> Result<Option<TableRecord>, PgErr>;
    /// Public tables plus the viewer's own private tables, open ones first.
    async fn list_tables(&self, viewer: ID<Member>) -> Result<Vec<TableRecord>, PgErr>;
    async fn set_table_status(&self, id: ID<TableRecord>, status: TableStatus)
    -> Result<(), PgErr>;
}

impl<C> TableRepository for C
where
    C: GenericClient + Sync,
{
    async fn create_table(&self, table: &TableRecord) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!(
                "INSERT INTO ",
                TABLES,
                " (id, name, game_type, max_players, min_buy_in, max_buy_in, \
                   small_blind, big_blind, rake_bps, max_rake, status, created_by, \
                   is_private, password_hash, turn_timeout) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)"
            ),
            &[
                &table.id().inner(),
                &table.name,
                &table.game_type,
                &table.max_players,
                &table.min_buy_in,
                &table.max_buy_in,
                &table.small_blind,
                &table.big_blind,
                &table.rake_bps,
                &table.max_rake,
                &table.status.label(),
                &table.created_by.inner(),
                &table.is_private,
                &table.password_hash,
                &table.turn_timeout_secs,
            ],
        )
        .await
        .map(|_| ())
    }

    async fn get_table(&self, id: ID<TableRecord>) -> Result<Option<TableRecord>, PgErr> {
        self.query_opt(
            const_format::concatcp!("SELECT ", COLUMNS, " FROM ", TABLES, " WHERE id = $1"),
            &[&id.inner()],
        )
        .await
        .map(|opt| opt.as_ref().map(hydrate))
    }

    async fn list_tables(&self, viewer: ID<Member>) -> Result<Vec<TableRecord>, PgErr> {
        self.query(
            const_format::concatcp!(
                "SELECT ",
                COLUMNS,
                " FROM ",
                TABLES,
                " WHERE status != 'closed' AND (is_private = FALSE OR created_by = $1) \
                  ORDER BY created_at"
            ),
            &[&viewer.inner()],
        )
        .await
        .map(|rows| rows.iter().map(hydrate).collect())
    }

    async fn set_table_status(
        &self,
        id: ID<TableRecord>,
        status: TableStatus,
    ) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!("UPDATE ", TABLES, " SET status = $2 WHERE id = $1"),
            &[&id.inner(), &status.label()],
        )
        .await
        .map(|_| ())
    }
}
