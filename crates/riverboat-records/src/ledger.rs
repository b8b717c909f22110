use super::HandRecord;
use super::TableRecord;
use riverboat_auth::Member;
use riverboat_core::Chips;
use riverboat_core::ID;
use riverboat_core::Unique;
use riverboat_pg::*;
use std::sync::Arc;
use tokio_postgres::Client;
use tokio_postgres::GenericClient;

/// A diamond movement: signed amount, typed, with a unique transaction id.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    id: ID<Self>,
    pub user: Option<ID<Member>>,
    pub table: Option<ID<TableRecord>>,
    pub hand: Option<ID<HandRecord>>,
    pub amount: Chips,
    pub kind: EntryKind,
}

impl LedgerEntry {
    pub fn new(
        user: Option<ID<Member>>,
        table: Option<ID<TableRecord>>,
        hand: Option<ID<HandRecord>>,
        amount: Chips,
        kind: EntryKind,
    ) -> Self {
        Self {
            id: ID::default(),
            user,
            table,
            hand,
            amount,
            kind,
        }
    }
}

impl Unique for LedgerEntry {
    fn id(&self) -> ID<Self> {
        self.id
    }
}

/// What a ledger entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    BuyIn,
    CashOut,
    Bet,
    Win,
    Rake,
    Refund,
}

impl EntryKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::BuyIn => "buy_in",
            Self::CashOut => "cash_out",
            Self::Bet => "bet",
            Self::Win => "win",
            Self::Rake => "rake",
            Self::Refund => "refund",
        }
    }
}

impl Schema for LedgerEntry {
    fn name() -> &'static str {
        LEDGER
    }
    fn creates() -> &'static str {
        const_format::concatcp!(
            "CREATE TABLE IF NOT EXISTS ",
            LEDGER,
            " (
                id          UUID PRIMARY KEY,
                user_id     UUID REFERENCES ",
            USERS,
            "(id),
                table_id    UUID REFERENCES ",
            TABLES,
            "(id),
                hand_id     UUID REFERENCES ",
            HANDS,
            "(id),
                amount      BIGINT NOT NULL,
                kind        VARCHAR(16) NOT NULL,
                status      VARCHAR(16) NOT NULL DEFAULT 'completed',
                created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
            );"
        )
    }
    fn indices() -> &'static str {
        const_format::concatcp!(
            "CREATE INDEX IF NOT EXISTS idx_ledger_user ON ",
            LEDGER,
            " (user_id);"
        )
    }
}

/// Appends a ledger entry without touching balances. Used inside the hand
/// completion transaction for win, rake, and refund rows: chips at the table
/// are not diamonds in the bank until cash-out.
#[allow(async_fn_in_trait)]
pub trait LedgerRepository {
    async fn record_entry(&self, entry: &LedgerEntry) -> Result<(), PgErr>;
}

impl<C> LedgerRepository for C
where
    C: GenericClient + Sync,
{
    async fn record_entry(&self, entry: &LedgerEntry) -> Result<(), PgErr> {
        let user: Option<uuid::Uuid> = entry.user.map(|id| id.inner());
        let table: Option<uuid::Uuid> = entry.table.map(|id| id.inner());
        let hand: Option<uuid::Uuid> = entry.hand.map(|id| id.inner());
        self.execute(
            const_format::concatcp!(
                "INSERT INTO ",
                LEDGER,
                " (id, user_id, table_id, hand_id, amount, kind) \
                 VALUES ($1, $2, $3, $4, $5, $6)"
            ),
            &[
                &entry.id().inner(),
                &user,
                &table,
                &hand,
                &entry.amount,
                &entry.kind.label(),
            ],
        )
        .await
        .map(|_| ())
    }
}

/// Why a ledger operation failed.
#[derive(Debug)]
pub enum LedgerError {
    InsufficientFunds,
    Store(PgErr),
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientFunds => write!(f, "insufficient funds"),
            Self::Store(e) => write!(f, "ledger store error: {}", e),
        }
    }
}

impl std::error::Error for LedgerError {}

impl From<PgErr> for LedgerError {
    fn from(e: PgErr) -> Self {
        Self::Store(e)
    }
}

/// The diamond-accounting collaborator.
///
/// Each call is atomic on its own: a debit either moves the balance and
/// records the entry, or does neither.
#[async_trait::async_trait]
pub trait Ledger: Send + Sync {
    /// Checks that the balance covers an amount, without moving anything.
    async fn reserve(&self, user: ID<Member>, amount: Chips) -> Result<(), LedgerError>;
    /// Takes diamonds out of the balance (buy-in).
    async fn debit(
        &self,
        user: ID<Member>,
        amount: Chips,
        table: ID<TableRecord>,
    ) -> Result<(), LedgerError>;
    /// Returns diamonds to the balance (cash-out).
    async fn credit(
        &self,
        user: ID<Member>,
        amount: Chips,
        table: ID<TableRecord>,
    ) -> Result<(), LedgerError>;
}

/// Ledger implementation over the users.diamonds balance.
///
/// Debits are a single guarded statement: the balance update and the entry
/// insert share one CTE, so a concurrent spender can never overdraw.
pub struct PgLedger(Arc<Client>);

impl PgLedger {
    pub fn new(db: Arc<Client>) -> Self {
        Self(db)
    }
}

#[async_trait::async_trait]
impl Ledger for PgLedger {
    async fn reserve(&self, user: ID<Member>, amount: Chips) -> Result<(), LedgerError> {
        let row = self
            .0
            .query_opt(
                const_format::concatcp!(
                    "SELECT 1 FROM ",
                    USERS,
                    " WHERE id = $1 AND diamonds >= $2"
                ),
                &[&user.inner(), &amount],
            )
            .await?;
        match row {
            Some(_) => Ok(()),
            None => Err(LedgerError::InsufficientFunds),
        }
    }

    async fn debit(
        &self,
        user: ID<Member>,
        amount: Chips,
        table: ID<TableRecord>,
    ) -> Result<(), LedgerError> {
        let entry = ID::<LedgerEntry>::default();
        let moved = self
            .0
            .execute(
                const_format::concatcp!(
                    "WITH spent AS (
                        UPDATE ",
                    USERS,
                    " SET diamonds = diamonds - $2 \
                      WHERE id = $1 AND diamonds >= $2 RETURNING id
                    )
                    INSERT INTO ",
                    LEDGER,
                    " (id, user_id, table_id, amount, kind) \
                     SELECT $3, id, $4, -$2, 'buy_in' FROM spent"
                ),
                &[&user.inner(), &amount, &entry.inner(), &table.inner()],
            )
            .await?;
        match moved {
            0 => Err(LedgerError::InsufficientFunds),
            _ => Ok(()),
        }
    }

    async fn credit(
        &self,
        user: ID<Member>,
        amount: Chips,
        table: ID<TableRecord>,
    ) -> Result<(), LedgerError> {
        let entry = ID::<LedgerEntry>::default();
        self.0
            .execute(
                const_format::concatcp!(
                    "WITH paid AS (
                        UPDATE ",
                    USERS,
                    " SET diamonds = diamonds + $2 WHERE id = $1 RETURNING id
                    )
                    INSERT INTO ",
                    LEDGER,
                    " (id, user_id, table_id, amount, kind) \
                     SELECT $3, id, $4, $2, 'cash_out' FROM paid"
                ),
                &[&user.inner(), &amount, &entry.inner(), &table.inner()],
            )
            .await?;
        Ok(())
    }
}
