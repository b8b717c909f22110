use super::HandRecord;
use riverboat_auth::Member;
use riverboat_core::Chips;
use riverboat_core::ID;
use riverboat_core::Sequence;
use riverboat_pg::*;
use tokio_postgres::GenericClient;

/// One row in the append-only betting log.
#[derive(Debug, Clone)]
pub struct BetRecord {
    pub hand: ID<HandRecord>,
    pub user: ID<Member>,
    pub round: &'static str,
    pub action: &'static str,
    pub amount: Chips,
    pub total_bet_this_round: Chips,
    pub seq: Sequence,
}

impl Schema for BetRecord {
    fn name() -> &'static str {
        BETS
    }
    fn creates() -> &'static str {
        const_format::concatcp!(
            "CREATE TABLE IF NOT EXISTS ",
            BETS,
            " (
                hand_id     UUID NOT NULL REFERENCES ",
            HANDS,
            "(id) ON DELETE CASCADE,
                user_id     UUID NOT NULL REFERENCES ",
            USERS,
            "(id),
                round       VARCHAR(16) NOT NULL,
                action      VARCHAR(16) NOT NULL,
                amount      BIGINT NOT NULL,
                round_total BIGINT NOT NULL,
                seq         INTEGER NOT NULL,
                PRIMARY KEY (hand_id, round, seq)
            );"
        )
    }
    fn indices() -> &'static str {
        const_format::concatcp!(
            "CREATE INDEX IF NOT EXISTS idx_bets_hand ON ",
            BETS,
            " (hand_id);"
        )
    }
}

/// Append-only repository for the betting log.
#[allow(async_fn_in_trait)]
pub trait BetRepository {
    async fn record_bet(&self, bet: &BetRecord) -> Result<(), PgErr>;
}

impl<C> BetRepository for C
where
    C: GenericClient + Sync,
{
    async fn record_bet(&self, bet: &BetRecord) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!(
                "INSERT INTO ",
                BETS,
                " (hand_id, user_id, round, action, amount, round_total, seq) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)"
            ),
            &[
                &bet.hand.inner(),
                &bet.user.inner(),
                &bet.round,
                &bet.action,
                &bet.amount,
                &bet.total_bet_this_round,
                &bet.seq,
            ],
        )
        .await
        .map(|_| ())
    }
}
