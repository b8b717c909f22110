//! PostgreSQL connectivity and schema plumbing.
//!
//! ## Connectivity
//!
//! - [`db()`] — Shared read connection from `DB_URL`
//! - [`conn()`] — A dedicated owned connection, for transactional writers
//!
//! ## Serialization
//!
//! - [`Schema`] — Table metadata and DDL generation, assembled at compile
//!   time with `const_format` against the table-name constants below
mod schema;

pub use schema::*;

use std::sync::Arc;
use tokio_postgres::Client;

/// Establishes the shared database connection.
///
/// Connects to PostgreSQL using the `DB_URL` environment variable and
/// returns an `Arc<Client>` suitable for sharing across async tasks.
///
/// # Panics
///
/// Panics if `DB_URL` is not set or if connection fails; the server cannot
/// run without its store.
pub async fn db() -> Arc<Client> {
    log::info!("connecting to database");
    Arc::new(conn().await)
}

/// Establishes a dedicated owned connection.
///
/// Each live table session holds one of these so its mutations can run
/// inside `tokio_postgres` transactions without contending for a shared
/// client.
pub async fn conn() -> Client {
    let tls = tokio_postgres::tls::NoTls;
    let ref url = std::env::var("DB_URL").expect("DB_URL must be set");
    let (client, connection) = tokio_postgres::connect(url, tls)
        .await
        .expect("database connection failed");
    tokio::spawn(connection);
    client
}

/// PostgreSQL error type alias.
pub type PgErr = tokio_postgres::Error;

/// Table for poker tables and their betting structure.
#[rustfmt::skip]
pub const TABLES:       &str = "tables";
/// Table for seated players (one row per occupied seat).
#[rustfmt::skip]
pub const SEATS:        &str = "seats";
/// Table for hands, one row per dealt hand.
#[rustfmt::skip]
pub const HANDS:        &str = "hands";
/// Table for per-player participation in a hand.
#[rustfmt::skip]
pub const PLAYER_HANDS: &str = "player_hands";
/// Table for the append-only betting log.
#[rustfmt::skip]
pub const BETS:         &str = "bets";
/// Table for diamond ledger entries.
#[rustfmt::skip]
pub const LEDGER:       &str = "ledger";
/// Table for registered user accounts and balances.
#[rustfmt::skip]
pub const USERS:        &str = "users";
