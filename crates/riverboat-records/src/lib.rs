//! Persistent entities and their repositories.
//!
//! One record struct per store table, each carrying its own [`Schema`] DDL,
//! plus repository traits implemented over any [`GenericClient`] so the same
//! queries run on the shared client or inside a transaction.
//!
//! ## Entities
//!
//! - [`TableRecord`] — A poker table and its betting structure
//! - [`SeatRecord`] — An occupied seat (soft-deleted on leave)
//! - [`HandRecord`] — One dealt hand per row
//! - [`PlayerHandRecord`] — Per-player participation in a hand
//! - [`BetRecord`] — The append-only betting log
//! - [`LedgerEntry`] — Diamond movements (buy-ins, wins, rake, refunds)
//!
//! ## Contracts
//!
//! - [`Ledger`] — The external diamond-accounting collaborator
//!
//! [`Schema`]: riverboat_pg::Schema
//! [`GenericClient`]: tokio_postgres::GenericClient
mod bet;
mod hand;
mod ledger;
mod seat;
mod table;

pub use bet::*;
pub use hand::*;
pub use ledger::*;
pub use seat::*;
pub use table::*;
