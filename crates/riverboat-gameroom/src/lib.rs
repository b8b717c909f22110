//! Live game coordination.
//!
//! This crate binds the pure poker engine to persisted records and fans
//! state transitions out to connected clients, under a strict concurrency
//! model: one mutex per table, every engine access and hand write inside it,
//! never two table locks at once.
//!
//! ## Managers
//!
//! - [`Games`] — the game manager: per-table [`Session`]s, hand lifecycle,
//!   action handling, timeouts, redacted snapshots
//! - [`Lobby`] — the table manager: create/list/join/leave/ready, the
//!   away-seat sweeper
//!
//! ## Protocol
//!
//! - [`ServerMessage`] — server-initiated broadcast payloads
//! - [`request`] — typed client request payloads
//! - [`Courier`] — the injected outbound-delivery contract
//! - [`Fault`] — wire error codes and messages
mod courier;
mod error;
mod games;
mod lobby;
mod message;
mod request;
mod session;

pub use courier::*;
pub use error::*;
pub use games::*;
pub use lobby::*;
pub use message::*;
pub use request::*;
pub use session::*;
