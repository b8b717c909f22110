//! WebSocket game hosting.
//!
//! The transport boundary of the server: one bridge task per connection
//! pumping frames both ways, a typed [`Envelope`] codec, a [`Router`] that
//! demultiplexes requests into the lobby and game manager, and the
//! [`Registry`] that delivers broadcasts back out.
//!
//! ## Core Types
//!
//! - [`Registry`] — user id → live handle, observer rooms, courier impl
//! - [`Envelope`] — the wire envelope for requests, replies, and broadcasts
//! - [`Router`] — per-frame dispatch with auth gating and deadlines
//! - [`Connection`] — per-connection state owned by the bridge task
//!
//! ## HTTP surface
//!
//! [`ws`] upgrades `GET /ws`; [`health`] answers the liveness probe.
mod bridge;
mod envelope;
mod registry;
mod router;

pub use bridge::*;
pub use envelope::*;
pub use registry::*;
pub use router::*;
