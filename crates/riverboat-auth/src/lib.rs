//! Identity and credential validation.
//!
//! JWT-based authentication with Argon2 password hashing. The router only
//! consumes the [`Authenticator`] contract: an opaque credential in, a
//! stable user identity out (or a rejection). [`Crypto`] is the concrete
//! JWT implementation the server wires in.
//!
//! ## Identity Types
//!
//! - [`Member`] — Registered user with a stable id
//! - [`Claims`] — JWT payload (subject, username, expiry)
//!
//! ## Security
//!
//! - [`Crypto`] — JWT signing and verification
//! - [`password`] — Argon2 hashing and verification, shared with private
//!   table passwords
mod authenticator;
mod claims;
mod crypto;
mod member;
pub mod password;

pub use authenticator::*;
pub use claims::*;
pub use crypto::*;
pub use member::*;
