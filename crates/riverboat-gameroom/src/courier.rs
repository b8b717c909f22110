use super::ServerMessage;
use riverboat_auth::Member;
use riverboat_core::ID;
use riverboat_records::TableRecord;

/// Outbound delivery contract.
///
/// The lobby and game manager emit messages through this interface; the
/// hosting layer implements it over the client registry. Keeping it a
/// one-way injected dependency breaks the table↔game↔router reference cycle.
///
/// Every method is synchronous and non-blocking: a slow or full client drops
/// the frame rather than holding the table lock.
pub trait Courier: Send + Sync {
    /// Delivers to one user, if connected.
    fn unicast(&self, user: ID<Member>, message: ServerMessage);
    /// Delivers to the given seated users plus any observers of the table.
    fn broadcast(&self, table: ID<TableRecord>, seated: &[ID<Member>], message: ServerMessage);
    /// Delivers to every live connection.
    fn broadcast_all(&self, message: ServerMessage);
}
