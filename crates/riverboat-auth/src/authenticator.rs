use super::Member;

/// The credential-validation contract the router depends on.
///
/// Given an opaque credential, resolve a stable user identity or reject.
/// Keeping this a trait keeps the message router independent of how
/// credentials are issued.
#[async_trait::async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, credential: &str) -> Option<Member>;
}
