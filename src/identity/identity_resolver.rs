use std::net::SocketAddr;

use async_trait::async_trait;

use crate::error_handling::types::IdentityError;

/// Who is on the other end of a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Login of the user owning the peer node, e.g. `alice@example.com`.
    pub login_name: String,
    /// Name of the peer node; this is what posts are attributed to.
    pub display_name: String,
}

/// Maps the remote address of a request to a stable identity.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Resolve the peer behind `remote`. A request without a known remote address fails
    /// with `IdentityError::UnknownPeer`.
    async fn who_is(&self, remote: Option<SocketAddr>) -> Result<Identity, IdentityError>;
}
