use std::net::SocketAddr;

use async_trait::async_trait;
use log::debug;

use super::identity_resolver::{Identity, IdentityResolver};
use crate::error_handling::types::IdentityError;

/// Reports the same identity for every caller.
pub struct StaticResolver {
    identity: Identity,
}

impl StaticResolver {
    pub fn new(login_name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            identity: Identity {
                login_name: login_name.into(),
                display_name: display_name.into(),
            },
        }
    }
}

#[async_trait]
impl IdentityResolver for StaticResolver {
    async fn who_is(&self, remote: Option<SocketAddr>) -> Result<Identity, IdentityError> {
        let remote = remote.ok_or(IdentityError::UnknownPeer)?;
        debug!("Static identity {} for {}", self.identity.display_name, remote);
        Ok(self.identity.clone())
    }
}
