//! Caller identity
//!
//! The overlay network decides who may connect; this module only asks it who did.
//!
//! Components:
//! - `identity_resolver`: the `IdentityResolver` trait and the `Identity` it yields.
//! - `local_api`: resolver backed by the tailscaled LocalAPI `whois` call.
//! - `serve_headers`: identity forwarded by `tailscale serve` to a loopback listener.
//! - `static_resolver`: fixed identity for development and tests.

pub mod identity_resolver;
pub mod local_api;
pub mod serve_headers;
pub mod static_resolver;

pub use identity_resolver::{Identity, IdentityResolver};
pub use local_api::LocalApiResolver;
pub use serve_headers::serve_identity;
pub use static_resolver::StaticResolver;

use std::sync::Arc;

use crate::configuration::{Config, IdentityMode};
use crate::error_handling::types::ConfigError;

/// Build the resolver selected by the configuration.
pub fn resolver_from_config(config: &Config) -> Result<Arc<dyn IdentityResolver>, ConfigError> {
    match config.identity {
        IdentityMode::LocalApi => Ok(Arc::new(LocalApiResolver::new(&config.tailscaled_socket))),
        IdentityMode::Static => {
            let name = config
                .static_name
                .clone()
                .ok_or(ConfigError::MissingStaticIdentity)?;
            let login = config.static_login.clone().unwrap_or_else(|| name.clone());
            Ok(Arc::new(StaticResolver::new(login, name)))
        }
    }
}
