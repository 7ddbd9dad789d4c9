use clap::ValueEnum;
use serde::Deserialize;

/// How the caller's identity is resolved for `/who` and post authorship.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdentityMode {
    /// Ask the local tailscaled over its LocalAPI socket.
    #[default]
    LocalApi,
    /// Every caller gets the configured static identity.
    Static,
}
