use std::net::SocketAddr;

use super::identity_resolver::Identity;

/// Login of the tailnet user, set by `tailscale serve` on proxied requests.
pub const SERVE_LOGIN_HEADER: &str = "tailscale-user-login";
/// Display name of the tailnet user, set by `tailscale serve` on proxied requests.
pub const SERVE_NAME_HEADER: &str = "tailscale-user-name";

/// Identity forwarded by a local `tailscale serve` proxy.
///
/// Only honoured when the connection comes from a loopback address: anything else could
/// set these headers itself. The display name falls back to the login.
pub fn serve_identity(
    remote: Option<SocketAddr>,
    login: Option<&str>,
    name: Option<&str>,
) -> Option<Identity> {
    if !remote?.ip().is_loopback() {
        return None;
    }
    let login = login.map(str::trim).filter(|l| !l.is_empty())?;
    let display = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(login);
    Some(Identity {
        login_name: login.to_string(),
        display_name: display.to_string(),
    })
}
