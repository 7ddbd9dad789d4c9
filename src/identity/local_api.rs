use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use http_body_util::{BodyExt, Empty};
use hyper::body::Bytes;
use hyper::client::conn::http1;
use hyper::{header, Request, StatusCode};
use hyper_util::rt::TokioIo;
use log::{debug, error};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;
use tokio::net::UnixStream;

use super::identity_resolver::{Identity, IdentityResolver};
use crate::error_handling::types::IdentityError;

/// Host header tailscaled expects on LocalAPI requests.
const LOCAL_API_HOST: &str = "local-tailscaled.sock";
const WHOIS_PATH: &str = "/localapi/v0/whois";

#[derive(Debug, Deserialize)]
struct WhoIsResponse {
    #[serde(rename = "Node")]
    node: WhoIsNode,
    #[serde(rename = "UserProfile")]
    user_profile: WhoIsUser,
}

#[derive(Debug, Deserialize)]
struct WhoIsNode {
    #[serde(rename = "ComputedName", default)]
    computed_name: String,
    /// Fully qualified MagicDNS name, e.g. `laptop.tail1234.ts.net.`
    #[serde(rename = "Name", default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct WhoIsUser {
    #[serde(rename = "LoginName", default)]
    login_name: String,
}

impl From<WhoIsResponse> for Identity {
    fn from(who: WhoIsResponse) -> Self {
        let display_name = if who.node.computed_name.is_empty() {
            who.node.name.split('.').next().unwrap_or_default().to_string()
        } else {
            who.node.computed_name
        };
        Identity {
            login_name: who.user_profile.login_name,
            display_name,
        }
    }
}

/// Resolves peers through the `whois` endpoint of the local tailscaled.
///
/// One short-lived HTTP/1.1 connection over the LocalAPI Unix socket per lookup.
pub struct LocalApiResolver {
    socket_path: PathBuf,
}

impl LocalApiResolver {
    pub fn new<P: AsRef<Path>>(socket_path: P) -> Self {
        Self {
            socket_path: socket_path.as_ref().to_path_buf(),
        }
    }

    fn whois_uri(remote: SocketAddr) -> String {
        let addr = remote.to_string();
        format!("{}?addr={}", WHOIS_PATH, utf8_percent_encode(&addr, NON_ALPHANUMERIC))
    }

    async fn get(&self, uri: &str) -> Result<(StatusCode, Bytes), IdentityError> {
        let stream = UnixStream::connect(&self.socket_path).await.map_err(|e| {
            error!("Failed to connect to {}: {}", self.socket_path.display(), e);
            IdentityError::Connect(e)
        })?;

        let (mut sender, conn) = http1::handshake(TokioIo::new(stream)).await?;
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!("LocalAPI connection ended with error: {}", e);
            }
        });

        let req = Request::get(uri)
            .header(header::HOST, LOCAL_API_HOST)
            .header("Sec-Tailscale", "localapi")
            .body(Empty::<Bytes>::new())
            .map_err(|e| IdentityError::Http(e.to_string()))?;

        let res = sender.send_request(req).await?;
        let status = res.status();
        let body = res.into_body().collect().await?.to_bytes();
        Ok((status, body))
    }
}

#[async_trait]
impl IdentityResolver for LocalApiResolver {
    async fn who_is(&self, remote: Option<SocketAddr>) -> Result<Identity, IdentityError> {
        let remote = remote.ok_or(IdentityError::UnknownPeer)?;
        let (status, body) = self.get(&Self::whois_uri(remote)).await?;
        if !status.is_success() {
            let text = String::from_utf8_lossy(&body).into_owned();
            error!("whois {} failed with {}: {}", remote, status, text.trim());
            return Err(IdentityError::Status(status.as_u16(), text));
        }

        let who: WhoIsResponse = serde_json::from_slice(&body)?;
        let identity = Identity::from(who);
        debug!("{} is {} ({})", remote, identity.display_name, identity.login_name);
        Ok(identity)
    }
}
