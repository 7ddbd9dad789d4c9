use super::types::IdentityMode;
use crate::error_handling::types::ConfigError;
use clap::{Args, Parser};
use log::{debug, info};
use serde::Deserialize;
use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

const POST_DIR: &str = "post";
const IMG_DIR: &str = "img";

/// Command line of the `teaspoon` binary.
///
/// Either every setting comes from flags (and their environment variables), or a TOML file
/// is given with `--config` and replaces them.
#[derive(Parser, Debug)]
#[command(name = "teaspoon")]
#[command(version)]
#[command(about = "A tiny private photo and note feed for your tailnet")]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(long = "config", env = "TEASPOON_CONFIG")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub config: Config,
}

impl Cli {
    /// Resolve the effective configuration and validate it.
    pub fn into_config(self) -> Result<Config, ConfigError> {
        let config = match self.config_file {
            Some(path) => Config::from_file(&path)?,
            None => self.config,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Application configuration structure that defines all runtime parameters.
///
/// The structure is built once at start-up and handed to the constructors of the stores,
/// the identity resolver and the web server. Nothing reads it from a global.
///
/// # Fields Overview
///
/// - `port`: TCP port the feed is served on
/// - `hostname`: name of this node on the tailnet, shown on `/who`
/// - `bind_address`: local address to bind
/// - `data_dir`: root for the `post/` and `img/` directories
/// - `web_dir`: serve the web UI from disk instead of the embedded copy
/// - `identity`: which identity resolver to use
/// - `tailscaled_socket`: LocalAPI socket for the `local-api` resolver
/// - `static_login` / `static_name`: identity for the `static` resolver
/// - `max_upload_bytes`: upper bound on a multipart upload
#[derive(Args, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Port to serve on
    #[arg(long, env = "TEASPOON_PORT", default_value_t = default_port())]
    pub port: u16,

    /// Hostname to use on the tailnet
    #[arg(long, env = "TEASPOON_HOSTNAME", default_value_t = default_hostname())]
    pub hostname: String,

    /// Local address to bind the listener to; loopback unless the port is meant to be
    /// reachable without `tailscale serve` in front
    #[arg(long, env = "TEASPOON_BIND_ADDRESS", default_value_t = default_bind_address())]
    pub bind_address: IpAddr,

    /// Directory holding the `post` and `img` directories
    ///
    /// Both are created on start-up when missing.
    #[arg(long, env = "TEASPOON_DATA_DIR", default_value_os_t = default_data_dir())]
    pub data_dir: PathBuf,

    /// Serve the web UI from this directory instead of the built-in pages
    #[arg(long, env = "TEASPOON_WEB_DIR")]
    pub web_dir: Option<PathBuf>,

    /// Identity resolver
    #[arg(long, value_enum, env = "TEASPOON_IDENTITY", default_value_t = IdentityMode::LocalApi)]
    pub identity: IdentityMode,

    /// Unix socket of the local tailscaled LocalAPI
    #[arg(long, env = "TEASPOON_TAILSCALED_SOCKET", default_value_os_t = default_tailscaled_socket())]
    pub tailscaled_socket: PathBuf,

    /// Login name reported by the static resolver
    #[arg(long, env = "TEASPOON_STATIC_LOGIN")]
    pub static_login: Option<String>,

    /// Node name reported by the static resolver, used as post author
    #[arg(long, env = "TEASPOON_STATIC_NAME")]
    pub static_name: Option<String>,

    /// Maximum accepted size of an upload request body
    #[arg(long, env = "TEASPOON_MAX_UPLOAD_BYTES", default_value_t = default_max_upload_bytes())]
    pub max_upload_bytes: u64,
}

fn default_port() -> u16 {
    443
}

fn default_hostname() -> String {
    "teaspoon".to_string()
}

fn default_bind_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_tailscaled_socket() -> PathBuf {
    PathBuf::from("/var/run/tailscale/tailscaled.sock")
}

fn default_max_upload_bytes() -> u64 {
    32 << 20
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            hostname: default_hostname(),
            bind_address: default_bind_address(),
            data_dir: default_data_dir(),
            web_dir: None,
            identity: IdentityMode::default(),
            tailscaled_socket: default_tailscaled_socket(),
            static_login: None,
            static_name: None,
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Config {
    /// Load a configuration from a TOML file. Keys that are absent keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        info!("Loading configuration from {}", path.display());
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(raw).map_err(|e| ConfigError::TomlError(e.to_string()))?;
        debug!("Parsed configuration: {:?}", config);
        Ok(config)
    }

    /// Reject configurations the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port));
        }
        if self.hostname.trim().is_empty() {
            return Err(ConfigError::InvalidHostname(self.hostname.clone()));
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::InvalidUploadLimit(self.max_upload_bytes));
        }
        if self.identity == IdentityMode::Static
            && self.static_name.as_deref().map_or(true, |n| n.trim().is_empty())
        {
            return Err(ConfigError::MissingStaticIdentity);
        }
        if let Some(dir) = &self.web_dir {
            if !dir.is_dir() {
                return Err(ConfigError::DirectoryDoesNotExist(format!(
                    "web directory {} does not exist",
                    dir.display()
                )));
            }
        }
        Ok(())
    }

    pub fn post_dir(&self) -> PathBuf {
        self.data_dir.join(POST_DIR)
    }

    pub fn img_dir(&self) -> PathBuf {
        self.data_dir.join(IMG_DIR)
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}
