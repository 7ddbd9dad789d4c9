use std::fmt;

use warp::http::{Method, StatusCode};

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    TomlError(String),
    InvalidPort(u16),
    InvalidHostname(String),
    InvalidUploadLimit(u64),
    MissingStaticIdentity,
    DirectoryDoesNotExist(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parsing error: {}", e),
            ConfigError::InvalidPort(p) => write!(f, "Port error: {} is not a usable port", p),
            ConfigError::InvalidHostname(h) => write!(f, "Hostname error: {:?} is not valid", h),
            ConfigError::InvalidUploadLimit(n) => {
                write!(f, "Upload limit error: {} bytes is too small", n)
            }
            ConfigError::MissingStaticIdentity => {
                write!(f, "Identity error: static identity mode requires a static name")
            }
            ConfigError::DirectoryDoesNotExist(e) => write!(f, "Directory error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    Serialization(serde_json::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "Storage IO error: {}", e),
            StorageError::Serialization(e) => write!(f, "Storage serialization error: {}", e),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            StorageError::Serialization(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err)
    }
}

#[derive(Debug)]
pub enum IdentityError {
    UnknownPeer,
    Connect(std::io::Error),
    Http(String),
    Status(u16, String),
    Decode(serde_json::Error),
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityError::UnknownPeer => write!(f, "Identity error: remote address unknown"),
            IdentityError::Connect(e) => write!(f, "Identity error: cannot reach tailscaled: {}", e),
            IdentityError::Http(e) => write!(f, "Identity error: LocalAPI request failed: {}", e),
            IdentityError::Status(code, body) => {
                write!(f, "Identity error: LocalAPI returned {}: {}", code, body.trim())
            }
            IdentityError::Decode(e) => write!(f, "Identity error: bad whois response: {}", e),
        }
    }
}

impl std::error::Error for IdentityError {}

impl From<serde_json::Error> for IdentityError {
    fn from(err: serde_json::Error) -> Self {
        IdentityError::Decode(err)
    }
}

impl From<hyper::Error> for IdentityError {
    fn from(err: hyper::Error) -> Self {
        IdentityError::Http(err.to_string())
    }
}

#[derive(Debug)]
pub enum WebError {
    MethodNotAllowed(Method),
    Storage(StorageError),
    Identity(IdentityError),
    Serialization(serde_json::Error),
    Upload(String),
    Template(String),
    Task(String),
}

impl WebError {
    pub fn status(&self) -> StatusCode {
        match self {
            WebError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::MethodNotAllowed(m) => {
                write!(f, "only {} requests are supported at this endpoint", m)
            }
            WebError::Storage(e) => write!(f, "{}", e),
            WebError::Identity(e) => write!(f, "{}", e),
            WebError::Serialization(e) => write!(f, "Malformed post data: {}", e),
            WebError::Upload(e) => write!(f, "Upload error: {}", e),
            WebError::Template(e) => write!(f, "Template error: {}", e),
            WebError::Task(e) => write!(f, "Storage task failed: {}", e),
        }
    }
}

impl std::error::Error for WebError {}

impl From<StorageError> for WebError {
    fn from(err: StorageError) -> Self {
        WebError::Storage(err)
    }
}

impl From<IdentityError> for WebError {
    fn from(err: IdentityError) -> Self {
        WebError::Identity(err)
    }
}

impl From<serde_json::Error> for WebError {
    fn from(err: serde_json::Error) -> Self {
        WebError::Serialization(err)
    }
}

impl From<tokio::task::JoinError> for WebError {
    fn from(err: tokio::task::JoinError) -> Self {
        WebError::Task(err.to_string())
    }
}
