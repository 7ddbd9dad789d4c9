//! Storage Traits
//!
//! The web layer only sees these two traits, so the directory-per-record layout can be
//! replaced by an embedded store without touching the HTTP handlers.
//!
//! All methods return a `Result` to handle potential storage errors.

use std::io::Read;
use std::path::PathBuf;

use crate::error_handling::types::StorageError;
use crate::storage::types::Post;

/// Append-only store of feed posts.
pub trait PostStorage: Send + Sync {
    /// Persist a new post.
    fn write(&self, post: &Post) -> Result<(), StorageError>;

    /// Every persisted record in its serialized form, most recently written first.
    fn read_all(&self) -> Result<Vec<String>, StorageError>;
}

/// Write-only store of uploaded image blobs.
///
/// Uploads reach `save` from memory: the HTTP layer reads the whole multipart body,
/// which is capped at `max_upload_bytes` (413 beyond that), before anything is written.
/// Callers on an async runtime should call it from the blocking pool.
pub trait ImageStorage: Send + Sync {
    /// Copy `data` into a new blob and return where it was stored.
    ///
    /// - `original_name` - file name supplied by the client; only its extension is kept.
    fn save(&self, data: &mut dyn Read, original_name: &str) -> Result<PathBuf, StorageError>;
}
