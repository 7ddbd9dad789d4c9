//! Storage subsystem
//!
//! This module provides the directory-backed persistence of the feed.
//!
//! Components:
//! - `storage_trait`: the `PostStorage` and `ImageStorage` traits the web layer talks to.
//! - `types`: the persisted `Post` record and the upload request payload.
//! - `file_storage`: one JSON file per post, read back newest first.
//! - `image_storage`: uploaded image blobs named by upload time.

pub mod file_storage;
pub mod image_storage;
pub mod storage_trait;
pub mod types;

pub use file_storage::FilePostStorage;
pub use image_storage::FileImageStorage;
pub use storage_trait::{ImageStorage, PostStorage};
pub use types::{Post, UploadRequest};
