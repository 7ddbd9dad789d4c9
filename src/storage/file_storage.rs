use std::cmp::Reverse;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use log::{debug, error, info};

use crate::error_handling::types::StorageError;
use crate::storage::storage_trait::PostStorage;
use crate::storage::types::Post;

const RECORD_EXTENSION: &str = "json";

/// Stores every post as `<id>.json` in a single directory.
///
/// Nothing is cached: each `read_all` lists the directory again, so the directory is the
/// only source of truth. Writes never collide because every post carries a fresh UUID.
pub struct FilePostStorage {
    post_path: PathBuf,
}

impl FilePostStorage {
    pub fn new<P: AsRef<Path>>(post_path: P) -> Result<Self, StorageError> {
        let post_path = post_path.as_ref().to_path_buf();
        fs::create_dir_all(&post_path).map_err(|e| {
            error!("Failed to create post dir {}: {}", post_path.display(), e);
            StorageError::Io(e)
        })?;
        info!("FilePostStorage initialized at {}", post_path.display());
        Ok(Self { post_path })
    }

    pub fn path(&self) -> &Path {
        &self.post_path
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.post_path.join(format!("{}.{}", id, RECORD_EXTENSION))
    }

    /// Record files in the directory, paired with their modification time when it is readable.
    fn list_records(&self) -> Result<Vec<(PathBuf, Option<SystemTime>)>, StorageError> {
        let entries = fs::read_dir(&self.post_path).map_err(|e| {
            error!("Failed to read post dir {}: {}", self.post_path.display(), e);
            StorageError::Io(e)
        })?;

        let mut records = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                error!("Dir entry error: {}", e);
                StorageError::Io(e)
            })?;
            let path = entry.path();
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            let is_record = path.extension().and_then(|s| s.to_str()) == Some(RECORD_EXTENSION);
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if hidden || !is_record || !is_file {
                continue;
            }
            let modified = entry.metadata().and_then(|m| m.modified()).ok();
            records.push((path, modified));
        }
        Ok(records)
    }
}

/// Most recently modified first. `None` (unreadable mtime) orders before any real
/// timestamp, so those records land last.
fn newest_first(records: &mut [(PathBuf, Option<SystemTime>)]) {
    records.sort_by_key(|(_, modified)| Reverse(*modified));
}

impl PostStorage for FilePostStorage {
    fn write(&self, post: &Post) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(post).map_err(|e| {
            error!("Failed to serialize post {}: {}", post.id, e);
            StorageError::Serialization(e)
        })?;

        let path = self.record_path(&post.id);
        let mut f = File::create(&path).map_err(|e| {
            error!("Failed to create post file {}: {}", path.display(), e);
            StorageError::Io(e)
        })?;
        f.write_all(&bytes)
            .and_then(|_| f.sync_all())
            .map_err(|e| {
                error!("Failed to write post file {}: {}", path.display(), e);
                StorageError::Io(e)
            })?;

        info!("Saved post {} to {}", post.id, path.display());
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<String>, StorageError> {
        let mut records = self.list_records()?;
        newest_first(&mut records);

        let mut posts = Vec::with_capacity(records.len());
        for (path, _) in records {
            let raw = fs::read_to_string(&path).map_err(|e| {
                error!("Failed to read post file {}: {}", path.display(), e);
                StorageError::Io(e)
            })?;
            posts.push(raw);
        }
        debug!("Loaded {} post(s) from {}", posts.len(), self.post_path.display());
        Ok(posts)
    }
}
