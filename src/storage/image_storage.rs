use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Read};
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{error, info, warn};

use crate::error_handling::types::StorageError;
use crate::storage::storage_trait::ImageStorage;

const MAX_NAME_ATTEMPTS: i64 = 64;

/// Keeps uploaded images as `<unix-nanos>_<.ext>` files in one directory.
///
/// Only the extension of the client's file name survives, so nothing the client sends can
/// steer the blob outside the directory.
pub struct FileImageStorage {
    img_path: PathBuf,
}

impl FileImageStorage {
    pub fn new<P: AsRef<Path>>(img_path: P) -> Result<Self, StorageError> {
        let img_path = img_path.as_ref().to_path_buf();
        fs::create_dir_all(&img_path).map_err(|e| {
            error!("Failed to create image dir {}: {}", img_path.display(), e);
            StorageError::Io(e)
        })?;
        info!("FileImageStorage initialized at {}", img_path.display());
        Ok(Self { img_path })
    }

    pub fn path(&self) -> &Path {
        &self.img_path
    }

    /// Create a fresh blob file. Two uploads in the same nanosecond get consecutive stamps.
    fn create_blob(&self, extension: &str) -> Result<(PathBuf, File), StorageError> {
        let stamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let mut last_err = None;
        for bump in 0..MAX_NAME_ATTEMPTS {
            let path = self.img_path.join(blob_name(stamp + bump, extension));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(f) => return Ok((path, f)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    warn!("Image name {} already taken, retrying", path.display());
                    last_err = Some(e);
                }
                Err(e) => {
                    error!("Failed to create image file {}: {}", path.display(), e);
                    return Err(StorageError::Io(e));
                }
            }
        }
        Err(StorageError::Io(last_err.unwrap_or_else(|| {
            io::Error::new(ErrorKind::AlreadyExists, "no free image name")
        })))
    }
}

/// `<stamp>_<.ext>`, e.g. `1690000000000000000_.jpg`, or `<stamp>_` without an extension.
pub fn blob_name(stamp: i64, extension: &str) -> String {
    format!("{}_{}", stamp, extension)
}

/// Extension of `original_name` including its leading period, or an empty string.
pub fn original_extension(original_name: &str) -> String {
    Path::new(original_name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

impl ImageStorage for FileImageStorage {
    fn save(&self, data: &mut dyn Read, original_name: &str) -> Result<PathBuf, StorageError> {
        let (path, mut dst) = self.create_blob(&original_extension(original_name))?;
        let written = io::copy(data, &mut dst)
            .and_then(|n| dst.sync_all().map(|_| n))
            .map_err(|e| {
                error!("Failed to copy upload to {}: {}", path.display(), e);
                StorageError::Io(e)
            })?;
        info!("Saved image ({} bytes) to {}", written, path.display());
        Ok(path)
    }
}
