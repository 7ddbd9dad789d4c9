//! Feed assembly
//!
//! Turns the raw post records into the single JSON document served on `/feed`.

use std::sync::Arc;

use log::{debug, error};
use serde::Serialize;
use serde_json::value::RawValue;

use crate::error_handling::types::StorageError;
use crate::storage::storage_trait::PostStorage;

/// Envelope of the feed response. Records are embedded exactly as they were stored.
#[derive(Debug, Serialize)]
pub struct FeedResponse {
    #[serde(rename = "Posts")]
    pub posts: Vec<Box<RawValue>>,
}

/// Builds the whole feed on every call; there is no paging and no filtering.
#[derive(Clone)]
pub struct FeedAssembler {
    posts: Arc<dyn PostStorage>,
}

impl FeedAssembler {
    pub fn new(posts: Arc<dyn PostStorage>) -> Self {
        Self { posts }
    }

    /// Read every post, newest first, and serialize the envelope.
    pub fn assemble(&self) -> Result<Vec<u8>, StorageError> {
        let raw = self.posts.read_all()?;

        let posts = raw
            .into_iter()
            .map(RawValue::from_string)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                error!("Stored post is not valid JSON: {}", e);
                StorageError::Serialization(e)
            })?;

        let count = posts.len();
        let body = serde_json::to_vec(&FeedResponse { posts }).map_err(|e| {
            error!("Failed to serialize feed: {}", e);
            StorageError::Serialization(e)
        })?;
        debug!("Assembled feed with {} post(s), {} bytes", count, body.len());
        Ok(body)
    }
}
