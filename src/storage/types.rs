use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One submission to the feed. Records are written once and never modified.
///
/// The field names on disk are the ones the web UI reads: `ID`, `Note`, `Author`, `Img`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Note")]
    pub note: String,
    #[serde(rename = "Author")]
    pub author: String,
    /// Public reference to the attached image, empty when there is none.
    #[serde(rename = "Img", default)]
    pub image_path: String,
}

impl Post {
    /// Create a post with a freshly generated identifier.
    pub fn new(note: impl Into<String>, author: impl Into<String>, image_path: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            note: note.into(),
            author: author.into(),
            image_path: image_path.unwrap_or_default(),
        }
    }

    pub fn has_image(&self) -> bool {
        !self.image_path.is_empty()
    }
}

/// The JSON carried in the `post` form field of an upload.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadRequest {
    #[serde(rename = "Note")]
    pub note: String,
}
