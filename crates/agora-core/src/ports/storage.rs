//! Object storage port for post images and avatars.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored object: the key persisted on posts and users, plus where it is served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub key: String,
    pub url: String,
}

/// Binary object storage.
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Store an image under a key scoped to `owner` and the upload time.
    async fn upload(
        &self,
        owner: Uuid,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<ImageRef, StorageError>;

    /// Publicly resolvable URL for a stored key.
    fn public_url(&self, key: &str) -> String;
}

/// Storage errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("Upload of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },

    #[error("Empty upload")]
    Empty,

    #[error("Storage I/O failed: {0}")]
    Io(String),
}
