//! Local filesystem implementation of `MediaStorage`.
//!
//! Objects live at `<root>/<owner>/<unix millis>-<stem>.<ext>` and are served
//! by the HTTP layer under `url_prefix`.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;
use uuid::Uuid;

use agora_core::ports::{ImageRef, MediaStorage, StorageError};

const MAX_NAME_LEN: usize = 100;

/// Raster formats accepted for upload, with the extension they are stored
/// under. Files are served by extension, so the stored name never keeps the
/// client's own.
const ALLOWED_TYPES: [(&str, &str); 4] = [
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
];

fn extension_for(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    ALLOWED_TYPES
        .iter()
        .find(|(mime, _)| *mime == essence)
        .map(|(_, ext)| *ext)
}

/// Local media storage configuration.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Root directory for all uploads (e.g. "./data/media").
    pub root: PathBuf,
    /// Public URL prefix (e.g. "/media").
    pub url_prefix: String,
    /// Largest accepted upload in bytes.
    pub max_bytes: usize,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./data/media"),
            url_prefix: "/media".to_string(),
            max_bytes: 5 * 1024 * 1024,
        }
    }
}

pub struct LocalMediaStorage {
    config: MediaConfig,
}

impl LocalMediaStorage {
    pub fn new(config: MediaConfig) -> Self {
        Self { config }
    }

    pub fn root(&self) -> &PathBuf {
        &self.config.root
    }
}

/// Keep ASCII letters, digits, `.`, `-` and `_`; everything else becomes `_`.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_NAME_LEN)
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

#[async_trait]
impl MediaStorage for LocalMediaStorage {
    async fn upload(
        &self,
        owner: Uuid,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<ImageRef, StorageError> {
        let Some(extension) = extension_for(content_type) else {
            return Err(StorageError::UnsupportedContentType(
                content_type.to_string(),
            ));
        };
        if bytes.is_empty() {
            return Err(StorageError::Empty);
        }
        if bytes.len() > self.config.max_bytes {
            return Err(StorageError::TooLarge {
                size: bytes.len(),
                limit: self.config.max_bytes,
            });
        }

        let name = sanitize_file_name(file_name);
        let stem = match name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => name.as_str(),
        };
        let key = format!(
            "{owner}/{}-{stem}.{extension}",
            Utc::now().timestamp_millis()
        );
        let target = self.config.root.join(&key);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Io(e.to_string()))?;
        }
        fs::write(&target, &bytes)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;

        tracing::info!(key = %key, size = bytes.len(), "Media stored");
        Ok(ImageRef {
            url: self.public_url(&key),
            key,
        })
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.config.url_prefix.trim_end_matches('/'), key)
    }
}
