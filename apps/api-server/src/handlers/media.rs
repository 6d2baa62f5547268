//! Image upload handler.

use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use futures::StreamExt;

use agora_shared::dto::MediaUploadResponse;

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const FILE_FIELD: &str = "file";

/// POST /api/media
///
/// Accepts a multipart form with a single `file` field. The returned
/// `image_ref` is what posts and profiles store.
pub async fn upload(
    state: web::Data<AppState>,
    identity: Identity,
    mut payload: Multipart,
) -> AppResult<HttpResponse> {
    let limit = state.max_upload_bytes;

    while let Some(field) = payload.next().await {
        let mut field = field.map_err(|e| AppError::BadRequest(e.to_string()))?;
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let content_type = field
            .content_type()
            .map(|mime| mime.essence_str().to_string())
            .unwrap_or_default();
        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or("upload")
            .to_string();

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| AppError::BadRequest(e.to_string()))?;
            if bytes.len() + chunk.len() > limit {
                return Err(AppError::PayloadTooLarge(format!(
                    "Upload exceeds the {limit} byte limit"
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        let stored = state
            .media
            .upload(identity.user_id, &file_name, &content_type, bytes)
            .await?;
        tracing::info!(user_id = %identity.user_id, key = %stored.key, "Media uploaded");

        return Ok(HttpResponse::Created().json(MediaUploadResponse {
            image_ref: stored.key,
            url: stored.url,
        }));
    }

    Err(AppError::BadRequest(format!(
        "Missing multipart field `{FILE_FIELD}`"
    )))
}
