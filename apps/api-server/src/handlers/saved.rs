//! Saved-post handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use agora_shared::dto::SaveResponse;

use super::views;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /api/posts/{id}/save
pub async fn save(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    state.saved.save(identity.user_id, post_id).await?;

    Ok(HttpResponse::Ok().json(SaveResponse {
        post_id: post_id.to_string(),
        saved: true,
    }))
}

/// DELETE /api/posts/{id}/save
pub async fn unsave(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    state.saved.unsave(identity.user_id, post_id).await?;

    Ok(HttpResponse::Ok().json(SaveResponse {
        post_id: post_id.to_string(),
        saved: false,
    }))
}

/// GET /api/posts/{id}/save
pub async fn status(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let saved = state.saved.is_saved(identity.user_id, post_id).await?;

    Ok(HttpResponse::Ok().json(SaveResponse {
        post_id: post_id.to_string(),
        saved,
    }))
}

/// GET /api/users/me/saved
pub async fn list(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let posts = state.saved.list_saved(identity.user_id).await?;
    Ok(HttpResponse::Ok().json(views::posts(posts, state.media.as_ref())))
}
