//! Comment handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use agora_shared::dto::{CreateCommentRequest, DeleteCommentResponse};

use super::views;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/posts/{id}/comments
pub async fn list_for_post(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let forest = state.comments.list_tree(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(views::comments(forest, state.media.as_ref())))
}

/// POST /api/posts/{id}/comments
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<CreateCommentRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let view = state
        .comments
        .create(path.into_inner(), identity.user_id, &req.content, req.parent_id)
        .await?;

    Ok(HttpResponse::Created().json(views::comment(view, state.media.as_ref())))
}

/// DELETE /api/comments/{id}
///
/// Removes the comment and all of its replies. Allowed for the comment's
/// author and the post's author.
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let report = state
        .comments
        .delete(path.into_inner(), identity.user_id)
        .await?;

    Ok(HttpResponse::Ok().json(DeleteCommentResponse {
        deleted: report.removed.iter().map(Uuid::to_string).collect(),
    }))
}
