//! Post handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use agora_core::services::{NewPost, PostChanges};
use agora_shared::dto::{CreatePostRequest, ListPostsQuery, SearchPostsQuery, UpdatePostRequest};

use super::views;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

const DEFAULT_LIMIT: u64 = 50;
const MAX_LIMIT: u64 = 200;

pub(super) fn clamp_limit(limit: Option<u64>) -> u64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// GET /api/posts
pub async fn list(
    state: web::Data<AppState>,
    query: web::Query<ListPostsQuery>,
) -> AppResult<HttpResponse> {
    let posts = state.posts.list_recent(clamp_limit(query.limit)).await?;
    Ok(HttpResponse::Ok().json(views::posts(posts, state.media.as_ref())))
}

/// GET /api/posts/search?q=
pub async fn search(
    state: web::Data<AppState>,
    query: web::Query<SearchPostsQuery>,
) -> AppResult<HttpResponse> {
    let posts = state
        .posts
        .search(&query.q, clamp_limit(query.limit))
        .await?;
    Ok(HttpResponse::Ok().json(views::posts(posts, state.media.as_ref())))
}

/// POST /api/posts
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let view = state
        .posts
        .create(
            identity.user_id,
            NewPost {
                title: req.title,
                content: req.content,
                image_ref: req.image_ref,
            },
        )
        .await?;
    tracing::debug!(username = %identity.username, slug = %view.post.slug, "Post submitted");

    Ok(HttpResponse::Created().json(views::post(view, state.media.as_ref())))
}

/// GET /api/posts/{id}
pub async fn get(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let view = state.posts.get_by_id(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(views::post(view, state.media.as_ref())))
}

/// GET /api/posts/slug/{slug}
pub async fn get_by_slug(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let view = state.posts.get_by_slug(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(views::post(view, state.media.as_ref())))
}

/// PUT /api/posts/{id}
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let view = state
        .posts
        .update(
            path.into_inner(),
            identity.user_id,
            PostChanges {
                title: req.title,
                content: req.content,
                image_ref: req.image_ref,
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(views::post(view, state.media.as_ref())))
}

/// DELETE /api/posts/{id}
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state
        .posts
        .delete(path.into_inner(), identity.user_id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
