//! Friend list handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use agora_shared::dto::FriendResponse;

use super::views;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /api/users/{id}/friend
pub async fn add(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let friend_id = path.into_inner();
    state.friends.add_friend(identity.user_id, friend_id).await?;

    Ok(HttpResponse::Created().json(FriendResponse {
        friend_id: friend_id.to_string(),
        friends: true,
    }))
}

/// DELETE /api/users/{id}/friend
pub async fn remove(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let friend_id = path.into_inner();
    state.friends.remove_friend(identity.user_id, friend_id).await?;

    Ok(HttpResponse::Ok().json(FriendResponse {
        friend_id: friend_id.to_string(),
        friends: false,
    }))
}

/// GET /api/users/{id}/friends
pub async fn list(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let friends = state.friends.list_friends(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(views::users(&friends, state.media.as_ref())))
}
