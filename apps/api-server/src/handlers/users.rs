//! Profile handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use agora_core::services::ProfileChanges;
use agora_shared::dto::{SearchUsersQuery, UpdateProfileRequest};

use super::posts::clamp_limit;
use super::views;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/users?q=
pub async fn directory(
    state: web::Data<AppState>,
    query: web::Query<SearchUsersQuery>,
) -> AppResult<HttpResponse> {
    let users = state
        .profiles
        .find_users(query.q.as_deref(), clamp_limit(query.limit))
        .await?;
    Ok(HttpResponse::Ok().json(views::users(&users, state.media.as_ref())))
}

/// GET /api/users/{id}
pub async fn profile(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let profile = state.profiles.get_profile(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(views::profile(profile, state.media.as_ref())))
}

/// PUT /api/users/me
pub async fn update_me(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<UpdateProfileRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let user = state
        .profiles
        .update_profile(
            identity.user_id,
            ProfileChanges {
                username: req.username,
                bio: req.bio,
                avatar_ref: req.avatar_ref,
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(views::user(&user, state.media.as_ref())))
}
