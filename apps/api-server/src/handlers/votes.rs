//! Vote handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use agora_core::domain::VoteDirection;
use agora_shared::dto::{UserVotesResponse, VoteRequest};

use super::views;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /api/posts/{id}/vote
///
/// Voting the same way twice withdraws the vote.
pub async fn cast(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<VoteRequest>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let direction = VoteDirection::try_from(body.value)?;

    let outcome = state
        .votes
        .cast(identity.user_id, post_id, direction)
        .await?;

    Ok(HttpResponse::Ok().json(views::vote(post_id, outcome)))
}

/// GET /api/posts/{id}/vote
pub async fn current(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let outcome = state.votes.current_vote(identity.user_id, post_id).await?;

    Ok(HttpResponse::Ok().json(views::vote(post_id, outcome)))
}

/// GET /api/users/me/votes
pub async fn mine(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let votes = state.votes.votes_for_user(identity.user_id).await?;

    Ok(HttpResponse::Ok().json(UserVotesResponse {
        votes: votes
            .into_iter()
            .map(|(post_id, vote)| (post_id.to_string(), vote.into()))
            .collect(),
    }))
}
