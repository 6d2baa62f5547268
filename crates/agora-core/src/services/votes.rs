//! Casting votes against the store's authoritative counter.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::{PostId, UserId, UserVote, VoteDirection};
use crate::error::{DomainError, RepoError};
use crate::ports::{PostRepository, VoteRepository};
use crate::voting::{InFlightVotes, VoteOutcome, apply_vote, reconcile};

#[derive(Clone)]
pub struct VoteService {
    votes: Arc<dyn VoteRepository>,
    posts: Arc<dyn PostRepository>,
    in_flight: InFlightVotes,
}

impl VoteService {
    pub fn new(votes: Arc<dyn VoteRepository>, posts: Arc<dyn PostRepository>) -> Self {
        Self {
            votes,
            posts,
            in_flight: InFlightVotes::new(),
        }
    }

    /// Toggle, record or flip the requester's vote and return the stored result.
    ///
    /// A second vote for the same (user, post) while one is still being
    /// applied is rejected with `Conflict`.
    pub async fn cast(
        &self,
        user_id: UserId,
        post_id: PostId,
        direction: VoteDirection,
    ) -> Result<VoteOutcome, DomainError> {
        let _guard = self.in_flight.try_begin(user_id, post_id).ok_or_else(|| {
            DomainError::Conflict("A vote on this post is already in progress".to_string())
        })?;

        let before = self.current_vote(user_id, post_id).await?;
        let optimistic = apply_vote(before.new_user_vote, before.new_total, direction);

        let authoritative = self
            .votes
            .cast_vote(user_id, post_id, direction)
            .await
            .map_err(|e| match e {
                RepoError::NotFound => DomainError::not_found("Post", post_id),
                other => other.into(),
            })?;

        let reconciled = reconcile(optimistic, authoritative);
        if reconciled.diverged {
            tracing::debug!(
                post_id = %post_id,
                optimistic = optimistic.new_total,
                authoritative = authoritative.new_total,
                "Vote total moved concurrently"
            );
        }
        Ok(reconciled.outcome)
    }

    /// The post's current total and the user's standing on it.
    pub async fn current_vote(
        &self,
        user_id: UserId,
        post_id: PostId,
    ) -> Result<VoteOutcome, DomainError> {
        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", post_id))?;
        let vote = self.votes.find_vote(user_id, post_id).await?;

        Ok(VoteOutcome {
            new_total: post.vote_total,
            new_user_vote: UserVote::from(vote.map(|v| v.direction)),
        })
    }

    /// Every non-neutral vote the user has cast, by post.
    pub async fn votes_for_user(
        &self,
        user_id: UserId,
    ) -> Result<HashMap<PostId, UserVote>, DomainError> {
        Ok(self.votes.find_votes_by_user(user_id).await?)
    }

    pub fn is_pending(&self, user_id: UserId, post_id: PostId) -> bool {
        self.in_flight.is_pending(user_id, post_id)
    }
}
