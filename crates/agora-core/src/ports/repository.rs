//! Persistence ports.
//!
//! Every method returns fully typed domain records; row mapping and any
//! table naming quirks stay inside the adapters.

use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Comment, CommentId, Friendship, Post, PostId, SavedPost, User, UserId, UserVote, Vote,
    VoteDirection,
};
use crate::error::RepoError;
use crate::voting::VoteOutcome;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity.
    async fn create(&self, entity: T) -> Result<T, RepoError>;

    /// Overwrite an existing entity. `RepoError::NotFound` if it is gone.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    /// All users whose id is in `ids`; unknown ids are skipped.
    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, RepoError>;

    /// Case-insensitive substring match on the username, or an exact
    /// case-insensitive match on the email. Ordered by username.
    async fn search(&self, query: &str, limit: u64) -> Result<Vec<User>, RepoError>;

    /// Ordered by username.
    async fn list(&self, limit: u64) -> Result<Vec<User>, RepoError>;
}

/// Post repository. Deleting a post removes its comments, votes and saves.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError>;

    async fn slug_exists(&self, slug: &str) -> Result<bool, RepoError>;

    /// Newest first.
    async fn find_by_author(&self, author_id: UserId) -> Result<Vec<Post>, RepoError>;

    async fn find_many(&self, ids: &[PostId]) -> Result<Vec<Post>, RepoError>;

    /// Newest first.
    async fn list_recent(&self, limit: u64) -> Result<Vec<Post>, RepoError>;

    /// Case-insensitive substring match on the title, newest first.
    async fn search_title(&self, query: &str, limit: u64) -> Result<Vec<Post>, RepoError>;
}

/// Comment repository.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    /// All comments on a post in ascending `created_at` order.
    async fn find_by_post(&self, post_id: PostId) -> Result<Vec<Comment>, RepoError>;

    /// Atomically delete a comment together with all of its replies.
    ///
    /// Follows `parent_id` links only, so a reply filed under a different post
    /// than its parent goes too. The planned fallback skips such replies; the
    /// Postgres schema refuses to store them in the first place.
    ///
    /// Stores that cannot do this in one step return `RepoError::Unsupported`.
    async fn delete_subtree(&self, id: CommentId) -> Result<u64, RepoError>;

    /// Delete every listed comment, returning how many rows went away.
    async fn delete_many(&self, ids: &[CommentId]) -> Result<u64, RepoError>;
}

/// Vote storage. `cast_vote` is the authoritative counter update.
#[async_trait]
pub trait VoteRepository: Send + Sync {
    /// Apply a vote and the matching change to the post total as one atomic
    /// step, returning the resulting total and standing.
    ///
    /// `RepoError::NotFound` if the post does not exist.
    async fn cast_vote(
        &self,
        user_id: UserId,
        post_id: PostId,
        direction: VoteDirection,
    ) -> Result<VoteOutcome, RepoError>;

    async fn find_vote(&self, user_id: UserId, post_id: PostId) -> Result<Option<Vote>, RepoError>;

    async fn find_votes_by_user(
        &self,
        user_id: UserId,
    ) -> Result<HashMap<PostId, UserVote>, RepoError>;
}

/// Saved-post bookmarks.
#[async_trait]
pub trait SavedPostRepository: Send + Sync {
    /// Idempotent: saving twice keeps the first entry.
    async fn save(&self, entry: SavedPost) -> Result<(), RepoError>;

    /// Returns whether an entry was removed.
    async fn remove(&self, user_id: UserId, post_id: PostId) -> Result<bool, RepoError>;

    async fn is_saved(&self, user_id: UserId, post_id: PostId) -> Result<bool, RepoError>;

    /// Most recently saved first.
    async fn list_post_ids(&self, user_id: UserId) -> Result<Vec<PostId>, RepoError>;
}

/// One-directional friend links between users.
#[async_trait]
pub trait FriendshipRepository: Send + Sync {
    /// `RepoError::Constraint` if the link exists or either user is missing.
    async fn add(&self, friendship: Friendship) -> Result<(), RepoError>;

    /// Returns whether a link was removed.
    async fn remove(&self, user_id: UserId, friend_id: UserId) -> Result<bool, RepoError>;

    async fn exists(&self, user_id: UserId, friend_id: UserId) -> Result<bool, RepoError>;

    /// Most recently added first.
    async fn list_friend_ids(&self, user_id: UserId) -> Result<Vec<UserId>, RepoError>;
}
