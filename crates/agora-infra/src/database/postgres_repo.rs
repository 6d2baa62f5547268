//! PostgreSQL repository implementations.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func, LikeExpr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

use agora_core::domain::{
    Comment, CommentId, Friendship, Post, PostId, SavedPost, User, UserId, UserVote, Vote,
    VoteDirection,
};
use agora_core::error::RepoError;
use agora_core::ports::{
    CommentRepository, FriendshipRepository, PostRepository, SavedPostRepository, UserRepository,
    VoteRepository,
};
use agora_core::voting::{VoteOutcome, apply_vote};

use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::friendship::{self, Entity as FriendshipEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::saved_post::{self, Entity as SavedPostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::entity::vote::{self, Entity as VoteEntity};
use super::errors::map_db_err;
use super::postgres_base::PostgresBaseRepository;

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

/// PostgreSQL vote repository.
pub type PostgresVoteRepository = PostgresBaseRepository<VoteEntity>;

/// PostgreSQL saved-post repository.
pub type PostgresSavedPostRepository = PostgresBaseRepository<SavedPostEntity>;

/// PostgreSQL friendship repository.
pub type PostgresFriendshipRepository = PostgresBaseRepository<FriendshipEntity>;

/// Mask an email for logging to avoid PII in logs.
fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let mut chars = local.chars();
            match (chars.next(), chars.next()) {
                (Some(first), Some(_)) => format!("{first}***@{domain}"),
                _ => format!("***@{domain}"),
            }
        }
        None => "***".to_string(),
    }
}

/// `%query%` with LIKE metacharacters escaped, lowercased for `lower(column)`.
fn contains_pattern(query: &str) -> LikeExpr {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for ch in query.to_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    LikeExpr::new(escaped).escape('\\')
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let result = UserEntity::find()
            .filter(user::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn search(&self, query: &str, limit: u64) -> Result<Vec<User>, RepoError> {
        let username = Expr::expr(Func::lower(Expr::col((UserEntity, user::Column::Username))));
        let email = Expr::expr(Func::lower(Expr::col((UserEntity, user::Column::Email))));
        let result = UserEntity::find()
            .filter(
                username
                    .like(contains_pattern(query))
                    .or(email.eq(query.to_lowercase())),
            )
            .order_by_asc(user::Column::Username)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn list(&self, limit: u64) -> Result<Vec<User>, RepoError> {
        let result = UserEntity::find()
            .order_by_asc(user::Column::Username)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let result = PostEntity::find()
            .filter(post::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, RepoError> {
        let count = PostEntity::find()
            .filter(post::Column::Slug.eq(slug))
            .count(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(count > 0)
    }

    async fn find_by_author(&self, author_id: UserId) -> Result<Vec<Post>, RepoError> {
        let result = PostEntity::find()
            .filter(post::Column::AuthorId.eq(author_id))
            .order_by_desc(post::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn find_many(&self, ids: &[PostId]) -> Result<Vec<Post>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let result = PostEntity::find()
            .filter(post::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn list_recent(&self, limit: u64) -> Result<Vec<Post>, RepoError> {
        let result = PostEntity::find()
            .order_by_desc(post::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn search_title(&self, query: &str, limit: u64) -> Result<Vec<Post>, RepoError> {
        let result = PostEntity::find()
            .filter(
                Expr::expr(Func::lower(Expr::col((PostEntity, post::Column::Title))))
                    .like(contains_pattern(query)),
            )
            .order_by_desc(post::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn find_by_post(&self, post_id: PostId) -> Result<Vec<Comment>, RepoError> {
        let result = CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_asc(comment::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    /// The `(post_id, parent_id)` foreign key cascades, so deleting the root
    /// removes the whole thread inside one statement.
    async fn delete_subtree(&self, id: CommentId) -> Result<u64, RepoError> {
        let result = CommentEntity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(result.rows_affected)
    }

    async fn delete_many(&self, ids: &[CommentId]) -> Result<u64, RepoError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = CommentEntity::delete_many()
            .filter(comment::Column::Id.is_in(ids.iter().copied()))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected)
    }
}

#[async_trait]
impl VoteRepository for PostgresVoteRepository {
    /// One transaction: lock the post row, read the existing vote, apply the
    /// transition, then write both the vote row and the new total.
    async fn cast_vote(
        &self,
        user_id: UserId,
        post_id: PostId,
        direction: VoteDirection,
    ) -> Result<VoteOutcome, RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let post = PostEntity::find_by_id(post_id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(map_db_err)?
            .ok_or(RepoError::NotFound)?;

        let existing = VoteEntity::find_by_id((user_id, post_id))
            .one(&txn)
            .await
            .map_err(map_db_err)?;
        let current = match &existing {
            Some(row) => UserVote::from(row.direction()?),
            None => UserVote::Unvoted,
        };

        let outcome = apply_vote(current, post.vote_total, direction);
        let now = Utc::now();

        match (existing, outcome.new_user_vote.direction()) {
            (Some(_), None) => {
                VoteEntity::delete_by_id((user_id, post_id))
                    .exec(&txn)
                    .await
                    .map_err(map_db_err)?;
            }
            (Some(row), Some(new_direction)) => {
                let mut active = row.into_active_model();
                active.value = Set(i8::from(new_direction).into());
                active.updated_at = Set(now.into());
                active.update(&txn).await.map_err(map_db_err)?;
            }
            (None, Some(new_direction)) => {
                vote::ActiveModel::from(Vote::new(user_id, post_id, new_direction))
                    .insert(&txn)
                    .await
                    .map_err(map_db_err)?;
            }
            (None, None) => {}
        }

        let mut active_post = post.into_active_model();
        active_post.vote_total = Set(outcome.new_total);
        active_post.update(&txn).await.map_err(map_db_err)?;

        txn.commit().await.map_err(map_db_err)?;

        tracing::debug!(
            user_id = %user_id,
            post_id = %post_id,
            total = outcome.new_total,
            "Vote stored"
        );
        Ok(outcome)
    }

    async fn find_vote(&self, user_id: UserId, post_id: PostId) -> Result<Option<Vote>, RepoError> {
        VoteEntity::find_by_id((user_id, post_id))
            .one(&self.db)
            .await
            .map_err(map_db_err)?
            .map(Vote::try_from)
            .transpose()
    }

    async fn find_votes_by_user(
        &self,
        user_id: UserId,
    ) -> Result<HashMap<PostId, UserVote>, RepoError> {
        let rows = VoteEntity::find()
            .filter(vote::Column::UserId.eq(user_id))
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        rows.into_iter()
            .map(|row| Ok((row.post_id, UserVote::from(row.direction()?))))
            .collect()
    }
}

#[async_trait]
impl SavedPostRepository for PostgresSavedPostRepository {
    async fn save(&self, entry: SavedPost) -> Result<(), RepoError> {
        SavedPostEntity::insert(saved_post::ActiveModel::from(entry))
            .on_conflict(
                OnConflict::columns([saved_post::Column::UserId, saved_post::Column::PostId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(())
    }

    async fn remove(&self, user_id: UserId, post_id: PostId) -> Result<bool, RepoError> {
        let result = SavedPostEntity::delete_by_id((user_id, post_id))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected > 0)
    }

    async fn is_saved(&self, user_id: UserId, post_id: PostId) -> Result<bool, RepoError> {
        let found = SavedPostEntity::find_by_id((user_id, post_id))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(found.is_some())
    }

    async fn list_post_ids(&self, user_id: UserId) -> Result<Vec<PostId>, RepoError> {
        let rows = SavedPostEntity::find()
            .filter(saved_post::Column::UserId.eq(user_id))
            .order_by_desc(saved_post::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(rows.into_iter().map(|row| row.post_id).collect())
    }
}

#[async_trait]
impl FriendshipRepository for PostgresFriendshipRepository {
    async fn add(&self, friendship: Friendship) -> Result<(), RepoError> {
        friendship::ActiveModel::from(friendship)
            .insert(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(())
    }

    async fn remove(&self, user_id: UserId, friend_id: UserId) -> Result<bool, RepoError> {
        let result = FriendshipEntity::delete_by_id((user_id, friend_id))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected > 0)
    }

    async fn exists(&self, user_id: UserId, friend_id: UserId) -> Result<bool, RepoError> {
        let found = FriendshipEntity::find_by_id((user_id, friend_id))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(found.is_some())
    }

    async fn list_friend_ids(&self, user_id: UserId) -> Result<Vec<UserId>, RepoError> {
        let rows = FriendshipEntity::find()
            .filter(friendship::Column::UserId.eq(user_id))
            .order_by_desc(friendship::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(rows.into_iter().map(|row| row.friend_id).collect())
    }
}

#[cfg(test)]
mod helper_tests {
    use super::*;

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("alice@example.com"), "a***@example.com");
        assert_eq!(mask_email("a@example.com"), "***@example.com");
        assert_eq!(mask_email("not-an-email"), "***");
    }
}
