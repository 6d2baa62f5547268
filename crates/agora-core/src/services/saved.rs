//! Saved-post bookmarks.

use std::sync::Arc;

use super::posts::PostService;
use crate::domain::{PostId, PostView, SavedPost, UserId};
use crate::error::DomainError;
use crate::ports::{PostRepository, SavedPostRepository};

#[derive(Clone)]
pub struct SavedPostService {
    saved: Arc<dyn SavedPostRepository>,
    posts: Arc<dyn PostRepository>,
    post_service: PostService,
}

impl SavedPostService {
    pub fn new(
        saved: Arc<dyn SavedPostRepository>,
        posts: Arc<dyn PostRepository>,
        post_service: PostService,
    ) -> Self {
        Self {
            saved,
            posts,
            post_service,
        }
    }

    /// Saving an already saved post is a no-op.
    pub async fn save(&self, user_id: UserId, post_id: PostId) -> Result<(), DomainError> {
        if self.posts.find_by_id(post_id).await?.is_none() {
            return Err(DomainError::not_found("Post", post_id));
        }
        self.saved.save(SavedPost::new(user_id, post_id)).await?;
        Ok(())
    }

    /// Returns whether the post had been saved.
    pub async fn unsave(&self, user_id: UserId, post_id: PostId) -> Result<bool, DomainError> {
        Ok(self.saved.remove(user_id, post_id).await?)
    }

    pub async fn is_saved(&self, user_id: UserId, post_id: PostId) -> Result<bool, DomainError> {
        Ok(self.saved.is_saved(user_id, post_id).await?)
    }

    /// Saved posts, most recently saved first.
    pub async fn list_saved(&self, user_id: UserId) -> Result<Vec<PostView>, DomainError> {
        let ids = self.saved.list_post_ids(user_id).await?;
        self.post_service.list_by_ids(&ids).await
    }
}
