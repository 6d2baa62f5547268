//! Post lifecycle: creation with slug assignment, author-only edits and deletes.

use std::sync::Arc;

use chrono::Utc;

use super::authors::Authors;
use crate::domain::{Post, PostId, PostView, UserId};
use crate::error::DomainError;
use crate::ports::{PostRepository, UserRepository};
use crate::slug::{slugify, with_unique_suffix};

pub const MAX_TITLE_LEN: usize = 300;

const SLUG_ATTEMPTS: i64 = 5;

/// Input for a new post.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub image_ref: Option<String>,
}

/// Partial update. `image_ref: Some(None)` removes the image.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image_ref: Option<Option<String>>,
}

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { posts, users }
    }

    pub async fn create(&self, author_id: UserId, input: NewPost) -> Result<PostView, DomainError> {
        let title = validate_title(&input.title)?;
        let slug = self.assign_slug(&title).await?;

        let post = Post::new(author_id, title, input.content, slug, input.image_ref);
        let saved = self.posts.create(post).await?;
        tracing::info!(post_id = %saved.id, slug = %saved.slug, "Post created");

        self.view(saved).await
    }

    /// Only the author may edit. The slug is never regenerated.
    pub async fn update(
        &self,
        post_id: PostId,
        requester: UserId,
        changes: PostChanges,
    ) -> Result<PostView, DomainError> {
        let mut post = self.load_owned(post_id, requester, "edit").await?;

        if let Some(title) = changes.title {
            post.title = validate_title(&title)?;
        }
        if let Some(content) = changes.content {
            post.content = content;
        }
        if let Some(image_ref) = changes.image_ref {
            post.image_ref = image_ref;
        }
        post.updated_at = Utc::now();

        let saved = self.posts.update(post).await?;
        self.view(saved).await
    }

    /// Only the author may delete; the store cascades comments, votes and saves.
    pub async fn delete(&self, post_id: PostId, requester: UserId) -> Result<(), DomainError> {
        self.load_owned(post_id, requester, "delete").await?;
        self.posts.delete(post_id).await?;
        tracing::info!(post_id = %post_id, "Post deleted");
        Ok(())
    }

    pub async fn get_by_id(&self, post_id: PostId) -> Result<PostView, DomainError> {
        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", post_id))?;
        self.view(post).await
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<PostView, DomainError> {
        let post = self
            .posts
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::not_found_by("Post", slug))?;
        self.view(post).await
    }

    pub async fn list_recent(&self, limit: u64) -> Result<Vec<PostView>, DomainError> {
        let posts = self.posts.list_recent(limit).await?;
        Ok(self.views(posts).await)
    }

    pub async fn list_by_author(&self, author_id: UserId) -> Result<Vec<PostView>, DomainError> {
        let posts = self.posts.find_by_author(author_id).await?;
        Ok(self.views(posts).await)
    }

    pub async fn list_by_ids(&self, ids: &[PostId]) -> Result<Vec<PostView>, DomainError> {
        let mut posts = self.posts.find_many(ids).await?;
        // Keep the caller's ordering, e.g. most recently saved first.
        posts.sort_by_key(|post| ids.iter().position(|id| *id == post.id));
        Ok(self.views(posts).await)
    }

    /// Case-insensitive title search.
    pub async fn search(&self, query: &str, limit: u64) -> Result<Vec<PostView>, DomainError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(DomainError::Validation(
                "Search query must not be empty".to_string(),
            ));
        }
        let posts = self.posts.search_title(query, limit).await?;
        tracing::debug!(query, hits = posts.len(), "Post search");
        Ok(self.views(posts).await)
    }

    async fn load_owned(
        &self,
        post_id: PostId,
        requester: UserId,
        action: &str,
    ) -> Result<Post, DomainError> {
        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", post_id))?;
        if !post.is_authored_by(requester) {
            return Err(DomainError::PermissionDenied(format!(
                "Only the author may {action} this post"
            )));
        }
        Ok(post)
    }

    async fn assign_slug(&self, title: &str) -> Result<String, DomainError> {
        let base = slugify(title);
        if !base.is_empty() && !self.posts.slug_exists(&base).await? {
            return Ok(base);
        }

        let millis = Utc::now().timestamp_millis();
        for offset in 0..SLUG_ATTEMPTS {
            let candidate = with_unique_suffix(&base, millis + offset);
            if !self.posts.slug_exists(&candidate).await? {
                tracing::debug!(base = %base, slug = %candidate, "Slug collision resolved");
                return Ok(candidate);
            }
        }
        Err(DomainError::Conflict(format!(
            "Could not find a free slug for '{base}'"
        )))
    }

    async fn view(&self, post: Post) -> Result<PostView, DomainError> {
        let authors = Authors::load(self.users.as_ref(), [post.author_id]).await;
        Ok(PostView {
            author: authors.get(post.author_id),
            post,
        })
    }

    async fn views(&self, posts: Vec<Post>) -> Vec<PostView> {
        let authors = Authors::load(self.users.as_ref(), posts.iter().map(|p| p.author_id)).await;
        posts
            .into_iter()
            .map(|post| PostView {
                author: authors.get(post.author_id),
                post,
            })
            .collect()
    }
}

fn validate_title(title: &str) -> Result<String, DomainError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(DomainError::Validation("Title must not be empty".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(DomainError::Validation(format!(
            "Title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(title.to_string())
}
