//! Threaded comments: listing as a forest, replying, and cascading deletes.

use std::sync::Arc;

use super::authors::Authors;
use crate::comment_tree::{
    CommentNode, DeleteAuthority, authorize_delete, build_tree_capped, plan_cascading_delete_ordered,
    thread_depth,
};
use crate::domain::{Comment, CommentId, CommentView, Post, PostId, UserId};
use crate::error::{DomainError, RepoError};
use crate::ports::{CommentRepository, PostRepository, UserRepository};

pub const MAX_COMMENT_LEN: usize = 10_000;

/// Longest root-to-reply path a thread may have, the root included.
pub const MAX_REPLY_DEPTH: usize = 32;

/// How a cascading delete was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStrategy {
    /// The store removed the subtree in one atomic step.
    StoreCascade,
    /// The store deleted the planned id set.
    PlannedIds,
}

/// What a delete removed and on whose authority.
#[derive(Debug, Clone)]
pub struct DeletionReport {
    /// Every planned id, leaves first.
    pub removed: Vec<CommentId>,
    pub authority: DeleteAuthority,
    pub strategy: DeleteStrategy,
}

#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
}

impl CommentService {
    pub fn new(
        comments: Arc<dyn CommentRepository>,
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            comments,
            posts,
            users,
        }
    }

    /// All comments on a post as a display forest.
    pub async fn list_tree(
        &self,
        post_id: PostId,
    ) -> Result<Vec<CommentNode<CommentView>>, DomainError> {
        self.load_post(post_id).await?;

        let comments = self.comments.find_by_post(post_id).await?;
        let authors = Authors::load(self.users.as_ref(), comments.iter().map(|c| c.author_id)).await;

        let views = comments
            .into_iter()
            .map(|comment| CommentView {
                author: authors.get(comment.author_id),
                comment,
            })
            .collect();
        Ok(build_tree_capped(views, MAX_REPLY_DEPTH))
    }

    /// Comment on a post, or reply to `parent_id` on the same post.
    pub async fn create(
        &self,
        post_id: PostId,
        author_id: UserId,
        content: &str,
        parent_id: Option<CommentId>,
    ) -> Result<CommentView, DomainError> {
        let content = validate_content(content)?;
        self.load_post(post_id).await?;

        if let Some(parent_id) = parent_id {
            let parent = self
                .comments
                .find_by_id(parent_id)
                .await?
                .ok_or_else(|| DomainError::not_found("Comment", parent_id))?;
            if parent.post_id != post_id {
                return Err(DomainError::Validation(
                    "Parent comment belongs to a different post".to_string(),
                ));
            }

            let thread = self.comments.find_by_post(post_id).await?;
            if thread_depth(&thread, parent_id) >= MAX_REPLY_DEPTH {
                return Err(DomainError::Validation(format!(
                    "Replies may nest at most {MAX_REPLY_DEPTH} levels deep"
                )));
            }
        }

        let comment = self
            .comments
            .create(Comment::new(post_id, author_id, content, parent_id))
            .await?;
        tracing::info!(comment_id = %comment.id, post_id = %post_id, "Comment created");

        let authors = Authors::load(self.users.as_ref(), [author_id]).await;
        Ok(CommentView {
            author: authors.get(author_id),
            comment,
        })
    }

    /// Delete a comment and every reply beneath it.
    ///
    /// Allowed for the comment's author and for the author of the post.
    pub async fn delete(
        &self,
        comment_id: CommentId,
        requester: UserId,
    ) -> Result<DeletionReport, DomainError> {
        let comment = self
            .comments
            .find_by_id(comment_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Comment", comment_id))?;
        let post = self.load_post(comment.post_id).await?;
        let authority = authorize_delete(&comment, &post, requester)?;

        let snapshot = self.comments.find_by_post(post.id).await?;
        let planned = plan_cascading_delete_ordered(&snapshot, comment_id);

        let strategy = match self.comments.delete_subtree(comment_id).await {
            Ok(_) => DeleteStrategy::StoreCascade,
            Err(RepoError::Unsupported(op)) => {
                tracing::debug!(op, planned = planned.len(), "Falling back to planned delete");
                let deleted = self.comments.delete_many(&planned).await?;
                if deleted != planned.len() as u64 {
                    tracing::warn!(
                        planned = planned.len(),
                        deleted,
                        "Comment set changed between snapshot and delete"
                    );
                }
                DeleteStrategy::PlannedIds
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            comment_id = %comment_id,
            removed = planned.len(),
            ?authority,
            "Comment thread deleted"
        );

        Ok(DeletionReport {
            removed: planned,
            authority,
            strategy,
        })
    }

    async fn load_post(&self, post_id: PostId) -> Result<Post, DomainError> {
        self.posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", post_id))
    }
}

fn validate_content(content: &str) -> Result<String, DomainError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(DomainError::Validation(
            "Comment must not be empty".to_string(),
        ));
    }
    if content.chars().count() > MAX_COMMENT_LEN {
        return Err(DomainError::Validation(format!(
            "Comment must be at most {MAX_COMMENT_LEN} characters"
        )));
    }
    Ok(content.to_string())
}
