use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::post::PostId;
use super::user::{AuthorSummary, UserId};
use crate::comment_tree::Threaded;

pub type CommentId = Uuid;

/// Comment entity. `parent_id` points at another comment on the same post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub author_id: UserId,
    pub parent_id: Option<CommentId>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(
        post_id: PostId,
        author_id: UserId,
        content: String,
        parent_id: Option<CommentId>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            post_id,
            author_id,
            parent_id,
            content,
            created_at: Utc::now(),
        }
    }
}

impl Threaded for Comment {
    fn id(&self) -> CommentId {
        self.id
    }

    fn parent_id(&self) -> Option<CommentId> {
        self.parent_id
    }

    fn post_id(&self) -> PostId {
        self.post_id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// A comment joined with its author's display fields.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: AuthorSummary,
}

impl Threaded for CommentView {
    fn id(&self) -> CommentId {
        self.comment.id
    }

    fn parent_id(&self) -> Option<CommentId> {
        self.comment.parent_id
    }

    fn post_id(&self) -> PostId {
        self.comment.post_id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.comment.created_at
    }
}
