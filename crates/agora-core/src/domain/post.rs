use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::{AuthorSummary, UserId};

pub type PostId = Uuid;

/// Post entity - a titled submission, optionally carrying an image.
///
/// `slug` is derived from the title once, at creation, and never regenerated.
/// `vote_total` mirrors the sum of the stored votes; only the vote store's
/// atomic operation writes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub author_id: UserId,
    pub title: String,
    pub content: String,
    pub slug: String,
    pub image_ref: Option<String>,
    pub vote_total: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post with no votes.
    pub fn new(
        author_id: UserId,
        title: String,
        content: String,
        slug: String,
        image_ref: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author_id,
            title,
            content,
            slug,
            image_ref,
            vote_total: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_authored_by(&self, user_id: UserId) -> bool {
        self.author_id == user_id
    }
}

/// A post joined with its author's display fields.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub author: AuthorSummary,
}
