use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::post::PostId;
use super::user::UserId;

/// A bookmark of a post by a user. At most one per (user, post).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedPost {
    pub user_id: UserId,
    pub post_id: PostId,
    pub created_at: DateTime<Utc>,
}

impl SavedPost {
    pub fn new(user_id: UserId, post_id: PostId) -> Self {
        Self {
            user_id,
            post_id,
            created_at: Utc::now(),
        }
    }
}
