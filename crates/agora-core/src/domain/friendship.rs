use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::UserId;

/// `user_id` follows `friend_id`. The reverse link is a separate row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Friendship {
    pub user_id: UserId,
    pub friend_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl Friendship {
    pub fn new(user_id: UserId, friend_id: UserId) -> Self {
        Self {
            user_id,
            friend_id,
            created_at: Utc::now(),
        }
    }
}
