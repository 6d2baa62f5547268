//! One-directional friend lists.

use std::sync::Arc;

use crate::domain::{Friendship, User, UserId};
use crate::error::{DomainError, RepoError};
use crate::ports::{FriendshipRepository, UserRepository};

#[derive(Clone)]
pub struct FriendService {
    friends: Arc<dyn FriendshipRepository>,
    users: Arc<dyn UserRepository>,
}

impl FriendService {
    pub fn new(friends: Arc<dyn FriendshipRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { friends, users }
    }

    /// Add `friend_id` to the friend list of `user_id`.
    pub async fn add_friend(&self, user_id: UserId, friend_id: UserId) -> Result<(), DomainError> {
        if user_id == friend_id {
            return Err(DomainError::Validation(
                "You cannot add yourself as a friend".to_string(),
            ));
        }
        self.load(friend_id).await?;
        if self.friends.exists(user_id, friend_id).await? {
            return Err(already_friends());
        }

        match self.friends.add(Friendship::new(user_id, friend_id)).await {
            Ok(()) => {}
            Err(RepoError::Constraint(msg)) => {
                // Lost a race with an identical request
                if self.friends.exists(user_id, friend_id).await? {
                    return Err(already_friends());
                }
                return Err(RepoError::Constraint(msg).into());
            }
            Err(e) => return Err(e.into()),
        }
        tracing::info!(user_id = %user_id, friend_id = %friend_id, "Friend added");
        Ok(())
    }

    /// Returns whether `friend_id` was on the list.
    pub async fn remove_friend(
        &self,
        user_id: UserId,
        friend_id: UserId,
    ) -> Result<bool, DomainError> {
        let removed = self.friends.remove(user_id, friend_id).await?;
        if removed {
            tracing::info!(user_id = %user_id, friend_id = %friend_id, "Friend removed");
        }
        Ok(removed)
    }

    /// Friends of `user_id`, most recently added first.
    pub async fn list_friends(&self, user_id: UserId) -> Result<Vec<User>, DomainError> {
        self.load(user_id).await?;
        let ids = self.friends.list_friend_ids(user_id).await?;
        let mut users = self.users.find_many(&ids).await?;
        users.sort_by_key(|user| ids.iter().position(|id| *id == user.id));
        Ok(users)
    }

    async fn load(&self, user_id: UserId) -> Result<User, DomainError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", user_id))
    }
}

fn already_friends() -> DomainError {
    DomainError::Duplicate("You are already friends with this user".to_string())
}
