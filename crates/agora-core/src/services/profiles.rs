//! Public profiles and self-service profile edits.

use std::sync::Arc;

use chrono::Utc;

use super::posts::PostService;
use crate::domain::{PostView, User, UserId, validate_username};
use crate::error::DomainError;
use crate::ports::UserRepository;

const MAX_BIO_LEN: usize = 500;

/// A user together with the posts they wrote, newest first.
#[derive(Debug, Clone)]
pub struct Profile {
    pub user: User,
    pub posts: Vec<PostView>,
}

/// Partial profile update. `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub username: Option<String>,
    pub bio: Option<Option<String>>,
    pub avatar_ref: Option<Option<String>>,
}

#[derive(Clone)]
pub struct ProfileService {
    users: Arc<dyn UserRepository>,
    post_service: PostService,
}

impl ProfileService {
    pub fn new(users: Arc<dyn UserRepository>, post_service: PostService) -> Self {
        Self {
            users,
            post_service,
        }
    }

    pub async fn get_profile(&self, user_id: UserId) -> Result<Profile, DomainError> {
        let user = self.load(user_id).await?;
        let posts = self.post_service.list_by_author(user_id).await?;
        Ok(Profile { user, posts })
    }

    /// Users matching `query`, or everyone when it is blank.
    pub async fn find_users(
        &self,
        query: Option<&str>,
        limit: u64,
    ) -> Result<Vec<User>, DomainError> {
        match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(query) => {
                let users = self.users.search(query, limit).await?;
                tracing::debug!(query, hits = users.len(), "User search");
                Ok(users)
            }
            None => Ok(self.users.list(limit).await?),
        }
    }

    pub async fn update_profile(
        &self,
        user_id: UserId,
        changes: ProfileChanges,
    ) -> Result<User, DomainError> {
        let mut user = self.load(user_id).await?;

        if let Some(username) = changes.username {
            let username = username.trim().to_string();
            validate_username(&username)?;
            if username != user.username {
                if let Some(other) = self.users.find_by_username(&username).await? {
                    if other.id != user_id {
                        return Err(DomainError::Duplicate(format!(
                            "Username '{username}' is taken"
                        )));
                    }
                }
                user.username = username;
            }
        }
        if let Some(bio) = changes.bio {
            let bio = bio.map(|b| b.trim().to_string()).filter(|b| !b.is_empty());
            if bio.as_ref().is_some_and(|b| b.chars().count() > MAX_BIO_LEN) {
                return Err(DomainError::Validation(format!(
                    "Bio must be at most {MAX_BIO_LEN} characters"
                )));
            }
            user.bio = bio;
        }
        if let Some(avatar_ref) = changes.avatar_ref {
            user.avatar_ref = avatar_ref;
        }
        user.updated_at = Utc::now();

        let saved = self.users.update(user).await?;
        tracing::info!(user_id = %user_id, "Profile updated");
        Ok(saved)
    }

    async fn load(&self, user_id: UserId) -> Result<User, DomainError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", user_id))
    }
}
