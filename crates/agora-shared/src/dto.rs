//! Data Transfer Objects - request/response types for the API.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to register a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Request to login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response containing the caller's own account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub created_at: String,
}

/// Response containing authentication tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Author fields shown next to posts and comments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorResponse {
    pub id: String,
    pub username: String,
    pub avatar_url: Option<String>,
}

/// A public profile: the user plus the posts they wrote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub id: String,
    pub username: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub created_at: String,
    pub posts: Vec<PostResponse>,
}

/// Partial profile update. Absent fields are left alone; `null` clears.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    #[serde(default, with = "double_option")]
    pub bio: Option<Option<String>>,
    #[serde(default, with = "double_option")]
    pub avatar_ref: Option<Option<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// Key returned by `POST /api/media`.
    pub image_ref: Option<String>,
}

/// Partial post update. `image_ref: null` removes the image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(default, with = "double_option")]
    pub image_ref: Option<Option<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: String,
    pub title: String,
    pub content: String,
    pub slug: String,
    pub image_ref: Option<String>,
    pub image_url: Option<String>,
    pub vote_total: i64,
    pub author: AuthorResponse,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListPostsQuery {
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPostsQuery {
    pub q: String,
    pub limit: Option<u64>,
}

/// `q` matches usernames by substring and emails exactly; absent lists everyone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchUsersQuery {
    pub q: Option<String>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
    /// Reply target on the same post; absent for a top-level comment.
    pub parent_id: Option<Uuid>,
}

/// A comment with its replies, oldest first at every level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: String,
    pub post_id: String,
    pub parent_id: Option<String>,
    pub content: String,
    pub author: AuthorResponse,
    pub created_at: String,
    pub replies: Vec<CommentResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteCommentResponse {
    pub deleted: Vec<String>,
}

/// `value` is 1 for an upvote and -1 for a downvote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRequest {
    pub value: i8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteResponse {
    pub post_id: String,
    pub total: i64,
    /// 1, -1, or 0 when the user has no vote on the post.
    pub user_vote: i8,
}

/// Every post the caller has voted on, keyed by post id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserVotesResponse {
    pub votes: HashMap<String, i8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveResponse {
    pub post_id: String,
    pub saved: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendResponse {
    pub friend_id: String,
    pub friends: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaUploadResponse {
    pub image_ref: String,
    pub url: String,
}

/// Distinguishes an absent field from an explicit `null`.
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S, T>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_post_distinguishes_null_from_absent() {
        let absent: UpdatePostRequest = serde_json::from_str(r#"{"title":"x"}"#).unwrap();
        assert_eq!(absent.image_ref, None);

        let cleared: UpdatePostRequest = serde_json::from_str(r#"{"image_ref":null}"#).unwrap();
        assert_eq!(cleared.image_ref, Some(None));

        let set: UpdatePostRequest = serde_json::from_str(r#"{"image_ref":"k"}"#).unwrap();
        assert_eq!(set.image_ref, Some(Some("k".to_string())));
    }

    #[test]
    fn test_comment_request_parent_is_optional() {
        let top: CreateCommentRequest = serde_json::from_str(r#"{"content":"hi"}"#).unwrap();
        assert!(top.parent_id.is_none());
    }
}
