use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::post::PostId;
use super::user::UserId;
use crate::error::DomainError;

/// The direction of a cast vote: +1 or -1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    pub fn value(self) -> i64 {
        match self {
            VoteDirection::Up => 1,
            VoteDirection::Down => -1,
        }
    }
}

impl TryFrom<i8> for VoteDirection {
    type Error = DomainError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(VoteDirection::Up),
            -1 => Ok(VoteDirection::Down),
            other => Err(DomainError::Validation(format!(
                "Invalid vote value {other}. Must be 1 or -1"
            ))),
        }
    }
}

impl TryFrom<i16> for VoteDirection {
    type Error = DomainError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        i8::try_from(value)
            .map_err(|_| DomainError::Validation(format!("Invalid vote value {value}")))
            .and_then(VoteDirection::try_from)
    }
}

impl From<VoteDirection> for i8 {
    fn from(direction: VoteDirection) -> Self {
        match direction {
            VoteDirection::Up => 1,
            VoteDirection::Down => -1,
        }
    }
}

/// A user's standing vote on a post.
///
/// This is the state machine of a single (user, post) relationship; the only
/// transitions are the ones `voting::apply_vote` produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum UserVote {
    #[default]
    Unvoted,
    Upvoted,
    Downvoted,
}

impl UserVote {
    pub fn value(self) -> i64 {
        match self {
            UserVote::Unvoted => 0,
            UserVote::Upvoted => 1,
            UserVote::Downvoted => -1,
        }
    }

    pub fn direction(self) -> Option<VoteDirection> {
        match self {
            UserVote::Unvoted => None,
            UserVote::Upvoted => Some(VoteDirection::Up),
            UserVote::Downvoted => Some(VoteDirection::Down),
        }
    }
}

impl From<VoteDirection> for UserVote {
    fn from(direction: VoteDirection) -> Self {
        match direction {
            VoteDirection::Up => UserVote::Upvoted,
            VoteDirection::Down => UserVote::Downvoted,
        }
    }
}

impl From<Option<VoteDirection>> for UserVote {
    fn from(direction: Option<VoteDirection>) -> Self {
        direction.map(UserVote::from).unwrap_or_default()
    }
}

impl TryFrom<i8> for UserVote {
    type Error = DomainError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(UserVote::Unvoted),
            other => VoteDirection::try_from(other).map(UserVote::from),
        }
    }
}

impl From<UserVote> for i8 {
    fn from(vote: UserVote) -> Self {
        match vote {
            UserVote::Unvoted => 0,
            UserVote::Upvoted => 1,
            UserVote::Downvoted => -1,
        }
    }
}

/// A stored vote row, keyed by (user, post).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub user_id: UserId,
    pub post_id: PostId,
    pub direction: VoteDirection,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vote {
    pub fn new(user_id: UserId, post_id: PostId, direction: VoteDirection) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            post_id,
            direction,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_from_raw() {
        assert_eq!(VoteDirection::try_from(1i8).unwrap(), VoteDirection::Up);
        assert_eq!(VoteDirection::try_from(-1i16).unwrap(), VoteDirection::Down);
        assert!(VoteDirection::try_from(0i8).is_err());
        assert!(VoteDirection::try_from(2i8).is_err());
        assert!(VoteDirection::try_from(300i16).is_err());
    }

    #[test]
    fn test_user_vote_from_raw() {
        assert_eq!(UserVote::try_from(0i8).unwrap(), UserVote::Unvoted);
        assert_eq!(UserVote::try_from(-1i8).unwrap(), UserVote::Downvoted);
        assert!(UserVote::try_from(5i8).is_err());
    }

    #[test]
    fn test_serde_uses_integers() {
        assert_eq!(serde_json::to_string(&UserVote::Downvoted).unwrap(), "-1");
        let direction: VoteDirection = serde_json::from_str("1").unwrap();
        assert_eq!(direction, VoteDirection::Up);
        assert!(serde_json::from_str::<VoteDirection>("0").is_err());
    }
}
