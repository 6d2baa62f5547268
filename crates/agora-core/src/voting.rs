//! Vote aggregation.
//!
//! `apply_vote` is the optimistic computation a caller can show before the
//! store answers. The store runs the same transition under its own lock and
//! its answer always wins; see [`reconcile`].

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::domain::{PostId, UserId, UserVote, VoteDirection};

/// Result of applying a vote: the post's new total and the user's new standing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteOutcome {
    pub new_total: i64,
    pub new_user_vote: UserVote,
}

/// Apply `requested` on top of the user's `current` vote.
///
/// - same direction again: the vote is withdrawn
/// - no vote yet: the vote is recorded
/// - opposite direction: the vote flips, moving the total by two
pub fn apply_vote(current: UserVote, current_total: i64, requested: VoteDirection) -> VoteOutcome {
    match current.direction() {
        Some(direction) if direction == requested => VoteOutcome {
            new_total: current_total - requested.value(),
            new_user_vote: UserVote::Unvoted,
        },
        None => VoteOutcome {
            new_total: current_total + requested.value(),
            new_user_vote: requested.into(),
        },
        Some(previous) => VoteOutcome {
            new_total: current_total - previous.value() + requested.value(),
            new_user_vote: requested.into(),
        },
    }
}

/// The value to display after the authoritative answer arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciled {
    pub outcome: VoteOutcome,
    /// The optimistic guess differed, e.g. because another vote landed first.
    pub diverged: bool,
}

/// The authoritative outcome always replaces the optimistic one.
pub fn reconcile(optimistic: VoteOutcome, authoritative: VoteOutcome) -> Reconciled {
    Reconciled {
        outcome: authoritative,
        diverged: optimistic != authoritative,
    }
}

/// Tracks (user, post) pairs with a vote in flight.
///
/// Clones share the same set.
#[derive(Debug, Clone, Default)]
pub struct InFlightVotes {
    pending: Arc<Mutex<HashSet<(UserId, PostId)>>>,
}

impl InFlightVotes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the pair, or `None` if a vote for it is already being applied.
    pub fn try_begin(&self, user_id: UserId, post_id: PostId) -> Option<VoteGuard> {
        let inserted = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((user_id, post_id));

        inserted.then(|| VoteGuard {
            pending: Arc::clone(&self.pending),
            key: (user_id, post_id),
        })
    }

    pub fn is_pending(&self, user_id: UserId, post_id: PostId) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(user_id, post_id))
    }
}

/// Releases its (user, post) pair when dropped.
#[derive(Debug)]
pub struct VoteGuard {
    pending: Arc<Mutex<HashSet<(UserId, PostId)>>>,
    key: (UserId, PostId),
}

impl Drop for VoteGuard {
    fn drop(&mut self) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    use crate::domain::VoteDirection::{Down, Up};

    #[test]
    fn test_first_vote() {
        let outcome = apply_vote(UserVote::Unvoted, 10, Up);
        assert_eq!(outcome.new_total, 11);
        assert_eq!(outcome.new_user_vote, UserVote::Upvoted);

        let outcome = apply_vote(UserVote::Unvoted, 10, Down);
        assert_eq!(outcome.new_total, 9);
        assert_eq!(outcome.new_user_vote, UserVote::Downvoted);
    }

    #[test]
    fn test_same_direction_twice_returns_to_start() {
        for total in [-7, 0, 3, 1_000] {
            for direction in [Up, Down] {
                let first = apply_vote(UserVote::Unvoted, total, direction);
                let second = apply_vote(first.new_user_vote, first.new_total, direction);
                assert_eq!(
                    second,
                    VoteOutcome {
                        new_total: total,
                        new_user_vote: UserVote::Unvoted
                    }
                );
            }
        }
    }

    #[test]
    fn test_switching_direction_moves_total_by_two() {
        for total in [-3, 0, 42] {
            assert_eq!(
                apply_vote(UserVote::Upvoted, total, Down),
                VoteOutcome {
                    new_total: total - 2,
                    new_user_vote: UserVote::Downvoted
                }
            );
            assert_eq!(
                apply_vote(UserVote::Downvoted, total, Up),
                VoteOutcome {
                    new_total: total + 2,
                    new_user_vote: UserVote::Upvoted
                }
            );
        }
    }

    #[test]
    fn test_concrete_vote_sequence() {
        let outcome = apply_vote(UserVote::Unvoted, 5, Up);
        assert_eq!((outcome.new_total, outcome.new_user_vote), (6, UserVote::Upvoted));

        let outcome = apply_vote(outcome.new_user_vote, outcome.new_total, Up);
        assert_eq!((outcome.new_total, outcome.new_user_vote), (5, UserVote::Unvoted));

        let outcome = apply_vote(outcome.new_user_vote, outcome.new_total, Down);
        assert_eq!((outcome.new_total, outcome.new_user_vote), (4, UserVote::Downvoted));
    }

    #[test]
    fn test_authoritative_value_wins() {
        let optimistic = apply_vote(UserVote::Unvoted, 5, Up);
        let authoritative = VoteOutcome {
            new_total: 9,
            new_user_vote: UserVote::Upvoted,
        };

        let reconciled = reconcile(optimistic, authoritative);
        assert_eq!(reconciled.outcome, authoritative);
        assert!(reconciled.diverged);

        let reconciled = reconcile(optimistic, optimistic);
        assert!(!reconciled.diverged);
    }

    #[test]
    fn test_in_flight_guard_blocks_same_pair() {
        let in_flight = InFlightVotes::new();
        let user = Uuid::new_v4();
        let post = Uuid::new_v4();

        let guard = in_flight.try_begin(user, post).unwrap();
        assert!(in_flight.is_pending(user, post));
        assert!(in_flight.try_begin(user, post).is_none());
        assert!(in_flight.try_begin(user, Uuid::new_v4()).is_some());

        drop(guard);
        assert!(!in_flight.is_pending(user, post));
        assert!(in_flight.clone().try_begin(user, post).is_some());
    }
}
