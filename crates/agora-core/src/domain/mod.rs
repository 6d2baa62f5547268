//! Domain entities - the core business objects.

mod comment;
mod friendship;
mod post;
mod saved;
mod user;
mod vote;

pub use comment::{Comment, CommentId, CommentView};
pub use friendship::Friendship;
pub use post::{Post, PostId, PostView};
pub use saved::SavedPost;
pub use user::{AuthorSummary, User, UserId, validate_username};
pub use vote::{UserVote, Vote, VoteDirection};
