//! Application services - orchestrate the pure core over the ports.
//!
//! Each service owns `Arc` handles to the ports it needs and is cheap to
//! clone into request handlers.

mod authors;
mod comments;
mod friends;
mod posts;
mod profiles;
mod saved;
mod votes;

pub use comments::{
    CommentService, DeleteStrategy, DeletionReport, MAX_COMMENT_LEN, MAX_REPLY_DEPTH,
};
pub use friends::FriendService;
pub use posts::{MAX_TITLE_LEN, NewPost, PostChanges, PostService};
pub use profiles::{Profile, ProfileChanges, ProfileService};
pub use saved::SavedPostService;
pub use votes::VoteService;
