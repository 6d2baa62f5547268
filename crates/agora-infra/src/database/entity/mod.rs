//! SeaORM entities. Each converts to and from its domain record.

pub mod comment;
pub mod friendship;
pub mod post;
pub mod saved_post;
pub mod user;
pub mod vote;
