//! Database connection management and the PostgreSQL repositories.

mod connections;

#[cfg(feature = "postgres")]
mod errors;
#[cfg(feature = "postgres")]
mod postgres_base;
#[cfg(feature = "postgres")]
pub mod postgres_repo;

#[cfg(feature = "postgres")]
pub mod entity;

pub use connections::DatabaseConfig;

#[cfg(feature = "postgres")]
pub use connections::DatabaseConnections;

#[cfg(feature = "postgres")]
pub use postgres_repo::{
    PostgresCommentRepository, PostgresFriendshipRepository, PostgresPostRepository,
    PostgresSavedPostRepository, PostgresUserRepository, PostgresVoteRepository,
};

#[cfg(feature = "postgres")]
#[cfg(test)]
mod tests;
