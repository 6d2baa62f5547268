//! # Agora Core
//!
//! The domain layer of Agora.
//! This crate contains pure business logic with zero infrastructure dependencies:
//! the comment tree builder, the vote aggregator, slug derivation, the ports
//! that infrastructure must implement, and the services that orchestrate them.

pub mod comment_tree;
pub mod domain;
pub mod error;
pub mod ports;
pub mod services;
pub mod slug;
pub mod voting;

pub use error::{DomainError, RepoError};
