//! Application state - shared across all handlers.

use std::sync::Arc;

use agora_core::ports::{
    CommentRepository, FriendshipRepository, MediaStorage, PasswordService, PostRepository,
    SavedPostRepository, TokenService, UserRepository, VoteRepository,
};
use agora_core::services::{
    CommentService, FriendService, PostService, ProfileService, SavedPostService, VoteService,
};
use agora_infra::{
    Argon2PasswordService, InMemoryStore, JwtConfig, JwtTokenService, LocalMediaStorage,
    MediaConfig,
};

#[cfg(feature = "postgres")]
use agora_infra::DatabaseConnections;
#[cfg(feature = "postgres")]
use agora_infra::database::{
    PostgresCommentRepository, PostgresFriendshipRepository, PostgresPostRepository,
    PostgresSavedPostRepository, PostgresUserRepository, PostgresVoteRepository,
};

use crate::config::AppConfig;

/// One handle per port; either all Postgres or all in-memory.
struct Repositories {
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    votes: Arc<dyn VoteRepository>,
    saved: Arc<dyn SavedPostRepository>,
    friendships: Arc<dyn FriendshipRepository>,
}

impl Repositories {
    fn in_memory() -> Self {
        let store = InMemoryStore::new();
        Self {
            users: Arc::new(store.users()),
            posts: Arc::new(store.posts()),
            comments: Arc::new(store.comments()),
            votes: Arc::new(store.votes()),
            saved: Arc::new(store.saved_posts()),
            friendships: Arc::new(store.friendships()),
        }
    }

    #[cfg(feature = "postgres")]
    fn postgres(db: &DatabaseConnections) -> Self {
        Self {
            users: Arc::new(PostgresUserRepository::new(db.main.clone())),
            posts: Arc::new(PostgresPostRepository::new(db.main.clone())),
            comments: Arc::new(PostgresCommentRepository::new(db.main.clone())),
            votes: Arc::new(PostgresVoteRepository::new(db.main.clone())),
            saved: Arc::new(PostgresSavedPostRepository::new(db.main.clone())),
            friendships: Arc::new(PostgresFriendshipRepository::new(db.main.clone())),
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: PostService,
    pub comments: CommentService,
    pub votes: VoteService,
    pub profiles: ProfileService,
    pub saved: SavedPostService,
    pub friends: FriendService,
    pub users: Arc<dyn UserRepository>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub media: Arc<dyn MediaStorage>,
    pub max_upload_bytes: usize,
    #[cfg(feature = "postgres")]
    pub db: Option<Arc<DatabaseConnections>>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        #[cfg(feature = "postgres")]
        let (db, repos) = match &config.database {
            Some(db_config) => match DatabaseConnections::init(db_config).await {
                Ok(connections) => {
                    let repos = Repositories::postgres(&connections);
                    (Some(Arc::new(connections)), repos)
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to connect to database: {}. Using in-memory fallback.",
                        e
                    );
                    (None, Repositories::in_memory())
                }
            },
            None => {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
                (None, Repositories::in_memory())
            }
        };

        #[cfg(not(feature = "postgres"))]
        let repos = {
            if config.database.is_some() {
                tracing::warn!("DATABASE_URL ignored: built without the postgres feature");
            }
            tracing::info!("Running without postgres feature - using in-memory repositories");
            Repositories::in_memory()
        };

        #[allow(unused_mut)]
        let mut state = Self::assemble(repos, config.jwt.clone(), config.media.clone());
        #[cfg(feature = "postgres")]
        {
            state.db = db;
        }

        tracing::info!(backend = state.storage_backend(), "Application state initialized");
        state
    }

    /// In-memory state, used by handler tests.
    #[cfg(test)]
    pub fn in_memory(jwt: JwtConfig, media: MediaConfig) -> Self {
        Self::assemble(Repositories::in_memory(), jwt, media)
    }

    fn assemble(repos: Repositories, jwt: JwtConfig, media: MediaConfig) -> Self {
        let posts = PostService::new(repos.posts.clone(), repos.users.clone());
        let comments =
            CommentService::new(repos.comments, repos.posts.clone(), repos.users.clone());
        let votes = VoteService::new(repos.votes, repos.posts.clone());
        let profiles = ProfileService::new(repos.users.clone(), posts.clone());
        let saved = SavedPostService::new(repos.saved, repos.posts, posts.clone());
        let friends = FriendService::new(repos.friendships, repos.users.clone());

        Self {
            posts,
            comments,
            votes,
            profiles,
            saved,
            friends,
            users: repos.users,
            tokens: Arc::new(JwtTokenService::new(jwt)),
            passwords: Arc::new(Argon2PasswordService::new()),
            max_upload_bytes: media.max_bytes,
            media: Arc::new(LocalMediaStorage::new(media)),
            #[cfg(feature = "postgres")]
            db: None,
        }
    }

    /// Which store backs the repositories.
    pub fn storage_backend(&self) -> &'static str {
        #[cfg(feature = "postgres")]
        if self.db.is_some() {
            return "postgres";
        }
        "memory"
    }
}
