//! In-memory repositories - used when no database is configured, and by tests.
//!
//! All repositories handed out by one [`InMemoryStore`] share a single set of
//! tables behind one async `RwLock`, so every write is atomic with respect to
//! every other. Foreign keys behave like the Postgres schema: deleting a post
//! removes its comments, votes and saves, and deleting a user removes their
//! friend links in both directions. Data is lost on process restart.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use agora_core::comment_tree::plan_cascading_delete;
use agora_core::domain::{
    Comment, CommentId, Friendship, Post, PostId, SavedPost, User, UserId, UserVote, Vote,
    VoteDirection,
};
use agora_core::error::RepoError;
use agora_core::ports::{
    BaseRepository, CommentRepository, FriendshipRepository, PostRepository, SavedPostRepository,
    UserRepository, VoteRepository,
};
use agora_core::voting::{VoteOutcome, apply_vote};


#[derive(Default)]
struct Tables {
    users: Vec<User>,
    /// Insertion order doubles as a tiebreak for equal timestamps.
    posts: Vec<Post>,
    comments: Vec<Comment>,
    votes: HashMap<(UserId, PostId), Vote>,
    saved: Vec<SavedPost>,
    friendships: Vec<Friendship>,
}

impl Tables {
    fn post_mut(&mut self, id: PostId) -> Option<&mut Post> {
        self.posts.iter_mut().find(|p| p.id == id)
    }

    fn remove_post(&mut self, id: PostId) -> bool {
        let before = self.posts.len();
        self.posts.retain(|p| p.id != id);
        if self.posts.len() == before {
            return false;
        }
        self.comments.retain(|c| c.post_id != id);
        self.votes.retain(|(_, post_id), _| *post_id != id);
        self.saved.retain(|s| s.post_id != id);
        true
    }

    fn remove_comments(&mut self, ids: &HashSet<CommentId>) -> u64 {
        let before = self.comments.len();
        self.comments.retain(|c| !ids.contains(&c.id));
        (before - self.comments.len()) as u64
    }

    fn remove_user(&mut self, id: UserId) -> bool {
        let before = self.users.len();
        self.users.retain(|u| u.id != id);
        if self.users.len() == before {
            return false;
        }

        let authored: Vec<PostId> = self
            .posts
            .iter()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in authored {
            self.remove_post(post_id);
        }

        let mut doomed = HashSet::new();
        for comment in self.comments.iter().filter(|c| c.author_id == id) {
            doomed.extend(plan_cascading_delete(&self.comments, comment.id));
        }
        self.remove_comments(&doomed);

        let cast: Vec<Vote> = self
            .votes
            .iter()
            .filter(|((user_id, _), _)| *user_id == id)
            .map(|(_, vote)| vote.clone())
            .collect();
        for vote in cast {
            self.votes.remove(&(vote.user_id, vote.post_id));
            if let Some(post) = self.post_mut(vote.post_id) {
                post.vote_total -= vote.direction.value();
            }
        }

        self.saved.retain(|s| s.user_id != id);
        self.friendships.retain(|f| f.user_id != id && f.friend_id != id);
        true
    }
}

/// Owner of the shared tables. Hand its repositories to the services.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> InMemoryUserRepository {
        InMemoryUserRepository {
            tables: Arc::clone(&self.tables),
        }
    }

    pub fn posts(&self) -> InMemoryPostRepository {
        InMemoryPostRepository {
            tables: Arc::clone(&self.tables),
        }
    }

    pub fn comments(&self) -> InMemoryCommentRepository {
        InMemoryCommentRepository {
            tables: Arc::clone(&self.tables),
        }
    }

    pub fn votes(&self) -> InMemoryVoteRepository {
        InMemoryVoteRepository {
            tables: Arc::clone(&self.tables),
        }
    }

    pub fn saved_posts(&self) -> InMemorySavedPostRepository {
        InMemorySavedPostRepository {
            tables: Arc::clone(&self.tables),
        }
    }

    pub fn friendships(&self) -> InMemoryFriendshipRepository {
        InMemoryFriendshipRepository {
            tables: Arc::clone(&self.tables),
        }
    }
}

/// Newest first; equal timestamps put the later insert first.
fn newest_first<'a>(posts: impl DoubleEndedIterator<Item = &'a Post>) -> Vec<Post> {
    let mut out: Vec<Post> = posts.rev().cloned().collect();
    out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    out
}

fn take<T>(rows: Vec<T>, limit: u64) -> Vec<T> {
    rows.into_iter()
        .take(usize::try_from(limit).unwrap_or(usize::MAX))
        .collect()
}

fn by_username<'a>(users: impl Iterator<Item = &'a User>) -> Vec<User> {
    let mut out: Vec<User> = users.cloned().collect();
    out.sort_by(|a, b| a.username.cmp(&b.username));
    out
}

#[derive(Clone)]
pub struct InMemoryUserRepository {
    tables: Arc<RwLock<Tables>>,
}

fn check_user_unique(tables: &Tables, user: &User) -> Result<(), RepoError> {
    for other in tables.users.iter().filter(|u| u.id != user.id) {
        if other.email == user.email {
            return Err(RepoError::Constraint("users.email must be unique".to_string()));
        }
        if other.username == user.username {
            return Err(RepoError::Constraint(
                "users.username must be unique".to_string(),
            ));
        }
    }
    Ok(())
}

#[async_trait]
impl BaseRepository<User, UserId> for InMemoryUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.id == user.id) {
            return Err(RepoError::Constraint("users.id must be unique".to_string()));
        }
        check_user_unique(&tables, &user)?;
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        check_user_unique(&tables, &user)?;
        let slot = tables
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(RepoError::NotFound)?;
        *slot = user.clone();
        Ok(user)
    }

    async fn delete(&self, id: UserId) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if tables.remove_user(id) {
            Ok(())
        } else {
            Err(RepoError::NotFound)
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn search(&self, query: &str, limit: u64) -> Result<Vec<User>, RepoError> {
        let needle = query.to_lowercase();
        let tables = self.tables.read().await;
        let hits = by_username(tables.users.iter().filter(|u| {
            u.username.to_lowercase().contains(&needle) || u.email.to_lowercase() == needle
        }));
        Ok(take(hits, limit))
    }

    async fn list(&self, limit: u64) -> Result<Vec<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(take(by_username(tables.users.iter()), limit))
    }
}

#[derive(Clone)]
pub struct InMemoryPostRepository {
    tables: Arc<RwLock<Tables>>,
}

#[async_trait]
impl BaseRepository<Post, PostId> for InMemoryPostRepository {
    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn create(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.users.iter().any(|u| u.id == post.author_id) {
            return Err(RepoError::Constraint(
                "posts.author_id references a missing user".to_string(),
            ));
        }
        if tables
            .posts
            .iter()
            .any(|p| p.id == post.id || p.slug == post.slug)
        {
            return Err(RepoError::Constraint("posts.slug must be unique".to_string()));
        }
        tables.posts.push(post.clone());
        Ok(post)
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        if tables
            .posts
            .iter()
            .any(|p| p.id != post.id && p.slug == post.slug)
        {
            return Err(RepoError::Constraint("posts.slug must be unique".to_string()));
        }
        let slot = tables.post_mut(post.id).ok_or(RepoError::NotFound)?;
        *slot = post.clone();
        Ok(post)
    }

    async fn delete(&self, id: PostId) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if tables.remove_post(id) {
            Ok(())
        } else {
            Err(RepoError::NotFound)
        }
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.iter().find(|p| p.slug == slug).cloned())
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.iter().any(|p| p.slug == slug))
    }

    async fn find_by_author(&self, author_id: UserId) -> Result<Vec<Post>, RepoError> {
        let tables = self.tables.read().await;
        Ok(newest_first(
            tables.posts.iter().filter(|p| p.author_id == author_id),
        ))
    }

    async fn find_many(&self, ids: &[PostId]) -> Result<Vec<Post>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn list_recent(&self, limit: u64) -> Result<Vec<Post>, RepoError> {
        let tables = self.tables.read().await;
        Ok(take(newest_first(tables.posts.iter()), limit))
    }

    async fn search_title(&self, query: &str, limit: u64) -> Result<Vec<Post>, RepoError> {
        let needle = query.to_lowercase();
        let tables = self.tables.read().await;
        let hits = newest_first(
            tables
                .posts
                .iter()
                .filter(|p| p.title.to_lowercase().contains(&needle)),
        );
        Ok(take(hits, limit))
    }
}

#[derive(Clone)]
pub struct InMemoryCommentRepository {
    tables: Arc<RwLock<Tables>>,
}

#[async_trait]
impl BaseRepository<Comment, CommentId> for InMemoryCommentRepository {
    async fn find_by_id(&self, id: CommentId) -> Result<Option<Comment>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn create(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.iter().any(|p| p.id == comment.post_id) {
            return Err(RepoError::Constraint(
                "comments.post_id references a missing post".to_string(),
            ));
        }
        if let Some(parent_id) = comment.parent_id {
            if !tables.comments.iter().any(|c| c.id == parent_id) {
                return Err(RepoError::Constraint(
                    "comments.parent_id references a missing comment".to_string(),
                ));
            }
        }
        if tables.comments.iter().any(|c| c.id == comment.id) {
            return Err(RepoError::Constraint("comments.id must be unique".to_string()));
        }
        tables.comments.push(comment.clone());
        Ok(comment)
    }

    async fn update(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .comments
            .iter_mut()
            .find(|c| c.id == comment.id)
            .ok_or(RepoError::NotFound)?;
        *slot = comment.clone();
        Ok(comment)
    }

    /// Mirrors the `parent_id` cascade of the Postgres schema.
    async fn delete(&self, id: CommentId) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.comments.iter().any(|c| c.id == id) {
            return Err(RepoError::NotFound);
        }
        let doomed = plan_cascading_delete(&tables.comments, id);
        tables.remove_comments(&doomed);
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn find_by_post(&self, post_id: PostId) -> Result<Vec<Comment>, RepoError> {
        let tables = self.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by_key(|c| c.created_at);
        Ok(comments)
    }

    async fn delete_subtree(&self, _id: CommentId) -> Result<u64, RepoError> {
        Err(RepoError::Unsupported("delete_subtree"))
    }

    async fn delete_many(&self, ids: &[CommentId]) -> Result<u64, RepoError> {
        let ids: HashSet<CommentId> = ids.iter().copied().collect();
        let mut tables = self.tables.write().await;
        Ok(tables.remove_comments(&ids))
    }
}

#[derive(Clone)]
pub struct InMemoryVoteRepository {
    tables: Arc<RwLock<Tables>>,
}

#[async_trait]
impl VoteRepository for InMemoryVoteRepository {
    async fn cast_vote(
        &self,
        user_id: UserId,
        post_id: PostId,
        direction: VoteDirection,
    ) -> Result<VoteOutcome, RepoError> {
        let mut tables = self.tables.write().await;
        let total = tables
            .posts
            .iter()
            .find(|p| p.id == post_id)
            .map(|p| p.vote_total)
            .ok_or(RepoError::NotFound)?;

        let key = (user_id, post_id);
        let current = UserVote::from(tables.votes.get(&key).map(|v| v.direction));
        let outcome = apply_vote(current, total, direction);

        match outcome.new_user_vote.direction() {
            None => {
                tables.votes.remove(&key);
            }
            Some(new_direction) => match tables.votes.get_mut(&key) {
                Some(vote) => {
                    vote.direction = new_direction;
                    vote.updated_at = chrono::Utc::now();
                }
                None => {
                    tables
                        .votes
                        .insert(key, Vote::new(user_id, post_id, new_direction));
                }
            },
        }
        if let Some(post) = tables.post_mut(post_id) {
            post.vote_total = outcome.new_total;
        }

        Ok(outcome)
    }

    async fn find_vote(&self, user_id: UserId, post_id: PostId) -> Result<Option<Vote>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.votes.get(&(user_id, post_id)).cloned())
    }

    async fn find_votes_by_user(
        &self,
        user_id: UserId,
    ) -> Result<HashMap<PostId, UserVote>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .votes
            .values()
            .filter(|v| v.user_id == user_id)
            .map(|v| (v.post_id, UserVote::from(v.direction)))
            .collect())
    }
}

#[derive(Clone)]
pub struct InMemorySavedPostRepository {
    tables: Arc<RwLock<Tables>>,
}

#[async_trait]
impl SavedPostRepository for InMemorySavedPostRepository {
    async fn save(&self, entry: SavedPost) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.iter().any(|p| p.id == entry.post_id) {
            return Err(RepoError::Constraint(
                "saved_posts.post_id references a missing post".to_string(),
            ));
        }
        let exists = tables
            .saved
            .iter()
            .any(|s| s.user_id == entry.user_id && s.post_id == entry.post_id);
        if !exists {
            tables.saved.push(entry);
        }
        Ok(())
    }

    async fn remove(&self, user_id: UserId, post_id: PostId) -> Result<bool, RepoError> {
        let mut tables = self.tables.write().await;
        let before = tables.saved.len();
        tables
            .saved
            .retain(|s| !(s.user_id == user_id && s.post_id == post_id));
        Ok(tables.saved.len() != before)
    }

    async fn is_saved(&self, user_id: UserId, post_id: PostId) -> Result<bool, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .saved
            .iter()
            .any(|s| s.user_id == user_id && s.post_id == post_id))
    }

    async fn list_post_ids(&self, user_id: UserId) -> Result<Vec<PostId>, RepoError> {
        let tables = self.tables.read().await;
        let mut entries: Vec<&SavedPost> = tables
            .saved
            .iter()
            .rev()
            .filter(|s| s.user_id == user_id)
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries.into_iter().map(|s| s.post_id).collect())
    }
}

#[derive(Clone)]
pub struct InMemoryFriendshipRepository {
    tables: Arc<RwLock<Tables>>,
}

#[async_trait]
impl FriendshipRepository for InMemoryFriendshipRepository {
    async fn add(&self, friendship: Friendship) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        for id in [friendship.user_id, friendship.friend_id] {
            if !tables.users.iter().any(|u| u.id == id) {
                return Err(RepoError::Constraint(
                    "friendships references a missing user".to_string(),
                ));
            }
        }
        if tables
            .friendships
            .iter()
            .any(|f| f.user_id == friendship.user_id && f.friend_id == friendship.friend_id)
        {
            return Err(RepoError::Constraint(
                "friendships (user_id, friend_id) must be unique".to_string(),
            ));
        }
        tables.friendships.push(friendship);
        Ok(())
    }

    async fn remove(&self, user_id: UserId, friend_id: UserId) -> Result<bool, RepoError> {
        let mut tables = self.tables.write().await;
        let before = tables.friendships.len();
        tables
            .friendships
            .retain(|f| !(f.user_id == user_id && f.friend_id == friend_id));
        Ok(tables.friendships.len() != before)
    }

    async fn exists(&self, user_id: UserId, friend_id: UserId) -> Result<bool, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .friendships
            .iter()
            .any(|f| f.user_id == user_id && f.friend_id == friend_id))
    }

    async fn list_friend_ids(&self, user_id: UserId) -> Result<Vec<UserId>, RepoError> {
        let tables = self.tables.read().await;
        let mut links: Vec<&Friendship> = tables
            .friendships
            .iter()
            .rev()
            .filter(|f| f.user_id == user_id)
            .collect();
        links.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(links.into_iter().map(|f| f.friend_id).collect())
    }
}
