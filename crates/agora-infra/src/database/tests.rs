use chrono::Utc;
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use uuid::Uuid;

use agora_core::domain::{Post, UserVote, VoteDirection};
use agora_core::error::RepoError;
use agora_core::ports::{
    BaseRepository, CommentRepository, FriendshipRepository, PostRepository, SavedPostRepository,
    VoteRepository,
};

use crate::database::entity::{friendship, post, saved_post, vote};
use crate::database::postgres_repo::{
    PostgresCommentRepository, PostgresFriendshipRepository, PostgresPostRepository,
    PostgresSavedPostRepository, PostgresVoteRepository,
};

fn post_model(id: Uuid, author_id: Uuid, vote_total: i64) -> post::Model {
    let now = Utc::now();
    post::Model {
        id,
        author_id,
        title: "Test Post".to_owned(),
        content: "Content".to_owned(),
        slug: "test-post".to_owned(),
        image_ref: None,
        vote_total,
        created_at: now.into(),
        updated_at: now.into(),
    }
}

#[tokio::test]
async fn test_find_post_by_id() {
    let post_id = Uuid::new_v4();
    let author_id = Uuid::new_v4();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![post_model(post_id, author_id, 3)]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let result: Option<Post> = repo.find_by_id(post_id).await.unwrap();

    let post = result.unwrap();
    assert_eq!(post.title, "Test Post");
    assert_eq!(post.id, post_id);
    assert_eq!(post.author_id, author_id);
    assert_eq!(post.vote_total, 3);
}

#[tokio::test]
async fn test_find_post_by_slug_missing() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<post::Model>::new()])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    assert!(repo.find_by_slug("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn test_cast_first_vote() {
    let user_id = Uuid::new_v4();
    let post_id = Uuid::new_v4();
    let author_id = Uuid::new_v4();
    let now = Utc::now();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        // SELECT ... FOR UPDATE on the post
        .append_query_results([vec![post_model(post_id, author_id, 5)]])
        // no existing vote
        .append_query_results([Vec::<vote::Model>::new()])
        // INSERT ... RETURNING for the new vote
        .append_query_results([vec![vote::Model {
            user_id,
            post_id,
            value: 1,
            created_at: now.into(),
            updated_at: now.into(),
        }]])
        // UPDATE ... RETURNING for the post total
        .append_query_results([vec![post_model(post_id, author_id, 6)]])
        .into_connection();

    let repo = PostgresVoteRepository::new(db);

    let outcome = repo
        .cast_vote(user_id, post_id, VoteDirection::Up)
        .await
        .unwrap();

    assert_eq!(outcome.new_total, 6);
    assert_eq!(outcome.new_user_vote, UserVote::Upvoted);
}

#[tokio::test]
async fn test_cast_vote_on_missing_post() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<post::Model>::new()])
        .into_connection();

    let repo = PostgresVoteRepository::new(db);

    let result = repo
        .cast_vote(Uuid::new_v4(), Uuid::new_v4(), VoteDirection::Down)
        .await;

    assert!(matches!(result, Err(RepoError::NotFound)));
}

#[tokio::test]
async fn test_find_vote_rejects_corrupt_value() {
    let now = Utc::now();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![vote::Model {
            user_id: Uuid::new_v4(),
            post_id: Uuid::new_v4(),
            value: 3,
            created_at: now.into(),
            updated_at: now.into(),
        }]])
        .into_connection();

    let repo = PostgresVoteRepository::new(db);

    let result = repo.find_vote(Uuid::new_v4(), Uuid::new_v4()).await;
    assert!(matches!(result, Err(RepoError::Query(_))));
}

#[tokio::test]
async fn test_delete_subtree_counts_rows() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            },
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            },
        ])
        .into_connection();

    let repo = PostgresCommentRepository::new(db);

    assert_eq!(repo.delete_subtree(Uuid::new_v4()).await.unwrap(), 1);
    assert!(matches!(
        repo.delete_subtree(Uuid::new_v4()).await,
        Err(RepoError::NotFound)
    ));
}

#[tokio::test]
async fn test_delete_many_with_no_ids_skips_the_database() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let repo = PostgresCommentRepository::new(db);

    assert_eq!(repo.delete_many(&[]).await.unwrap(), 0);
}

#[tokio::test]
async fn test_list_friend_ids_keeps_query_order() {
    let user_id = Uuid::new_v4();
    let (newer, older) = (Uuid::new_v4(), Uuid::new_v4());
    let now = Utc::now();
    let row = |friend_id| friendship::Model {
        user_id,
        friend_id,
        created_at: now.into(),
    };

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![row(newer), row(older)]])
        .into_connection();

    let repo = PostgresFriendshipRepository::new(db);

    assert_eq!(repo.list_friend_ids(user_id).await.unwrap(), vec![newer, older]);
}

#[tokio::test]
async fn test_remove_missing_friend_reports_false() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();

    let repo = PostgresFriendshipRepository::new(db);

    assert!(!repo.remove(Uuid::new_v4(), Uuid::new_v4()).await.unwrap());
}

#[tokio::test]
async fn test_is_saved_without_row() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<saved_post::Model>::new()])
        .into_connection();

    let repo = PostgresSavedPostRepository::new(db);

    assert!(!repo.is_saved(Uuid::new_v4(), Uuid::new_v4()).await.unwrap());
}
