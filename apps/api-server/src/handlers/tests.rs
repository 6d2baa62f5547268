use actix_web::{App, http::StatusCode, test, web};
use serde_json::{Value, json};

use agora_core::comment_tree::build_tree;
use agora_core::domain::{AuthorSummary, Comment, CommentView};
use agora_core::services::MAX_REPLY_DEPTH;
use agora_infra::{JwtConfig, MediaConfig};

use super::{configure_routes, views};
use crate::state::AppState;

fn state() -> AppState {
    let media = MediaConfig {
        root: std::env::temp_dir().join(format!("agora-handlers-{}", uuid::Uuid::new_v4())),
        ..MediaConfig::default()
    };
    AppState::in_memory(JwtConfig::default(), media)
}

macro_rules! app {
    () => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(state()))
                .configure(configure_routes),
        )
        .await
    };
}

macro_rules! register {
    ($app:expr, $username:expr) => {{
        let username: &str = $username;
        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "password": "correct horse battery",
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&$app, req).await;
        body["access_token"].as_str().unwrap().to_string()
    }};
}

fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

#[actix_web::test]
async fn test_health() {
    let app = app!();
    let req = test::TestRequest::get().uri("/api/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "memory");
}

#[actix_web::test]
async fn test_register_login_and_me() {
    let app = app!();
    let token = register!(app, "alice");

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header(bearer(&token))
        .to_request();
    let me: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(me["username"], "alice");

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "ALICE@example.com", "password": "correct horse battery" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "alice@example.com", "password": "wrong password" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_web::test]
async fn test_register_rejects_duplicates_and_bad_input() {
    let app = app!();
    register!(app, "alice");

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "username": "alice",
            "email": "other@example.com",
            "password": "long enough password",
        }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "username": "bob", "email": "nope", "password": "short" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn test_writes_require_a_token() {
    let app = app!();
    let req = test::TestRequest::post()
        .uri("/api/posts")
        .set_json(json!({ "title": "Hello" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_web::test]
async fn test_post_lifecycle() {
    let app = app!();
    let alice = register!(app, "alice");
    let bob = register!(app, "bob");

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header(bearer(&alice))
        .set_json(json!({ "title": "Hello World", "content": "first!" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let post: Value = test::read_body_json(resp).await;
    assert_eq!(post["slug"], "hello-world");
    assert_eq!(post["author"]["username"], "alice");
    let id = post["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/api/posts/slug/hello-world")
        .to_request();
    let by_slug: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(by_slug["id"], id.as_str());

    let req = test::TestRequest::get()
        .uri("/api/posts/search?q=WORLD")
        .to_request();
    let found: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(found.as_array().unwrap().len(), 1);

    let req = test::TestRequest::put()
        .uri(&format!("/api/posts/{id}"))
        .insert_header(bearer(&bob))
        .set_json(json!({ "title": "Hijacked" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::put()
        .uri(&format!("/api/posts/{id}"))
        .insert_header(bearer(&alice))
        .set_json(json!({ "title": "Hello Again" }))
        .to_request();
    let updated: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated["title"], "Hello Again");
    assert_eq!(updated["slug"], "hello-world");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/posts/{id}"))
        .insert_header(bearer(&alice))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NO_CONTENT
    );

    let req = test::TestRequest::get()
        .uri(&format!("/api/posts/{id}"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_voting_toggles_and_flips() {
    let app = app!();
    let alice = register!(app, "alice");

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header(bearer(&alice))
        .set_json(json!({ "title": "Vote on me" }))
        .to_request();
    let post: Value = test::call_and_read_body_json(&app, req).await;
    let id = post["id"].as_str().unwrap().to_string();
    let uri = format!("/api/posts/{id}/vote");

    let mut seen = Vec::new();
    for value in [1, 1, -1, 1] {
        let req = test::TestRequest::post()
            .uri(&uri)
            .insert_header(bearer(&alice))
            .set_json(json!({ "value": value }))
            .to_request();
        let vote: Value = test::call_and_read_body_json(&app, req).await;
        seen.push((vote["total"].as_i64().unwrap(), vote["user_vote"].as_i64().unwrap()));
    }
    assert_eq!(seen, vec![(1, 1), (0, 0), (-1, -1), (1, 1)]);

    let req = test::TestRequest::get()
        .uri("/api/users/me/votes")
        .insert_header(bearer(&alice))
        .to_request();
    let mine: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(mine["votes"][id.as_str()], 1);

    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(bearer(&alice))
        .set_json(json!({ "value": 2 }))
        .to_request();
    assert!(test::call_service(&app, req).await.status().is_client_error());
}

#[actix_web::test]
async fn test_comment_thread_and_cascading_delete() {
    let app = app!();
    let alice = register!(app, "alice");
    let bob = register!(app, "bob");

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header(bearer(&alice))
        .set_json(json!({ "title": "Discuss" }))
        .to_request();
    let post: Value = test::call_and_read_body_json(&app, req).await;
    let comments_uri = format!("/api/posts/{}/comments", post["id"].as_str().unwrap());

    let req = test::TestRequest::post()
        .uri(&comments_uri)
        .insert_header(bearer(&bob))
        .set_json(json!({ "content": "top" }))
        .to_request();
    let top: Value = test::call_and_read_body_json(&app, req).await;
    let top_id = top["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&comments_uri)
        .insert_header(bearer(&bob))
        .set_json(json!({ "content": "reply", "parent_id": top_id }))
        .to_request();
    let reply: Value = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::get().uri(&comments_uri).to_request();
    let tree: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(tree.as_array().unwrap().len(), 1);
    assert_eq!(tree[0]["replies"][0]["id"], reply["id"]);

    // The post's author may moderate the thread
    let req = test::TestRequest::delete()
        .uri(&format!("/api/comments/{top_id}"))
        .insert_header(bearer(&alice))
        .to_request();
    let deleted: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(deleted["deleted"].as_array().unwrap().len(), 2);

    let req = test::TestRequest::get().uri(&comments_uri).to_request();
    let tree: Value = test::call_and_read_body_json(&app, req).await;
    assert!(tree.as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn test_reply_chain_stops_at_the_depth_limit() {
    let app = app!();
    let alice = register!(app, "alice");

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header(bearer(&alice))
        .set_json(json!({ "title": "Go deep" }))
        .to_request();
    let post: Value = test::call_and_read_body_json(&app, req).await;
    let comments_uri = format!("/api/posts/{}/comments", post["id"].as_str().unwrap());

    let mut parent = Value::Null;
    for level in 0..MAX_REPLY_DEPTH {
        let req = test::TestRequest::post()
            .uri(&comments_uri)
            .insert_header(bearer(&alice))
            .set_json(json!({ "content": format!("level {level}"), "parent_id": parent }))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        parent = created["id"].clone();
    }

    let req = test::TestRequest::post()
        .uri(&comments_uri)
        .insert_header(bearer(&alice))
        .set_json(json!({ "content": "one too many", "parent_id": parent }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );

    let req = test::TestRequest::get().uri(&comments_uri).to_request();
    let tree: Value = test::call_and_read_body_json(&app, req).await;
    let mut depth = 0;
    let mut node = &tree[0];
    while !node.is_null() {
        depth += 1;
        node = &node["replies"][0];
    }
    assert_eq!(depth, MAX_REPLY_DEPTH);
}

#[actix_web::test]
async fn test_deep_comment_forest_converts_without_recursion() {
    let media = state().media;
    let post_id = uuid::Uuid::new_v4();
    let author_id = uuid::Uuid::new_v4();

    let mut parent = None;
    let mut chain = Vec::new();
    for level in 0..3_000 {
        let comment = Comment::new(post_id, author_id, format!("level {level}"), parent);
        parent = Some(comment.id);
        chain.push(CommentView {
            author: AuthorSummary::unknown(author_id),
            comment,
        });
    }

    let mut level = views::comments(build_tree(chain), media.as_ref());
    let mut depth = 0;
    while let Some(mut node) = level.pop() {
        assert!(level.is_empty());
        depth += 1;
        level = std::mem::take(&mut node.replies);
    }
    assert_eq!(depth, 3_000);
}

#[actix_web::test]
async fn test_saved_posts() {
    let app = app!();
    let alice = register!(app, "alice");

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header(bearer(&alice))
        .set_json(json!({ "title": "Keep this" }))
        .to_request();
    let post: Value = test::call_and_read_body_json(&app, req).await;
    let save_uri = format!("/api/posts/{}/save", post["id"].as_str().unwrap());

    let req = test::TestRequest::post()
        .uri(&save_uri)
        .insert_header(bearer(&alice))
        .to_request();
    let saved: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(saved["saved"], true);

    let req = test::TestRequest::get()
        .uri("/api/users/me/saved")
        .insert_header(bearer(&alice))
        .to_request();
    let list: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(list[0]["title"], "Keep this");

    let req = test::TestRequest::delete()
        .uri(&save_uri)
        .insert_header(bearer(&alice))
        .to_request();
    let saved: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(saved["saved"], false);

    let req = test::TestRequest::get()
        .uri(&save_uri)
        .insert_header(bearer(&alice))
        .to_request();
    let status: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(status["saved"], false);
}

#[actix_web::test]
async fn test_user_directory_and_friends() {
    let app = app!();
    let alice = register!(app, "alice");
    register!(app, "malice");
    let bob = register!(app, "bob");

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header(bearer(&bob))
        .to_request();
    let me: Value = test::call_and_read_body_json(&app, req).await;
    let bob_id = me["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::get().uri("/api/users?q=lic").to_request();
    let found: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(found.as_array().unwrap().len(), 2);
    assert!(found[0].get("email").is_none());

    let req = test::TestRequest::get().uri("/api/users").to_request();
    let everyone: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(everyone.as_array().unwrap().len(), 3);

    let friend_uri = format!("/api/users/{bob_id}/friend");
    let req = test::TestRequest::post()
        .uri(&friend_uri)
        .insert_header(bearer(&alice))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri(&friend_uri)
        .insert_header(bearer(&alice))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri(&friend_uri)
        .insert_header(bearer(&bob))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header(bearer(&alice))
        .to_request();
    let me: Value = test::call_and_read_body_json(&app, req).await;
    let friends_uri = format!("/api/users/{}/friends", me["id"].as_str().unwrap());

    let req = test::TestRequest::get().uri(&friends_uri).to_request();
    let friends: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(friends[0]["username"], "bob");

    let req = test::TestRequest::delete()
        .uri(&friend_uri)
        .insert_header(bearer(&alice))
        .to_request();
    let removed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(removed["friends"], false);

    let req = test::TestRequest::get().uri(&friends_uri).to_request();
    let friends: Value = test::call_and_read_body_json(&app, req).await;
    assert!(friends.as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn test_profile_update() {
    let app = app!();
    let alice = register!(app, "alice");

    let req = test::TestRequest::put()
        .uri("/api/users/me")
        .insert_header(bearer(&alice))
        .set_json(json!({ "bio": "  hello there  " }))
        .to_request();
    let user: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(user["bio"], "hello there");

    let req = test::TestRequest::get()
        .uri(&format!("/api/users/{}", user["id"].as_str().unwrap()))
        .to_request();
    let profile: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(profile["username"], "alice");
    assert!(profile["posts"].as_array().unwrap().is_empty());
}

fn multipart_file(file_name: &str, content_type: &str, content: &str) -> String {
    format!(
        "--agora-boundary\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
         Content-Type: {content_type}\r\n\r\n\
         {content}\r\n\
         --agora-boundary--\r\n"
    )
}

#[actix_web::test]
async fn test_media_upload_refuses_svg() {
    let app = app!();
    let alice = register!(app, "alice");

    let req = test::TestRequest::post()
        .uri("/api/media")
        .insert_header(bearer(&alice))
        .insert_header(("Content-Type", "multipart/form-data; boundary=agora-boundary"))
        .set_payload(multipart_file(
            "x.svg",
            "image/svg+xml",
            "<svg xmlns=\"http://www.w3.org/2000/svg\"><script>alert(1)</script></svg>",
        ))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNSUPPORTED_MEDIA_TYPE
    );

    let req = test::TestRequest::post()
        .uri("/api/media")
        .insert_header(bearer(&alice))
        .insert_header(("Content-Type", "multipart/form-data; boundary=agora-boundary"))
        .set_payload(multipart_file("x.svg", "image/png", "not really a png"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let stored: Value = test::read_body_json(resp).await;
    assert!(stored["image_ref"].as_str().unwrap().ends_with("-x.png"));
}
