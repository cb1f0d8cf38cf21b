//! End-to-end API tests against the full router and an in-memory database.

use axum::http::{header, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};
use std::sync::Arc;

use devbook::{
    api::routes::build_app,
    types::{LoginResponse, Post, User},
    utils::toml_config::DevbookConfig,
    AppState, TokenService, TursoClient,
};

const SECRET: &[u8] = b"api-test-secret-key";

fn server_over(store: TursoClient, database_url: &str) -> TestServer {
    let mut config = DevbookConfig::default();
    config.database.url = database_url.to_string();

    let state = AppState::new(config, Arc::new(store), TokenService::new(SECRET));
    TestServer::new(build_app(state)).expect("Failed to create test server")
}

/// Create a test server over a fresh in-memory database
async fn create_test_server() -> TestServer {
    let store = TursoClient::new_memory()
        .await
        .expect("Failed to create in-memory database");
    server_over(store, ":memory:")
}

/// Create a test server over a SQLite file inside `dir`
async fn create_file_test_server(dir: &tempfile::TempDir) -> TestServer {
    let path = dir.path().join("devbook.db");
    let path = path.to_str().expect("utf-8 temp path");
    let store = TursoClient::new_local(path)
        .await
        .expect("Failed to create file database");
    server_over(store, path)
}

/// Registers `nick` and logs in, returning the user id and token.
async fn signup(server: &TestServer, nick: &str) -> (u64, String) {
    let response = server
        .post("/users")
        .json(&json!({
            "name": format!("{} Tester", nick),
            "nick": nick,
            "email": format!("{}@example.com", nick),
            "password": "secret123"
        }))
        .await;
    response.assert_status(StatusCode::CREATED);

    let response = server
        .post("/login")
        .json(&json!({
            "email": format!("{}@example.com", nick),
            "password": "secret123"
        }))
        .await;
    response.assert_status_ok();

    let login: LoginResponse = response.json();
    (login.id, login.token)
}

async fn publish(server: &TestServer, token: &str, title: &str) -> Post {
    let response = server
        .post("/posts")
        .authorization_bearer(token)
        .json(&json!({ "title": title, "content": "body" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

// ============= Service Routes =============

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server().await;

    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_text("OK");
}

#[tokio::test]
async fn test_openapi_document() {
    let server = create_test_server().await;

    let response = server.get("/api-docs/openapi.json").await;
    response.assert_status_ok();

    let doc: Value = response.json();
    assert!(doc["paths"]["/users/{userId}/follow"].is_object());
}

// ============= Registration and Login =============

#[tokio::test]
async fn test_register_returns_user_without_password() {
    let server = create_test_server().await;

    let response = server
        .post("/users")
        .json(&json!({
            "name": " Ada ",
            "nick": "ada",
            "email": "ada@example.com",
            "password": "secret123"
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["name"], "Ada");
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn test_register_duplicate_nick() {
    let server = create_test_server().await;
    signup(&server, "ada").await;

    let response = server
        .post("/users")
        .json(&json!({
            "name": "Other",
            "nick": "ada",
            "email": "other@example.com",
            "password": "secret123"
        }))
        .await;

    response.assert_status_bad_request();
    response.assert_json(&json!({ "error": "Nick or email already in use" }));
}

#[tokio::test]
async fn test_register_missing_field() {
    let server = create_test_server().await;

    let response = server
        .post("/users")
        .json(&json!({ "name": "Ada", "email": "ada@example.com", "password": "x" }))
        .await;

    response.assert_status_bad_request();
    response.assert_json(&json!({ "error": "The field nick is needed and cannot be empty" }));
}

#[tokio::test]
async fn test_register_malformed_json() {
    let server = create_test_server().await;

    let response = server
        .post("/users")
        .content_type("application/json")
        .text("{\"name\": ")
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let server = create_test_server().await;
    signup(&server, "ada").await;

    let response = server
        .post("/users")
        .json(&json!({
            "name": "Other",
            "nick": "other",
            "email": "ada@example.com",
            "password": "secret123"
        }))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_login_token_identifies_user() {
    let server = create_test_server().await;
    let (id, token) = signup(&server, "ada").await;

    let subject = TokenService::new(SECRET)
        .verify_token(&token)
        .unwrap()
        .subject()
        .unwrap();
    assert_eq!(subject, id);
}

#[tokio::test]
async fn test_login_wrong_password() {
    let server = create_test_server().await;
    signup(&server, "ada").await;

    let response = server
        .post("/login")
        .json(&json!({ "email": "ada@example.com", "password": "wrong" }))
        .await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn test_login_unknown_email() {
    let server = create_test_server().await;

    let response = server
        .post("/login")
        .json(&json!({ "email": "nobody@example.com", "password": "secret123" }))
        .await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let server = create_test_server().await;
    signup(&server, "ada").await;

    let wrong_password = server
        .post("/login")
        .json(&json!({ "email": "ada@example.com", "password": "wrong" }))
        .await;
    let unknown_email = server
        .post("/login")
        .json(&json!({ "email": "nobody@example.com", "password": "wrong" }))
        .await;

    wrong_password.assert_status_unauthorized();
    unknown_email.assert_status_unauthorized();
    assert_eq!(wrong_password.text(), unknown_email.text());
}

// ============= Auth Gate =============

#[tokio::test]
async fn test_protected_route_requires_token() {
    let server = create_test_server().await;

    let response = server.get("/posts").await;
    response.assert_status_unauthorized();

    let body: Value = response.json();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_malformed_authorization_header() {
    let server = create_test_server().await;

    let response = server
        .get("/users")
        .add_header(header::AUTHORIZATION, HeaderValue::from_static("Malformed"))
        .await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn test_token_from_other_secret_rejected() {
    let server = create_test_server().await;
    let (id, _) = signup(&server, "ada").await;
    let forged = TokenService::new(b"some-other-secret").issue(id).unwrap();

    let response = server.get("/posts").authorization_bearer(forged).await;
    response.assert_status_unauthorized();
}

#[tokio::test]
async fn test_create_post_requires_token() {
    let server = create_test_server().await;

    let response = server
        .post("/posts")
        .json(&json!({ "title": "t", "content": "c" }))
        .await;

    response.assert_status_unauthorized();
}

// ============= Users =============

#[tokio::test]
async fn test_search_and_get_users() {
    let server = create_test_server().await;
    let (ada, token) = signup(&server, "ada").await;
    signup(&server, "grace").await;

    let response = server
        .get("/users")
        .add_query_param("user", "AD")
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();
    let users: Vec<User> = response.json();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].id, ada);

    let response = server
        .get(&format!("/users/{}", ada))
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();

    let response = server.get("/users/999").authorization_bearer(&token).await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_non_numeric_user_id() {
    let server = create_test_server().await;
    let (_, token) = signup(&server, "ada").await;

    let response = server.get("/users/abc").authorization_bearer(&token).await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_update_and_delete_own_account_only() {
    let server = create_test_server().await;
    let (ada, ada_token) = signup(&server, "ada").await;
    let (grace, _) = signup(&server, "grace").await;

    let update = json!({ "name": "Ada L", "nick": "adal", "email": "adal@example.com" });

    let response = server
        .put(&format!("/users/{}", grace))
        .authorization_bearer(&ada_token)
        .json(&update)
        .await;
    response.assert_status_forbidden();

    let response = server
        .put(&format!("/users/{}", ada))
        .authorization_bearer(&ada_token)
        .json(&update)
        .await;
    response.assert_status(StatusCode::NO_CONTENT);

    let response = server
        .delete(&format!("/users/{}", grace))
        .authorization_bearer(&ada_token)
        .await;
    response.assert_status_forbidden();

    let response = server
        .delete(&format!("/users/{}", ada))
        .authorization_bearer(&ada_token)
        .await;
    response.assert_status(StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_follow_graph() {
    let server = create_test_server().await;
    let (ada, ada_token) = signup(&server, "ada").await;
    let (grace, _) = signup(&server, "grace").await;

    let response = server
        .post(&format!("/users/{}/follow", ada))
        .authorization_bearer(&ada_token)
        .await;
    response.assert_status_forbidden();

    let response = server
        .post(&format!("/users/{}/follow", grace))
        .authorization_bearer(&ada_token)
        .await;
    response.assert_status(StatusCode::NO_CONTENT);

    let followers: Vec<User> = server
        .get(&format!("/users/{}/followers", grace))
        .authorization_bearer(&ada_token)
        .await
        .json();
    assert_eq!(followers.iter().map(|u| u.id).collect::<Vec<_>>(), vec![ada]);

    let following: Vec<User> = server
        .get(&format!("/users/{}/following", ada))
        .authorization_bearer(&ada_token)
        .await
        .json();
    assert_eq!(following.iter().map(|u| u.id).collect::<Vec<_>>(), vec![grace]);

    let response = server
        .post(&format!("/users/{}/unfollow", grace))
        .authorization_bearer(&ada_token)
        .await;
    response.assert_status(StatusCode::NO_CONTENT);

    let following: Vec<User> = server
        .get(&format!("/users/{}/following", ada))
        .authorization_bearer(&ada_token)
        .await
        .json();
    assert!(following.is_empty());
}

#[tokio::test]
async fn test_update_password_flow() {
    let server = create_test_server().await;
    let (ada, token) = signup(&server, "ada").await;

    let response = server
        .post(&format!("/users/{}/update-password", ada))
        .authorization_bearer(&token)
        .json(&json!({ "current": "wrong", "new": "changed456" }))
        .await;
    response.assert_status_unauthorized();

    let response = server
        .post(&format!("/users/{}/update-password", ada))
        .authorization_bearer(&token)
        .json(&json!({ "current": "secret123", "new": "changed456" }))
        .await;
    response.assert_status(StatusCode::NO_CONTENT);

    let response = server
        .post("/login")
        .json(&json!({ "email": "ada@example.com", "password": "changed456" }))
        .await;
    response.assert_status_ok();
}

// ============= Posts =============

#[tokio::test]
async fn test_post_ownership() {
    let server = create_test_server().await;
    let (_, ada_token) = signup(&server, "ada").await;
    let (_, grace_token) = signup(&server, "grace").await;
    let post = publish(&server, &ada_token, "mine").await;

    let edit = json!({ "title": "hijacked", "content": "x" });

    let response = server
        .put(&format!("/posts/{}", post.id))
        .authorization_bearer(&grace_token)
        .json(&edit)
        .await;
    response.assert_status_forbidden();

    let response = server
        .delete(&format!("/posts/{}", post.id))
        .authorization_bearer(&grace_token)
        .await;
    response.assert_status_forbidden();

    let response = server
        .put(&format!("/posts/{}", post.id))
        .authorization_bearer(&ada_token)
        .json(&json!({ "title": "edited", "content": "x" }))
        .await;
    response.assert_status(StatusCode::NO_CONTENT);

    let fetched: Post = server
        .get(&format!("/posts/{}", post.id))
        .authorization_bearer(&grace_token)
        .await
        .json();
    assert_eq!(fetched.title, "edited");

    let response = server
        .delete(&format!("/posts/{}", post.id))
        .authorization_bearer(&ada_token)
        .await;
    response.assert_status(StatusCode::NO_CONTENT);

    let response = server
        .get(&format!("/posts/{}", post.id))
        .authorization_bearer(&ada_token)
        .await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_feed_and_user_posts() {
    let server = create_test_server().await;
    let (ada, ada_token) = signup(&server, "ada").await;
    let (grace, grace_token) = signup(&server, "grace").await;
    let (_, alan_token) = signup(&server, "alan").await;

    server
        .post(&format!("/users/{}/follow", grace))
        .authorization_bearer(&ada_token)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let from_grace = publish(&server, &grace_token, "from grace").await;
    publish(&server, &alan_token, "from alan").await;
    let from_ada = publish(&server, &ada_token, "from ada").await;

    let feed: Vec<Post> = server.get("/posts").authorization_bearer(&ada_token).await.json();
    assert_eq!(
        feed.iter().map(|p| p.id).collect::<Vec<_>>(),
        vec![from_ada.id, from_grace.id]
    );

    let by_ada: Vec<Post> = server
        .get(&format!("/users/{}/posts", ada))
        .authorization_bearer(&grace_token)
        .await
        .json();
    assert_eq!(by_ada.len(), 1);
    assert_eq!(by_ada[0].author_nick, "ada");
}

#[tokio::test]
async fn test_like_and_unlike() {
    let server = create_test_server().await;
    let (_, token) = signup(&server, "ada").await;
    let post = publish(&server, &token, "likeable").await;

    for _ in 0..2 {
        server
            .post(&format!("/posts/{}/like", post.id))
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::NO_CONTENT);
    }

    let fetched: Post = server
        .get(&format!("/posts/{}", post.id))
        .authorization_bearer(&token)
        .await
        .json();
    assert_eq!(fetched.likes, 2);

    for _ in 0..3 {
        server
            .post(&format!("/posts/{}/unlike", post.id))
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::NO_CONTENT);
    }

    let fetched: Post = server
        .get(&format!("/posts/{}", post.id))
        .authorization_bearer(&token)
        .await
        .json();
    assert_eq!(fetched.likes, 0);

    server
        .post("/posts/999/like")
        .authorization_bearer(&token)
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_create_post_validation() {
    let server = create_test_server().await;
    let (_, token) = signup(&server, "ada").await;

    let response = server
        .post("/posts")
        .authorization_bearer(&token)
        .json(&json!({ "title": "only a title" }))
        .await;

    response.assert_status_bad_request();
}

// ============= File-backed Database =============

#[tokio::test]
async fn test_file_database_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let server = create_file_test_server(&dir).await;
    let (ada, token) = signup(&server, "ada").await;

    let post = publish(&server, &token, "on disk").await;
    assert_eq!(post.author_id, ada);
    assert_eq!(post.author_nick, "ada");

    let fetched: Post = server
        .get(&format!("/posts/{}", post.id))
        .authorization_bearer(&token)
        .await
        .json();
    assert_eq!(fetched, post);

    let feed: Vec<Post> = server.get("/posts").authorization_bearer(&token).await.json();
    assert_eq!(feed.len(), 1);
}

#[tokio::test]
async fn test_file_database_duplicate_registration() {
    let dir = tempfile::tempdir().unwrap();
    let server = create_file_test_server(&dir).await;
    signup(&server, "ada").await;

    let response = server
        .post("/users")
        .json(&json!({
            "name": "Again",
            "nick": "ada2",
            "email": "ada@example.com",
            "password": "secret123"
        }))
        .await;

    response.assert_status_bad_request();
}
