use crate::{
    api::extract::{JsonBody, ResourceId},
    auth::{middleware::AuthUser, ownership::ensure_owner},
    types::{AppError, Post, PostInput, Result},
    AppState,
};
use axum::{extract::State, http::StatusCode, Json};
use tracing::info;

fn post_not_found(id: u64) -> AppError {
    AppError::NotFound(format!("Post {} not found", id))
}

/// Loads the author of `post_id` and checks it against the subject.
async fn authorize_author(state: &AppState, subject: u64, post_id: u64, action: &str) -> Result<()> {
    let author = state
        .store
        .post_author(post_id)
        .await?
        .ok_or_else(|| post_not_found(post_id))?;

    ensure_owner(
        subject,
        author,
        &format!("It is not possible to {} a post that is not yours", action),
    )
}

/// Publish a post as the authenticated user
#[utoipa::path(
    post,
    path = "/posts",
    request_body = PostInput,
    responses(
        (status = 201, description = "Post created", body = Post),
        (status = 400, description = "Missing title or content", body = crate::types::ErrorBody),
        (status = 401, description = "Missing or invalid token", body = crate::types::ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn create_post(
    State(state): State<AppState>,
    AuthUser(author_id): AuthUser,
    JsonBody(payload): JsonBody<PostInput>,
) -> Result<(StatusCode, Json<Post>)> {
    let input = payload.prepare()?;
    let post = state.store.create_post(author_id, &input).await?;

    Ok((StatusCode::CREATED, Json(post)))
}

/// Feed of the authenticated user: own posts and posts of followed users
#[utoipa::path(
    get,
    path = "/posts",
    responses((status = 200, description = "Newest first", body = Vec<Post>)),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn feed(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Post>>> {
    Ok(Json(state.store.feed(user_id).await?))
}

/// Get a post by id
#[utoipa::path(
    get,
    path = "/posts/{postId}",
    params(("postId" = u64, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post", body = Post),
        (status = 404, description = "No such post", body = crate::types::ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn get_post(
    State(state): State<AppState>,
    ResourceId(post_id): ResourceId,
) -> Result<Json<Post>> {
    state
        .store
        .get_post(post_id)
        .await?
        .map(Json)
        .ok_or_else(|| post_not_found(post_id))
}

/// Edit one of your posts
#[utoipa::path(
    put,
    path = "/posts/{postId}",
    params(("postId" = u64, Path, description = "Post id")),
    request_body = PostInput,
    responses(
        (status = 204, description = "Post updated"),
        (status = 403, description = "Not your post", body = crate::types::ErrorBody),
        (status = 404, description = "No such post", body = crate::types::ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn update_post(
    State(state): State<AppState>,
    AuthUser(subject): AuthUser,
    ResourceId(post_id): ResourceId,
    JsonBody(payload): JsonBody<PostInput>,
) -> Result<StatusCode> {
    authorize_author(&state, subject, post_id, "update").await?;
    let input = payload.prepare()?;

    if !state.store.update_post(post_id, &input).await? {
        return Err(post_not_found(post_id));
    }

    info!(post_id, author_id = subject, "post updated");
    Ok(StatusCode::NO_CONTENT)
}

/// Delete one of your posts
#[utoipa::path(
    delete,
    path = "/posts/{postId}",
    params(("postId" = u64, Path, description = "Post id")),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 403, description = "Not your post", body = crate::types::ErrorBody),
        (status = 404, description = "No such post", body = crate::types::ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn delete_post(
    State(state): State<AppState>,
    AuthUser(subject): AuthUser,
    ResourceId(post_id): ResourceId,
) -> Result<StatusCode> {
    authorize_author(&state, subject, post_id, "delete").await?;

    if !state.store.delete_post(post_id).await? {
        return Err(post_not_found(post_id));
    }

    info!(post_id, author_id = subject, "post deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Posts written by a user
#[utoipa::path(
    get,
    path = "/users/{userId}/posts",
    params(("userId" = u64, Path, description = "Author id")),
    responses((status = 200, description = "Newest first", body = Vec<Post>)),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn posts_by_user(
    State(state): State<AppState>,
    ResourceId(user_id): ResourceId,
) -> Result<Json<Vec<Post>>> {
    Ok(Json(state.store.posts_by_user(user_id).await?))
}

/// Like a post
#[utoipa::path(
    post,
    path = "/posts/{postId}/like",
    params(("postId" = u64, Path, description = "Post id")),
    responses(
        (status = 204, description = "Like recorded"),
        (status = 404, description = "No such post", body = crate::types::ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn like_post(
    State(state): State<AppState>,
    ResourceId(post_id): ResourceId,
) -> Result<StatusCode> {
    if !state.store.like_post(post_id).await? {
        return Err(post_not_found(post_id));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Remove a like from a post
#[utoipa::path(
    post,
    path = "/posts/{postId}/unlike",
    params(("postId" = u64, Path, description = "Post id")),
    responses(
        (status = 204, description = "Like removed"),
        (status = 404, description = "No such post", body = crate::types::ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn unlike_post(
    State(state): State<AppState>,
    ResourceId(post_id): ResourceId,
) -> Result<StatusCode> {
    if !state.store.unlike_post(post_id).await? {
        return Err(post_not_found(post_id));
    }
    Ok(StatusCode::NO_CONTENT)
}
