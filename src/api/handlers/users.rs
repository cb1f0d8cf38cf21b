use crate::{
    api::extract::{JsonBody, ResourceId},
    auth::{
        middleware::AuthUser,
        ownership::{ensure_not_self, ensure_owner},
        password,
    },
    types::{AppError, NewUser, PasswordChange, Result, User, UserSearch, UserUpdate},
    AppState,
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;

fn user_not_found(id: u64) -> AppError {
    AppError::NotFound(format!("User {} not found", id))
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/users",
    request_body = NewUser,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Missing field, bad email or nick/email in use", body = crate::types::ErrorBody),
        (status = 422, description = "Unreadable body", body = crate::types::ErrorBody)
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<NewUser>,
) -> Result<(StatusCode, Json<User>)> {
    let user = payload.prepare()?;
    let password_hash = password::hash(&user.password)?;

    let created = state.store.create_user(&user, &password_hash).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Search users by name or nick
#[utoipa::path(
    get,
    path = "/users",
    params(("user" = Option<String>, Query, description = "Substring of name or nick")),
    responses(
        (status = 200, description = "Matching users", body = Vec<User>),
        (status = 401, description = "Missing or invalid token", body = crate::types::ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn search_users(
    State(state): State<AppState>,
    Query(query): Query<UserSearch>,
) -> Result<Json<Vec<User>>> {
    let users = state.store.search_users(query.user.trim()).await?;
    Ok(Json(users))
}

/// Get a user by id
#[utoipa::path(
    get,
    path = "/users/{userId}",
    params(("userId" = u64, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = User),
        (status = 404, description = "No such user", body = crate::types::ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    ResourceId(user_id): ResourceId,
) -> Result<Json<User>> {
    state
        .store
        .get_user(user_id)
        .await?
        .map(Json)
        .ok_or_else(|| user_not_found(user_id))
}

/// Update your own profile
#[utoipa::path(
    put,
    path = "/users/{userId}",
    params(("userId" = u64, Path, description = "User id")),
    request_body = UserUpdate,
    responses(
        (status = 204, description = "Profile updated"),
        (status = 400, description = "Invalid input", body = crate::types::ErrorBody),
        (status = 403, description = "Not your account", body = crate::types::ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(subject): AuthUser,
    ResourceId(user_id): ResourceId,
    JsonBody(payload): JsonBody<UserUpdate>,
) -> Result<StatusCode> {
    ensure_owner(
        subject,
        user_id,
        "It is not possible to update a user other than yourself",
    )?;
    let update = payload.prepare()?;

    if !state.store.update_user(user_id, &update).await? {
        return Err(user_not_found(user_id));
    }

    info!(user_id, "user updated");
    Ok(StatusCode::NO_CONTENT)
}

/// Delete your own account
#[utoipa::path(
    delete,
    path = "/users/{userId}",
    params(("userId" = u64, Path, description = "User id")),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 403, description = "Not your account", body = crate::types::ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(subject): AuthUser,
    ResourceId(user_id): ResourceId,
) -> Result<StatusCode> {
    ensure_owner(
        subject,
        user_id,
        "It is not possible to delete a user other than yourself",
    )?;

    if !state.store.delete_user(user_id).await? {
        return Err(user_not_found(user_id));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Follow a user
#[utoipa::path(
    post,
    path = "/users/{userId}/follow",
    params(("userId" = u64, Path, description = "User to follow")),
    responses(
        (status = 204, description = "Now following"),
        (status = 403, description = "Cannot follow yourself", body = crate::types::ErrorBody),
        (status = 404, description = "No such user", body = crate::types::ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn follow_user(
    State(state): State<AppState>,
    AuthUser(follower_id): AuthUser,
    ResourceId(user_id): ResourceId,
) -> Result<StatusCode> {
    ensure_not_self(follower_id, user_id, "It is not possible to follow yourself")?;

    state.store.follow(user_id, follower_id).await?;
    info!(user_id, follower_id, "follow");

    Ok(StatusCode::NO_CONTENT)
}

/// Stop following a user
#[utoipa::path(
    post,
    path = "/users/{userId}/unfollow",
    params(("userId" = u64, Path, description = "User to unfollow")),
    responses(
        (status = 204, description = "No longer following"),
        (status = 403, description = "Cannot unfollow yourself", body = crate::types::ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn unfollow_user(
    State(state): State<AppState>,
    AuthUser(follower_id): AuthUser,
    ResourceId(user_id): ResourceId,
) -> Result<StatusCode> {
    ensure_not_self(
        follower_id,
        user_id,
        "It is not possible to unfollow yourself",
    )?;

    state.store.unfollow(user_id, follower_id).await?;
    info!(user_id, follower_id, "unfollow");

    Ok(StatusCode::NO_CONTENT)
}

/// Users following a user
#[utoipa::path(
    get,
    path = "/users/{userId}/followers",
    params(("userId" = u64, Path, description = "User id")),
    responses((status = 200, description = "Followers", body = Vec<User>)),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn followers(
    State(state): State<AppState>,
    ResourceId(user_id): ResourceId,
) -> Result<Json<Vec<User>>> {
    Ok(Json(state.store.followers(user_id).await?))
}

/// Users a user follows
#[utoipa::path(
    get,
    path = "/users/{userId}/following",
    params(("userId" = u64, Path, description = "User id")),
    responses((status = 200, description = "Followed users", body = Vec<User>)),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn following(
    State(state): State<AppState>,
    ResourceId(user_id): ResourceId,
) -> Result<Json<Vec<User>>> {
    Ok(Json(state.store.following(user_id).await?))
}

/// Change your own password
#[utoipa::path(
    post,
    path = "/users/{userId}/update-password",
    params(("userId" = u64, Path, description = "User id")),
    request_body = PasswordChange,
    responses(
        (status = 204, description = "Password changed"),
        (status = 401, description = "Current password does not match", body = crate::types::ErrorBody),
        (status = 403, description = "Not your account", body = crate::types::ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_password(
    State(state): State<AppState>,
    AuthUser(subject): AuthUser,
    ResourceId(user_id): ResourceId,
    JsonBody(payload): JsonBody<PasswordChange>,
) -> Result<StatusCode> {
    ensure_owner(
        subject,
        user_id,
        "It is not possible to update a password other than your own",
    )?;
    payload.validate()?;

    let stored = state
        .store
        .password_hash(user_id)
        .await?
        .ok_or_else(|| user_not_found(user_id))?;

    password::verify(&stored, &payload.current)?;

    let new_hash = password::hash(&payload.new)?;
    state.store.update_password(user_id, &new_hash).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::TokenService;
    use crate::db::traits::MockSocialStore;
    use crate::utils::toml_config::DevbookConfig;
    use mockall::predicate::eq;
    use std::sync::Arc;

    fn state_with(store: MockSocialStore) -> AppState {
        AppState::new(
            DevbookConfig::default(),
            Arc::new(store),
            TokenService::new(b"users-test-secret"),
        )
    }

    #[tokio::test]
    async fn test_follow_self_forbidden_without_write() {
        let mut store = MockSocialStore::new();
        store.expect_follow().never();

        let result = follow_user(State(state_with(store)), AuthUser(7), ResourceId(7)).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_unfollow_self_forbidden_without_write() {
        let mut store = MockSocialStore::new();
        store.expect_unfollow().never();

        let result = unfollow_user(State(state_with(store)), AuthUser(7), ResourceId(7)).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_follow_records_subject_as_follower() {
        let mut store = MockSocialStore::new();
        store
            .expect_follow()
            .with(eq(8), eq(7))
            .times(1)
            .returning(|_, _| Ok(()));

        let status = follow_user(State(state_with(store)), AuthUser(7), ResourceId(8))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_update_other_user_forbidden() {
        let mut store = MockSocialStore::new();
        store.expect_update_user().never();

        let payload = UserUpdate {
            name: "Mallory".to_string(),
            nick: "mallory".to_string(),
            email: "mallory@example.com".to_string(),
        };
        let result = update_user(
            State(state_with(store)),
            AuthUser(1),
            ResourceId(2),
            JsonBody(payload),
        )
        .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_delete_self() {
        let mut store = MockSocialStore::new();
        store
            .expect_delete_user()
            .with(eq(3))
            .returning(|_| Ok(true));

        let status = delete_user(State(state_with(store)), AuthUser(3), ResourceId(3))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_delete_other_user_forbidden() {
        let mut store = MockSocialStore::new();
        store.expect_delete_user().never();

        let result = delete_user(State(state_with(store)), AuthUser(3), ResourceId(4)).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_get_missing_user_not_found() {
        let mut store = MockSocialStore::new();
        store.expect_get_user().returning(|_| Ok(None));

        let result = get_user(State(state_with(store)), ResourceId(99)).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_password_wrong_current() {
        let stored = password::hash("old-password").unwrap();
        let mut store = MockSocialStore::new();
        store
            .expect_password_hash()
            .returning(move |_| Ok(Some(stored.clone())));
        store.expect_update_password().never();

        let result = update_password(
            State(state_with(store)),
            AuthUser(5),
            ResourceId(5),
            JsonBody(PasswordChange {
                current: "guess".to_string(),
                new: "new-password".to_string(),
            }),
        )
        .await;

        assert!(matches!(result, Err(AppError::CredentialMismatch(_))));
    }

    #[tokio::test]
    async fn test_update_password_stores_new_hash() {
        let stored = password::hash("old-password").unwrap();
        let mut store = MockSocialStore::new();
        store
            .expect_password_hash()
            .with(eq(5))
            .returning(move |_| Ok(Some(stored.clone())));
        store
            .expect_update_password()
            .withf(|user_id, hash| *user_id == 5 && password::verify(hash, "new-password").is_ok())
            .times(1)
            .returning(|_, _| Ok(()));

        let status = update_password(
            State(state_with(store)),
            AuthUser(5),
            ResourceId(5),
            JsonBody(PasswordChange {
                current: "old-password".to_string(),
                new: "new-password".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_update_password_of_other_user_forbidden() {
        let mut store = MockSocialStore::new();
        store.expect_password_hash().never();

        let result = update_password(
            State(state_with(store)),
            AuthUser(5),
            ResourceId(6),
            JsonBody(PasswordChange {
                current: "a".to_string(),
                new: "b".to_string(),
            }),
        )
        .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
