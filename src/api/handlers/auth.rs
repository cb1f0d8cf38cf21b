use crate::{
    api::extract::JsonBody,
    auth::password,
    types::{AppError, LoginRequest, LoginResponse, Result},
    AppState,
};
use axum::{extract::State, Json};
use tracing::info;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

fn invalid_credentials() -> AppError {
    AppError::CredentialMismatch(INVALID_CREDENTIALS.to_string())
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Missing email or password", body = crate::types::ErrorBody),
        (status = 401, description = "Invalid credentials", body = crate::types::ErrorBody)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    payload.validate()?;

    // Unknown email and wrong password look the same: same body, same hashing work
    let credentials = match state.store.find_credentials(payload.email.trim()).await? {
        Some(credentials) => credentials,
        None => {
            password::verify_dummy(&payload.password);
            return Err(invalid_credentials());
        }
    };

    password::verify(&credentials.password_hash, &payload.password).map_err(|e| match e {
        AppError::CredentialMismatch(_) => invalid_credentials(),
        other => other,
    })?;

    let token = state.tokens.issue(credentials.id)?;
    info!(user_id = credentials.id, "user logged in");

    Ok(Json(LoginResponse {
        id: credentials.id,
        token,
    }))
}
