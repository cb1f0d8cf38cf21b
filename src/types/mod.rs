use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use utoipa::ToSchema;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern is valid")
});

fn field_is_empty(field: &str) -> AppError {
    AppError::InvalidInput(format!(
        "The field {} is needed and cannot be empty",
        field
    ))
}

fn require(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(field_is_empty(field));
    }
    Ok(trimmed.to_string())
}

fn require_email(value: &str) -> Result<String> {
    let email = require("email", value)?;
    if !EMAIL_REGEX.is_match(&email) {
        return Err(AppError::InvalidInput(format!(
            "Invalid email format: {}",
            email
        )));
    }
    Ok(email)
}

// ============= User Types =============

/// A user as exposed by the API. The password hash never leaves the store
/// through this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub name: String,
    pub nick: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Registration payload for `POST /users`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct NewUser {
    pub name: String,
    pub nick: String,
    pub email: String,
    pub password: String,
}

impl NewUser {
    /// Validates required fields and returns a trimmed copy.
    ///
    /// The password is checked for presence only and kept verbatim.
    pub fn prepare(self) -> Result<Self> {
        let name = require("name", &self.name)?;
        let nick = require("nick", &self.nick)?;
        let email = require_email(&self.email)?;
        if self.password.is_empty() {
            return Err(field_is_empty("password"));
        }

        Ok(Self {
            name,
            nick,
            email,
            password: self.password,
        })
    }
}

/// Profile update payload for `PUT /users/{userId}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(default)]
pub struct UserUpdate {
    pub name: String,
    pub nick: String,
    pub email: String,
}

impl UserUpdate {
    pub fn prepare(self) -> Result<Self> {
        Ok(Self {
            name: require("name", &self.name)?,
            nick: require("nick", &self.nick)?,
            email: require_email(&self.email)?,
        })
    }
}

/// Payload for `POST /users/{userId}/update-password`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct PasswordChange {
    pub current: String,
    pub new: String,
}

impl PasswordChange {
    pub fn validate(&self) -> Result<()> {
        if self.new.is_empty() {
            return Err(field_is_empty("new"));
        }
        Ok(())
    }
}

/// Query string of `GET /users`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserSearch {
    pub user: String,
}

/// Stored login material for a user, only used by the login flow.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub id: u64,
    pub password_hash: String,
}

// ============= Post Types =============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: u64,
    pub title: String,
    pub content: String,
    pub author_id: u64,
    pub author_nick: String,
    pub likes: u64,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /posts` and `PUT /posts/{postId}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(default)]
pub struct PostInput {
    pub title: String,
    pub content: String,
}

impl PostInput {
    pub fn prepare(self) -> Result<Self> {
        Ok(Self {
            title: require("title", &self.title)?,
            content: require("content", &self.content)?,
        })
    }
}

// ============= Authentication Types =============

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<()> {
        if self.email.trim().is_empty() {
            return Err(field_is_empty("email"));
        }
        if self.password.is_empty() {
            return Err(field_is_empty("password"));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub id: u64,
    pub token: String,
}

// ============= Error Types =============

/// JSON body of every error response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    /// Missing, malformed or expired bearer token.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Invalid credentials: {0}")]
    CredentialMismatch(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The request body could not be read at all.
    #[error("Unprocessable entity: {0}")]
    Unprocessable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;

        match self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            AppError::CredentialMismatch(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let message = match self {
            AppError::Database(msg)
            | AppError::InvalidToken(msg)
            | AppError::CredentialMismatch(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::InvalidInput(msg)
            | AppError::Unprocessable(msg)
            | AppError::Internal(msg) => msg,
        };

        (status, axum::Json(ErrorBody { error: message })).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
