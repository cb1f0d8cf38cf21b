//! Authentication and authorization
//!
//! # Module Structure
//!
//! - [`auth::password`](crate::auth::password) - Argon2id password hashing and verification
//! - [`auth::jwt`](crate::auth::jwt) - bearer token issuance, validation and subject extraction
//! - [`auth::middleware`](crate::auth::middleware) - the auth gate and the `AuthUser` extractor
//! - [`auth::ownership`](crate::auth::ownership) - ownership checks used by handlers
//!
//! # Tokens
//!
//! Tokens are HS256 JWTs signed with the process-wide secret key and carry
//! `{"authorized": true, "exp": <unix seconds>, "userID": <id>}`. They are
//! valid for six hours and never stored server side. Clients send them as:
//!
//! ```text
//! Authorization: Bearer <token>
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use devbook::auth::jwt::TokenService;
//!
//! let tokens = TokenService::new(secret.as_bytes());
//! let token = tokens.issue(user_id)?;
//! let subject = tokens.extract_subject(request.headers())?;
//! ```

/// Bearer token issuance and validation.
pub mod jwt;
/// Auth gate middleware and subject extractor.
pub mod middleware;
/// Ownership checks for owned resources.
pub mod ownership;
/// Password hashing.
pub mod password;
