//! HTTP API
//!
//! The REST layer, built on axum.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - request handlers per resource
//! - [`api::routes`](crate::api::routes) - route table and router assembly
//! - [`api::pipeline`](crate::api::pipeline) - per-route interceptor stages
//! - [`api::extract`](crate::api::extract) - body and path extractors
//! - [`api::openapi`](crate::api::openapi) - OpenAPI document
//!
//! # API Endpoints
//!
//! ## Authentication
//! - `POST /login` - exchange email and password for a token
//!
//! ## Users
//! - `POST /users` - register (public)
//! - `GET /users?user=<term>` - search by name or nick
//! - `GET|PUT|DELETE /users/{userId}`
//! - `POST /users/{userId}/follow`, `POST /users/{userId}/unfollow`
//! - `GET /users/{userId}/followers`, `GET /users/{userId}/following`
//! - `POST /users/{userId}/update-password`
//! - `GET /users/{userId}/posts`
//!
//! ## Posts
//! - `POST /posts`, `GET /posts` (feed)
//! - `GET|PUT|DELETE /posts/{postId}`
//! - `POST /posts/{postId}/like`, `POST /posts/{postId}/unlike`
//!
//! ## Service
//! - `GET /health`
//! - `GET /api-docs/openapi.json`
//!
//! Everything except login, registration and the service routes requires
//! `Authorization: Bearer <token>`.

/// Body and path extractors mapped onto `AppError`.
pub mod extract;
/// Request and response handlers for all API endpoints.
pub mod handlers;
/// OpenAPI document.
pub mod openapi;
/// Interceptor pipeline applied around each route.
pub mod pipeline;
/// Router configuration and route definitions.
pub mod routes;
