//! # DevBook API
//!
//! A REST API for a small social network: user accounts, posts, likes and a
//! follow graph, secured with HS256 bearer tokens.
//!
//! ## Overview
//!
//! Requests flow through a per-route interceptor pipeline (request logging,
//! then the auth gate for protected routes), into handlers that apply
//! ownership rules against the authenticated subject, and finally into a
//! [`SocialStore`] backed by libsql.
//!
//! ```rust,ignore
//! use devbook::{api::routes::build_app, AppState, DevbookConfig, TokenService, TursoClient};
//! use std::sync::Arc;
//!
//! let config = DevbookConfig::default();
//! let store = TursoClient::from_config(&config.database).await?;
//! let tokens = TokenService::new(&config.secret_key()?);
//! let app = build_app(AppState::new(config, Arc::new(store), tokens));
//! ```
//!
//! ## Modules
//!
//! - [`api`] - REST handlers, routes and the interceptor pipeline
//! - [`auth`] - password hashing, tokens, auth gate and ownership checks
//! - [`db`] - storage trait and libsql implementation
//! - [`types`] - entities, request bodies and error handling
//! - [`utils`] - configuration
//! - [`cli`] - command-line interface

#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Authentication and authorization.
pub mod auth;
/// Command-line interface.
pub mod cli;
/// Storage trait and libsql client.
pub mod db;
/// Core types (entities, requests, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

pub use auth::jwt::TokenService;
pub use db::{SocialStore, TursoClient};
pub use types::{AppError, Result};
pub use utils::toml_config::DevbookConfig;

use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Resolved configuration, fixed for the process lifetime
    pub config: Arc<DevbookConfig>,
    /// Storage backend
    pub store: Arc<dyn SocialStore>,
    /// Token issuance and validation
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(config: DevbookConfig, store: Arc<dyn SocialStore>, tokens: TokenService) -> Self {
        Self {
            config: Arc::new(config),
            store,
            tokens: Arc::new(tokens),
        }
    }
}
