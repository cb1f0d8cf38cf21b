//! API request handlers.
//!
//! Handlers validate input, apply ownership rules against the authenticated
//! subject and delegate to [`SocialStore`](crate::db::SocialStore).

/// Login.
pub mod auth;
/// Post CRUD, feed and likes.
pub mod posts;
/// User accounts and the follow graph.
pub mod users;
