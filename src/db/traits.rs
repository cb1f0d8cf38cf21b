//! Storage abstraction
//!
//! Handlers talk to storage only through [`SocialStore`], so the HTTP layer
//! never builds SQL and can be exercised against a mock.
//!
//! # Example
//!
//! ```rust,ignore
//! use devbook::db::{SocialStore, TursoClient};
//!
//! let store: Arc<dyn SocialStore> = Arc::new(TursoClient::new_memory().await?);
//! let author = store.post_author(post_id).await?;
//! ```

use crate::types::{Credentials, NewUser, Post, PostInput, Result, User, UserUpdate};
use async_trait::async_trait;

/// Abstract trait for every storage operation the API needs.
///
/// `Ok(None)` / `Ok(false)` mean the addressed row does not exist; `Err` is
/// reserved for storage failures and constraint violations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SocialStore: Send + Sync {
    // ============== User Operations ==============

    /// Insert a user whose password has already been hashed.
    async fn create_user(&self, user: &NewUser, password_hash: &str) -> Result<User>;

    /// Users whose name or nick contains `name_or_nick`, case-insensitively.
    async fn search_users(&self, name_or_nick: &str) -> Result<Vec<User>>;

    async fn get_user(&self, id: u64) -> Result<Option<User>>;

    /// Login lookup by email.
    async fn find_credentials(&self, email: &str) -> Result<Option<Credentials>>;

    async fn update_user(&self, id: u64, update: &UserUpdate) -> Result<bool>;

    async fn delete_user(&self, id: u64) -> Result<bool>;

    // ============== Follow Graph ==============

    /// Record that `follower_id` follows `user_id`. Repeating it is a no-op.
    async fn follow(&self, user_id: u64, follower_id: u64) -> Result<()>;

    async fn unfollow(&self, user_id: u64, follower_id: u64) -> Result<()>;

    /// Users following `user_id`.
    async fn followers(&self, user_id: u64) -> Result<Vec<User>>;

    /// Users that `user_id` follows.
    async fn following(&self, user_id: u64) -> Result<Vec<User>>;

    // ============== Credentials ==============

    async fn password_hash(&self, user_id: u64) -> Result<Option<String>>;

    async fn update_password(&self, user_id: u64, password_hash: &str) -> Result<()>;

    // ============== Post Operations ==============

    async fn create_post(&self, author_id: u64, post: &PostInput) -> Result<Post>;

    async fn get_post(&self, id: u64) -> Result<Option<Post>>;

    /// Owner of a post, without loading its body.
    async fn post_author(&self, id: u64) -> Result<Option<u64>>;

    /// Posts by `user_id` and by everyone `user_id` follows, newest first.
    async fn feed(&self, user_id: u64) -> Result<Vec<Post>>;

    async fn posts_by_user(&self, user_id: u64) -> Result<Vec<Post>>;

    async fn update_post(&self, id: u64, post: &PostInput) -> Result<bool>;

    async fn delete_post(&self, id: u64) -> Result<bool>;

    async fn like_post(&self, id: u64) -> Result<bool>;

    /// Remove one like; the counter never drops below zero.
    async fn unlike_post(&self, id: u64) -> Result<bool>;
}
