//! Relational storage.
//!
//! - [`traits`] - the [`SocialStore`] abstraction handlers depend on
//! - [`turso`] - libsql (SQLite) implementation, file-backed or in-memory

pub mod traits;
pub mod turso;

pub use traits::SocialStore;
pub use turso::TursoClient;
