use crate::db::traits::SocialStore;
use crate::types::{AppError, Credentials, NewUser, Post, PostInput, Result, User, UserUpdate};
use crate::utils::toml_config::DatabaseConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{params::IntoParams, Builder, Connection, Database, Row};
use std::path::Path;
use tracing::info;

const MEMORY_URL: &str = ":memory:";

const USER_COLUMNS: &str = "u.id, u.name, u.nick, u.email, u.created_at";

const POST_SELECT: &str = "SELECT p.id, p.title, p.content, p.author_id, u.nick, p.likes, p.created_at
     FROM posts p
     INNER JOIN users u ON u.id = p.author_id";

fn db_err(e: libsql::Error) -> AppError {
    AppError::Database(e.to_string())
}

fn sql_id(id: u64) -> Result<i64> {
    i64::try_from(id).map_err(|_| AppError::InvalidInput(format!("Identifier out of range: {}", id)))
}

fn unsigned(value: i64) -> Result<u64> {
    u64::try_from(value)
        .map_err(|_| AppError::Database(format!("Unexpected negative value: {}", value)))
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| AppError::Database(format!("Invalid timestamp: {}", secs)))
}

fn row_to_user(row: &Row) -> Result<User> {
    Ok(User {
        id: unsigned(row.get::<i64>(0).map_err(db_err)?)?,
        name: row.get(1).map_err(db_err)?,
        nick: row.get(2).map_err(db_err)?,
        email: row.get(3).map_err(db_err)?,
        created_at: timestamp(row.get::<i64>(4).map_err(db_err)?)?,
    })
}

fn row_to_post(row: &Row) -> Result<Post> {
    Ok(Post {
        id: unsigned(row.get::<i64>(0).map_err(db_err)?)?,
        title: row.get(1).map_err(db_err)?,
        content: row.get(2).map_err(db_err)?,
        author_id: unsigned(row.get::<i64>(3).map_err(db_err)?)?,
        author_nick: row.get(4).map_err(db_err)?,
        likes: unsigned(row.get::<i64>(5).map_err(db_err)?)?,
        created_at: timestamp(row.get::<i64>(6).map_err(db_err)?)?,
    })
}

async fn fetch_posts(conn: &Connection, sql: &str, params: impl IntoParams) -> Result<Vec<Post>> {
    let mut rows = conn.query(sql, params).await.map_err(db_err)?;

    let mut posts = Vec::new();
    while let Some(row) = rows.next().await.map_err(db_err)? {
        posts.push(row_to_post(&row)?);
    }
    Ok(posts)
}

fn is_constraint(e: &libsql::Error, kind: &str) -> bool {
    e.to_string().contains(&format!("{} constraint failed", kind))
}

/// libsql-backed implementation of [`SocialStore`].
///
/// File databases hand out a fresh connection per operation; an in-memory
/// database only lives as long as its connection, so one is kept and shared.
pub struct TursoClient {
    db: Database,
    shared: Option<Connection>,
}

impl TursoClient {
    /// Opens an ephemeral in-memory database.
    pub async fn new_memory() -> Result<Self> {
        let db = Builder::new_local(MEMORY_URL)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open in-memory database: {}", e)))?;
        let conn = db.connect().map_err(db_err)?;

        let client = Self {
            db,
            shared: Some(conn),
        };
        client.initialize_schema().await?;

        Ok(client)
    }

    /// Opens (creating if needed) a SQLite file at `path`.
    pub async fn new_local(path: &str) -> Result<Self> {
        if path == MEMORY_URL {
            return Self::new_memory().await;
        }

        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::Database(format!("Failed to create {}: {}", parent.display(), e))
                })?;
            }
        }

        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open {}: {}", path, e)))?;

        let client = Self { db, shared: None };
        client.initialize_schema().await?;

        Ok(client)
    }

    pub async fn from_config(config: &DatabaseConfig) -> Result<Self> {
        info!(url = %config.url, "opening database");
        Self::new_local(&config.url).await
    }

    /// Acquires a connection with foreign keys enforced. It is released when
    /// the returned value is dropped.
    pub async fn connection(&self) -> Result<Connection> {
        if let Some(conn) = &self.shared {
            return Ok(conn.clone());
        }

        let conn = self
            .db
            .connect()
            .map_err(|e| AppError::Database(format!("Failed to get connection: {}", e)))?;
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(db_err)?;

        Ok(conn)
    }

    async fn initialize_schema(&self) -> Result<()> {
        let conn = self.connection().await?;

        if self.shared.is_some() {
            conn.execute("PRAGMA foreign_keys = ON", ())
                .await
                .map_err(db_err)?;
        }

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                nick TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )",
            (),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create users table: {}", e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS followers (
                user_id INTEGER NOT NULL,
                follower_id INTEGER NOT NULL,
                PRIMARY KEY (user_id, follower_id),
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (follower_id) REFERENCES users(id) ON DELETE CASCADE
            )",
            (),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create followers table: {}", e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                author_id INTEGER NOT NULL,
                likes INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE CASCADE
            )",
            (),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create posts table: {}", e)))?;

        Ok(())
    }

    async fn query_users(&self, sql: &str, id: u64) -> Result<Vec<User>> {
        let conn = self.connection().await?;
        let mut rows = conn.query(sql, [sql_id(id)?]).await.map_err(db_err)?;

        let mut users = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_err)? {
            users.push(row_to_user(&row)?);
        }
        Ok(users)
    }

    async fn query_posts(&self, sql: &str, params: impl IntoParams) -> Result<Vec<Post>> {
        let conn = self.connection().await?;
        fetch_posts(&conn, sql, params).await
    }
}

#[async_trait]
impl SocialStore for TursoClient {
    async fn create_user(&self, user: &NewUser, password_hash: &str) -> Result<User> {
        let conn = self.connection().await?;
        let now = Utc::now().timestamp();

        conn.execute(
            "INSERT INTO users (name, nick, email, password, created_at)
             VALUES (?, ?, ?, ?, ?)",
            (
                user.name.as_str(),
                user.nick.as_str(),
                user.email.as_str(),
                password_hash,
                now,
            ),
        )
        .await
        .map_err(|e| {
            if is_constraint(&e, "UNIQUE") {
                AppError::InvalidInput("Nick or email already in use".to_string())
            } else {
                AppError::Database(format!("Failed to create user: {}", e))
            }
        })?;
        let id = unsigned(conn.last_insert_rowid())?;

        info!(user_id = id, nick = %user.nick, "user created");

        Ok(User {
            id,
            name: user.name.clone(),
            nick: user.nick.clone(),
            email: user.email.clone(),
            created_at: timestamp(now)?,
        })
    }

    async fn search_users(&self, name_or_nick: &str) -> Result<Vec<User>> {
        let conn = self.connection().await?;
        let pattern = format!("%{}%", name_or_nick.to_lowercase());

        let mut rows = conn
            .query(
                &format!(
                    "SELECT {} FROM users u
                     WHERE lower(u.name) LIKE ? OR lower(u.nick) LIKE ?
                     ORDER BY u.id",
                    USER_COLUMNS
                ),
                (pattern.as_str(), pattern.as_str()),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to search users: {}", e)))?;

        let mut users = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_err)? {
            users.push(row_to_user(&row)?);
        }
        Ok(users)
    }

    async fn get_user(&self, id: u64) -> Result<Option<User>> {
        let users = self
            .query_users(
                &format!("SELECT {} FROM users u WHERE u.id = ?", USER_COLUMNS),
                id,
            )
            .await?;
        Ok(users.into_iter().next())
    }

    async fn find_credentials(&self, email: &str) -> Result<Option<Credentials>> {
        let conn = self.connection().await?;

        let mut rows = conn
            .query("SELECT id, password FROM users WHERE email = ?", [email])
            .await
            .map_err(|e| AppError::Database(format!("Failed to query user: {}", e)))?;

        match rows.next().await.map_err(db_err)? {
            Some(row) => Ok(Some(Credentials {
                id: unsigned(row.get::<i64>(0).map_err(db_err)?)?,
                password_hash: row.get(1).map_err(db_err)?,
            })),
            None => Ok(None),
        }
    }

    async fn update_user(&self, id: u64, update: &UserUpdate) -> Result<bool> {
        let conn = self.connection().await?;

        let affected = conn
            .execute(
                "UPDATE users SET name = ?, nick = ?, email = ? WHERE id = ?",
                (
                    update.name.as_str(),
                    update.nick.as_str(),
                    update.email.as_str(),
                    sql_id(id)?,
                ),
            )
            .await
            .map_err(|e| {
                if is_constraint(&e, "UNIQUE") {
                    AppError::InvalidInput("Nick or email already in use".to_string())
                } else {
                    AppError::Database(format!("Failed to update user: {}", e))
                }
            })?;

        Ok(affected > 0)
    }

    async fn delete_user(&self, id: u64) -> Result<bool> {
        let conn = self.connection().await?;

        let affected = conn
            .execute("DELETE FROM users WHERE id = ?", [sql_id(id)?])
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete user: {}", e)))?;

        if affected > 0 {
            info!(user_id = id, "user deleted");
        }
        Ok(affected > 0)
    }

    async fn follow(&self, user_id: u64, follower_id: u64) -> Result<()> {
        let conn = self.connection().await?;

        conn.execute(
            "INSERT OR IGNORE INTO followers (user_id, follower_id) VALUES (?, ?)",
            (sql_id(user_id)?, sql_id(follower_id)?),
        )
        .await
        .map_err(|e| {
            if is_constraint(&e, "FOREIGN KEY") {
                AppError::NotFound(format!("User {} not found", user_id))
            } else {
                AppError::Database(format!("Failed to follow user: {}", e))
            }
        })?;

        Ok(())
    }

    async fn unfollow(&self, user_id: u64, follower_id: u64) -> Result<()> {
        let conn = self.connection().await?;

        conn.execute(
            "DELETE FROM followers WHERE user_id = ? AND follower_id = ?",
            (sql_id(user_id)?, sql_id(follower_id)?),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to unfollow user: {}", e)))?;

        Ok(())
    }

    async fn followers(&self, user_id: u64) -> Result<Vec<User>> {
        self.query_users(
            &format!(
                "SELECT {} FROM users u
                 INNER JOIN followers f ON u.id = f.follower_id
                 WHERE f.user_id = ?
                 ORDER BY u.id",
                USER_COLUMNS
            ),
            user_id,
        )
        .await
    }

    async fn following(&self, user_id: u64) -> Result<Vec<User>> {
        self.query_users(
            &format!(
                "SELECT {} FROM users u
                 INNER JOIN followers f ON u.id = f.user_id
                 WHERE f.follower_id = ?
                 ORDER BY u.id",
                USER_COLUMNS
            ),
            user_id,
        )
        .await
    }

    async fn password_hash(&self, user_id: u64) -> Result<Option<String>> {
        let conn = self.connection().await?;

        let mut rows = conn
            .query("SELECT password FROM users WHERE id = ?", [sql_id(user_id)?])
            .await
            .map_err(|e| AppError::Database(format!("Failed to query password: {}", e)))?;

        match rows.next().await.map_err(db_err)? {
            Some(row) => Ok(Some(row.get(0).map_err(db_err)?)),
            None => Ok(None),
        }
    }

    async fn update_password(&self, user_id: u64, password_hash: &str) -> Result<()> {
        let conn = self.connection().await?;

        conn.execute(
            "UPDATE users SET password = ? WHERE id = ?",
            (password_hash, sql_id(user_id)?),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to update password: {}", e)))?;

        info!(user_id, "password updated");
        Ok(())
    }

    async fn create_post(&self, author_id: u64, post: &PostInput) -> Result<Post> {
        let conn = self.connection().await?;
        let now = Utc::now().timestamp();

        conn.execute(
            "INSERT INTO posts (title, content, author_id, created_at)
             VALUES (?, ?, ?, ?)",
            (
                post.title.as_str(),
                post.content.as_str(),
                sql_id(author_id)?,
                now,
            ),
        )
        .await
        .map_err(|e| {
            if is_constraint(&e, "FOREIGN KEY") {
                AppError::NotFound(format!("User {} not found", author_id))
            } else {
                AppError::Database(format!("Failed to create post: {}", e))
            }
        })?;
        let id = conn.last_insert_rowid();

        info!(post_id = id, author_id, "post created");

        // Read back on the inserting connection
        fetch_posts(&conn, &format!("{} WHERE p.id = ?", POST_SELECT), [id])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Database(format!("Post {} missing after insert", id)))
    }

    async fn get_post(&self, id: u64) -> Result<Option<Post>> {
        let posts = self
            .query_posts(&format!("{} WHERE p.id = ?", POST_SELECT), [sql_id(id)?])
            .await?;
        Ok(posts.into_iter().next())
    }

    async fn post_author(&self, id: u64) -> Result<Option<u64>> {
        let conn = self.connection().await?;

        let mut rows = conn
            .query("SELECT author_id FROM posts WHERE id = ?", [sql_id(id)?])
            .await
            .map_err(|e| AppError::Database(format!("Failed to query post: {}", e)))?;

        match rows.next().await.map_err(db_err)? {
            Some(row) => Ok(Some(unsigned(row.get::<i64>(0).map_err(db_err)?)?)),
            None => Ok(None),
        }
    }

    async fn feed(&self, user_id: u64) -> Result<Vec<Post>> {
        let id = sql_id(user_id)?;
        self.query_posts(
            "SELECT DISTINCT p.id, p.title, p.content, p.author_id, u.nick, p.likes, p.created_at
             FROM posts p
             INNER JOIN users u ON u.id = p.author_id
             LEFT JOIN followers f ON p.author_id = f.user_id
             WHERE p.author_id = ? OR f.follower_id = ?
             ORDER BY p.created_at DESC, p.id DESC",
            [id, id],
        )
        .await
    }

    async fn posts_by_user(&self, user_id: u64) -> Result<Vec<Post>> {
        self.query_posts(
            &format!(
                "{} WHERE p.author_id = ? ORDER BY p.created_at DESC, p.id DESC",
                POST_SELECT
            ),
            [sql_id(user_id)?],
        )
        .await
    }

    async fn update_post(&self, id: u64, post: &PostInput) -> Result<bool> {
        let conn = self.connection().await?;

        let affected = conn
            .execute(
                "UPDATE posts SET title = ?, content = ? WHERE id = ?",
                (post.title.as_str(), post.content.as_str(), sql_id(id)?),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to update post: {}", e)))?;

        Ok(affected > 0)
    }

    async fn delete_post(&self, id: u64) -> Result<bool> {
        let conn = self.connection().await?;

        let affected = conn
            .execute("DELETE FROM posts WHERE id = ?", [sql_id(id)?])
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete post: {}", e)))?;

        Ok(affected > 0)
    }

    async fn like_post(&self, id: u64) -> Result<bool> {
        let conn = self.connection().await?;

        let affected = conn
            .execute("UPDATE posts SET likes = likes + 1 WHERE id = ?", [sql_id(id)?])
            .await
            .map_err(|e| AppError::Database(format!("Failed to like post: {}", e)))?;

        Ok(affected > 0)
    }

    async fn unlike_post(&self, id: u64) -> Result<bool> {
        let conn = self.connection().await?;

        let affected = conn
            .execute(
                "UPDATE posts SET likes = CASE WHEN likes > 0 THEN likes - 1 ELSE 0 END
                 WHERE id = ?",
                [sql_id(id)?],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to unlike post: {}", e)))?;

        Ok(affected > 0)
    }
}
