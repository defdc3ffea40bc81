//! Repository pattern implementation for data access layer
//!
//! Each repository owns its SQL and runs it on the pool through
//! [`DatabaseManager::execute`].

use crate::core::error::Result;
use crate::db::manager::DatabaseManager;
use crate::db::models::{CoverRecord, User};
use rusqlite::{ErrorCode, OptionalExtension};
use std::sync::Arc;

/// Repository for User entities
pub struct UserRepository {
    db: Arc<DatabaseManager>,
}

impl UserRepository {
    /// Create a new UserRepository
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Find a user by username
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let username = username.to_string();
        self.db
            .execute(move |conn| {
                Ok(conn
                    .query_row(
                        "SELECT id, username, password_hash, created_at
                         FROM users
                         WHERE username = ?",
                        [&username],
                        |row| {
                            Ok(User {
                                id: row.get(0)?,
                                username: row.get(1)?,
                                password_hash: row.get(2)?,
                                created_at: row.get(3)?,
                            })
                        },
                    )
                    .optional()?)
            })
            .await
    }

    /// Insert a user unless the username is taken
    ///
    /// Returns `false` when the unique constraint on `username` rejected the row.
    pub async fn insert_unique(&self, user: &User) -> Result<bool> {
        let user = user.clone();
        self.db
            .execute(move |conn| {
                let inserted = conn.execute(
                    "INSERT INTO users (id, username, password_hash, created_at)
                     VALUES (?, ?, ?, ?)",
                    rusqlite::params![
                        &user.id,
                        &user.username,
                        &user.password_hash,
                        &user.created_at
                    ],
                );
                match inserted {
                    Ok(_) => Ok(true),
                    Err(rusqlite::Error::SqliteFailure(e, _))
                        if e.code == ErrorCode::ConstraintViolation =>
                    {
                        Ok(false)
                    }
                    Err(e) => Err(e.into()),
                }
            })
            .await
    }
}

/// Repository for the cover cache table
pub struct CoverRepository {
    db: Arc<DatabaseManager>,
}

impl CoverRepository {
    /// Create a new CoverRepository
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Exact, case-sensitive lookup by (title, author)
    pub async fn find(&self, title: &str, author: &str) -> Result<Option<CoverRecord>> {
        let title = title.to_string();
        let author = author.to_string();
        self.db
            .execute(move |conn| {
                Ok(conn
                    .query_row(
                        "SELECT title, author, cover_url, updated_at FROM covers \
                         WHERE title = ? AND IFNULL(author, '') = ?",
                        [&title, &author],
                        |row| {
                            Ok(CoverRecord {
                                title: row.get(0)?,
                                author: row.get(1)?,
                                cover_url: row.get(2)?,
                                updated_at: row.get(3)?,
                            })
                        },
                    )
                    .optional()?)
            })
            .await
    }

    /// Insert or overwrite the entry for (title, author)
    pub async fn upsert(&self, title: &str, author: &str, cover_url: Option<&str>) -> Result<()> {
        let title = title.to_string();
        let author = author.to_string();
        let cover_url = cover_url.map(str::to_string);
        let updated_at = chrono::Utc::now().to_rfc3339();
        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO covers (title, author, cover_url, updated_at) VALUES (?, ?, ?, ?) \
                     ON CONFLICT(title, author) DO UPDATE SET \
                         cover_url = excluded.cover_url, \
                         updated_at = excluded.updated_at",
                    rusqlite::params![&title, &author, &cover_url, &updated_at],
                )?;
                Ok(())
            })
            .await
    }
}
