//! Database migrations
//!
//! Schema changes are applied in order and recorded in `schema_migrations`.

use crate::core::error::Result;
use rusqlite::Connection;
use tracing::{info, warn};

/// Migration version tracking table
const MIGRATION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    applied_at DATETIME DEFAULT CURRENT_TIMESTAMP
)
"#;

/// Initial schema migration (version 1)
const MIGRATION_V1: &str = r#"
-- Users table (authentication)
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    username TEXT UNIQUE NOT NULL,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL
);
"#;

/// Second schema migration (version 2)
const MIGRATION_V2: &str = r#"
-- Cover cache: one row per (title, author); NULL cover_url records a lookup that found nothing
CREATE TABLE IF NOT EXISTS covers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    author TEXT NOT NULL DEFAULT '',
    cover_url TEXT,
    updated_at TEXT NOT NULL,
    UNIQUE(title, author)
);
"#;

const MIGRATIONS: &[(i64, &str, &str)] = &[
    (1, "Initial schema", MIGRATION_V1),
    (2, "Cover cache", MIGRATION_V2),
];

/// Highest schema version known to this build
pub const LATEST_VERSION: i64 = 2;

/// Run all pending database migrations
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(MIGRATION_TABLE)?;

    let current_version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    info!("Current database schema version: {}", current_version);

    for (version, name, sql) in MIGRATIONS {
        if current_version < *version {
            info!("Applying migration v{}: {}", version, name);
            apply_migration(conn, *version, sql)?;
        }
    }

    Ok(())
}

/// Apply a single migration
fn apply_migration(conn: &mut Connection, version: i64, sql: &str) -> Result<()> {
    let tx = conn.transaction()?;

    tx.execute_batch(sql).map_err(|e| {
        warn!("Migration v{} failed: {}", version, e);
        e
    })?;

    tx.execute("INSERT INTO schema_migrations (version) VALUES (?)", [version])?;

    tx.commit()?;

    info!("Migration v{} applied successfully", version);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_version_matches_migration_list() {
        assert_eq!(MIGRATIONS.last().map(|(v, _, _)| *v), Some(LATEST_VERSION));
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        run_migrations(&mut conn).unwrap();

        let applied: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(applied, LATEST_VERSION);
    }

    #[test]
    fn test_cover_key_is_unique() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();

        conn.execute(
            "INSERT INTO covers (title, author, cover_url, updated_at)
             VALUES ('Dune', 'Herbert', NULL, 'now')",
            [],
        )
        .unwrap();
        let duplicate = conn.execute(
            "INSERT INTO covers (title, author, cover_url, updated_at)
             VALUES ('Dune', 'Herbert', 'x', 'now')",
            [],
        );
        assert!(duplicate.is_err());
    }
}
