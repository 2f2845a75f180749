//! Credential store backed by SQLite.
//!
//! Stores user records: username, password hash, display name, and the
//! per-account practice flag. Migration is applied inline via `include_str!`
//! on first open. User operations are low-frequency, so plain pool queries
//! are used throughout.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

/// A row from the `users` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Auto-increment row ID.
    pub id: i64,
    /// Unique login name.
    pub username: String,
    /// SHA-256 hex digest of the password.
    pub password_hash: String,
    /// Display name shown on the preview page. Untrusted: this is the SSTI
    /// injection point.
    pub display_name: String,
    /// Unique practice flag issued at registration.
    pub flag: String,
}

/// The museum's credential store.
pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    /// Open (or create) the credential store at the given path and apply the
    /// schema migration.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migration fails.
    pub async fn open(path: &Path) -> anyhow::Result<Self> {
        // Ensure parent directory exists.
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create db directory {}", parent.display()))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .pragma("trusted_schema", "OFF")
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect_with(options)
            .await
            .with_context(|| format!("failed to open user store at {}", path.display()))?;

        let migration_sql = include_str!("../migrations/001_museum_schema.sql");
        sqlx::raw_sql(migration_sql)
            .execute(&pool)
            .await
            .context("failed to apply museum schema migration")?;

        Ok(Self { pool })
    }

    /// Open an in-memory store. Used by tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub async fn open_in_memory() -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::new().in_memory(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .context("failed to open in-memory user store")?;

        let migration_sql = include_str!("../migrations/001_museum_schema.sql");
        sqlx::raw_sql(migration_sql)
            .execute(&pool)
            .await
            .context("failed to apply museum schema migration")?;

        Ok(Self { pool })
    }

    /// Insert a new user and return its row ID.
    ///
    /// Username and flag uniqueness are enforced by the schema; a duplicate
    /// surfaces as a database error, which callers should pre-empt with
    /// [`UserStore::username_exists`].
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails (including uniqueness violations).
    pub async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        display_name: &str,
        flag: &str,
    ) -> anyhow::Result<i64> {
        let result = sqlx::query(
            "INSERT INTO users (username, password_hash, display_name, flag) \
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(username)
        .bind(password_hash)
        .bind(display_name)
        .bind(flag)
        .execute(&self.pool)
        .await
        .context("failed to insert user")?;

        tracing::debug!(username, "user record created");
        Ok(result.last_insert_rowid())
    }

    /// Check whether a username is already taken.
    ///
    /// # Errors
    ///
    /// Returns an error if the database read fails.
    pub async fn username_exists(&self, username: &str) -> anyhow::Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE username = ?1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .context("failed to check username")?;
        Ok(row.is_some())
    }

    /// Fetch a user by login name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database read fails.
    pub async fn user_by_username(&self, username: &str) -> anyhow::Result<Option<UserRecord>> {
        let row: Option<(i64, String, String, String, String)> = sqlx::query_as(
            "SELECT id, username, password_hash, display_name, flag \
             FROM users WHERE username = ?1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .context("failed to fetch user by username")?;

        Ok(row.map(Self::row_to_user))
    }

    /// Fetch a user by row ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database read fails.
    pub async fn user_by_id(&self, id: i64) -> anyhow::Result<Option<UserRecord>> {
        let row: Option<(i64, String, String, String, String)> = sqlx::query_as(
            "SELECT id, username, password_hash, display_name, flag \
             FROM users WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to fetch user by id")?;

        Ok(row.map(Self::row_to_user))
    }

    fn row_to_user(row: (i64, String, String, String, String)) -> UserRecord {
        let (id, username, password_hash, display_name, flag) = row;
        UserRecord {
            id,
            username,
            password_hash,
            display_name,
            flag,
        }
    }
}
