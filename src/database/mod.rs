// ABOUTME: SQLite database connection management and schema migrations
// ABOUTME: Exposes per-aggregate managers for personas and test runs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recoup Labs

//! # Database Layer
//!
//! SQLite-backed persistence via `sqlx`. The [`Database`] wrapper owns the
//! connection pool and runs idempotent migrations at startup; access to the
//! two aggregates goes through [`PersonaManager`] and [`TestRunManager`],
//! which borrow the pool and hold no other state.

pub mod personas;
pub mod test_runs;

pub use personas::PersonaManager;
pub use test_runs::TestRunManager;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::errors::{AppError, AppResult};

/// Database connection wrapper
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to the database and run migrations.
    ///
    /// The database file is created if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed, the connection fails, or a
    /// migration statement fails.
    pub async fn new(database_url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::database(format!("Invalid database URL: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("Failed to connect to database: {e}")))?;

        let database = Self { pool };
        database.migrate().await?;
        info!("Database ready at {database_url}");
        Ok(database)
    }

    /// The underlying connection pool
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Manager for the personas aggregate
    #[must_use]
    pub const fn personas(&self) -> PersonaManager<'_> {
        PersonaManager::new(&self.pool)
    }

    /// Manager for the test runs aggregate
    #[must_use]
    pub const fn test_runs(&self) -> TestRunManager<'_> {
        TestRunManager::new(&self.pool)
    }

    /// Create tables if they do not exist yet
    async fn migrate(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS personas (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                full_name TEXT NOT NULL,
                age INTEGER NOT NULL,
                gender TEXT NOT NULL,
                debt_amount REAL NOT NULL,
                due_date TEXT NOT NULL,
                description TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create personas table: {e}")))?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS test_runs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                persona_id INTEGER NOT NULL REFERENCES personas(id) ON DELETE CASCADE,
                conversation TEXT NOT NULL,
                metric TEXT,
                feedback TEXT,
                status TEXT NOT NULL DEFAULT 'running',
                prompt_version TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create test_runs table: {e}")))?;

        sqlx::query(
            r"CREATE INDEX IF NOT EXISTS idx_test_runs_persona_id ON test_runs(persona_id)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create test_runs index: {e}")))?;

        Ok(())
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}
