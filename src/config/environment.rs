// ABOUTME: Environment-variable configuration with sane defaults for local development
// ABOUTME: Carries the pinned prompt version used for every new test run
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recoup Labs

//! # Server Configuration
//!
//! Environment-only configuration. All settings come from environment
//! variables with development-friendly defaults; nothing is read from disk.
//!
//! | Variable | Default | Purpose |
//! |----------|---------|---------|
//! | `RECOUP_HTTP_PORT` | `8081` | HTTP listen port |
//! | `DATABASE_URL` | `sqlite:./data/recoup.db` | SQLite database |
//! | `RECOUP_PROMPT_DIR` | `./data/prompts` | Prompt blob store root |
//! | `RECOUP_PROMPT_VERSION` | `v1-v1` | Pinned agent prompt version |
//! | `RECOUP_LOG_LEVEL` | `info` | Log filter default |

use std::env;
use std::path::PathBuf;

use crate::errors::{AppError, AppResult};

/// Default HTTP port
const DEFAULT_HTTP_PORT: u16 = 8081;

/// Default pinned prompt version used for new runs
const DEFAULT_PROMPT_VERSION: &str = "v1-v1";

/// Server configuration loaded from the environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Database connection URL
    pub database_url: String,
    /// Directory backing the prompt blob store
    pub prompt_dir: PathBuf,
    /// Pinned agent prompt version; every new run snapshots this value.
    /// External configuration, never derived from stored content.
    pub prompt_version: String,
    /// Default log level when `RUST_LOG` is unset
    pub log_level: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a set variable fails to parse (e.g. a non-numeric
    /// port).
    pub fn from_env() -> AppResult<Self> {
        let http_port = match env::var("RECOUP_HTTP_PORT") {
            Ok(value) => value.parse::<u16>().map_err(|e| {
                AppError::config(format!("Invalid RECOUP_HTTP_PORT '{value}': {e}"))
            })?,
            Err(_) => DEFAULT_HTTP_PORT,
        };

        Ok(Self {
            http_port,
            database_url: env_var_or("DATABASE_URL", "sqlite:./data/recoup.db"),
            prompt_dir: PathBuf::from(env_var_or("RECOUP_PROMPT_DIR", "./data/prompts")),
            prompt_version: env_var_or("RECOUP_PROMPT_VERSION", DEFAULT_PROMPT_VERSION),
            log_level: env_var_or("RECOUP_LOG_LEVEL", "info"),
        })
    }

    /// One-line configuration summary for the startup log
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "http_port={} database={} prompt_dir={} pinned_prompt_version={}",
            self.http_port,
            self.database_url,
            self.prompt_dir.display(),
            self.prompt_version
        )
    }
}

/// Read an environment variable, falling back to a default
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}
