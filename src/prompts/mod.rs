// ABOUTME: Versioned agent prompt storage over a pluggable blob backend
// ABOUTME: Owns the version grammar, placeholder validation, and default seeding
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recoup Labs

//! # Prompt Store
//!
//! Versioned storage for the collection agent's system prompt. Versions
//! follow the `v<base>-v<revision>` grammar; the improvement flow bumps only
//! the revision component. Content lives in a blob backend behind
//! [`PromptBlobStore`] so tests can run on a temporary directory.

pub mod blob;
pub mod template;

pub use blob::{FsPromptStore, PromptBlobStore};
pub use template::{render_agent_prompt, validate_placeholders, DEFAULT_AGENT_PROMPT};

use std::sync::Arc;

use tracing::info;

use crate::errors::{AppError, AppResult};

/// Versioned prompt store over a blob backend
#[derive(Clone)]
pub struct PromptStore {
    blobs: Arc<dyn PromptBlobStore>,
}

impl PromptStore {
    /// Create a store over the given blob backend
    #[must_use]
    pub fn new(blobs: Arc<dyn PromptBlobStore>) -> Self {
        Self { blobs }
    }

    /// Fetch the prompt stored under `version`
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if no prompt exists under that version.
    pub async fn get(&self, version: &str) -> AppResult<String> {
        self.blobs.get(version).await?.ok_or_else(|| {
            AppError::not_found(format!("No prompt stored under version '{version}'"))
        })
    }

    /// Store `content` under `version`, overwriting any previous content
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails.
    pub async fn put(&self, version: &str, content: &str) -> AppResult<()> {
        self.blobs.put(version, content).await
    }

    /// Seed the default agent prompt under `version` if nothing is stored
    /// there yet. Called once at startup so a fresh deployment can run tests
    /// immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read or write fails.
    pub async fn seed_default(&self, version: &str) -> AppResult<()> {
        if self.blobs.get(version).await?.is_none() {
            self.blobs.put(version, DEFAULT_AGENT_PROMPT).await?;
            info!("Seeded default agent prompt under version '{version}'");
        }
        Ok(())
    }
}

/// Compute the successor of a prompt version.
///
/// Versions follow the `v<base>-v<revision>` grammar with decimal components
/// and a revision of at least one; only the revision is bumped: `v1-v2`
/// becomes `v1-v3`.
///
/// # Errors
///
/// Returns `InvalidFormat` if `version` does not match the grammar.
pub fn next_version(version: &str) -> AppResult<String> {
    let malformed =
        || AppError::invalid_format(format!("Invalid prompt version format: '{version}'"));

    let (base, revision) = version.split_once('-').ok_or_else(malformed)?;
    let base_number = base.strip_prefix('v').ok_or_else(malformed)?;
    let revision_number = revision.strip_prefix('v').ok_or_else(malformed)?;

    if base_number.is_empty() || !base_number.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    let revision_value: u64 = revision_number.parse().map_err(|_| malformed())?;
    if revision_value == 0 {
        return Err(malformed());
    }

    Ok(format!("{base}-v{}", revision_value + 1))
}
