// ABOUTME: Blob backend trait for prompt content plus the filesystem implementation
// ABOUTME: One UTF-8 file per version under a configured root directory
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recoup Labs

//! Prompt blob backends.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::errors::{AppError, AppResult};

/// Backend storing prompt content keyed by version string
#[async_trait]
pub trait PromptBlobStore: Send + Sync {
    /// Fetch the content stored under `version`, if any
    async fn get(&self, version: &str) -> AppResult<Option<String>>;

    /// Store `content` under `version`, overwriting any previous content
    async fn put(&self, version: &str, content: &str) -> AppResult<()>;
}

/// Filesystem blob backend: `<root>/<version>.txt`
#[derive(Debug, Clone)]
pub struct FsPromptStore {
    root: PathBuf,
}

impl FsPromptStore {
    /// Create a backend rooted at `root`. The directory is created lazily on
    /// the first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, version: &str) -> PathBuf {
        self.root.join(format!("{version}.txt"))
    }
}

#[async_trait]
impl PromptBlobStore for FsPromptStore {
    async fn get(&self, version: &str) -> AppResult<Option<String>> {
        let path = self.path_for(version);
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::storage(format!(
                "Failed to read prompt blob {}: {e}",
                path.display()
            ))),
        }
    }

    async fn put(&self, version: &str, content: &str) -> AppResult<()> {
        fs::create_dir_all(&self.root).await.map_err(|e| {
            AppError::storage(format!(
                "Failed to create prompt directory {}: {e}",
                self.root.display()
            ))
        })?;

        let path = self.path_for(version);
        write_atomic(&path, content).await
    }
}

/// Write through a temp file and rename so readers never observe a partial
/// prompt.
async fn write_atomic(path: &Path, content: &str) -> AppResult<()> {
    let tmp = path.with_extension("txt.tmp");
    fs::write(&tmp, content).await.map_err(|e| {
        AppError::storage(format!("Failed to write prompt blob {}: {e}", tmp.display()))
    })?;
    fs::rename(&tmp, path).await.map_err(|e| {
        AppError::storage(format!(
            "Failed to finalize prompt blob {}: {e}",
            path.display()
        ))
    })
}
