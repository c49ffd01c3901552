// ABOUTME: Integration tests for the versioned prompt store on the filesystem backend
// ABOUTME: Covers seeding, overwrite, missing versions, and version advancement
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recoup Labs
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use tempfile::TempDir;

use recoup::errors::ErrorCode;
use recoup::prompts::{next_version, FsPromptStore, PromptStore, DEFAULT_AGENT_PROMPT};

fn store(dir: &TempDir) -> PromptStore {
    PromptStore::new(Arc::new(FsPromptStore::new(dir.path())))
}

#[tokio::test]
async fn test_put_then_get_round_trips() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);

    store.put("v1-v1", "Call {full_name}.").await.unwrap();
    let content = store.get("v1-v1").await.unwrap();
    assert_eq!(content, "Call {full_name}.");
}

#[tokio::test]
async fn test_missing_version_is_not_found() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);

    let error = store.get("v9-v9").await.unwrap_err();
    assert_eq!(error.code, ErrorCode::ResourceNotFound);
}

#[tokio::test]
async fn test_put_overwrites_existing_version() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);

    store.put("v1-v2", "first").await.unwrap();
    store.put("v1-v2", "second").await.unwrap();
    assert_eq!(store.get("v1-v2").await.unwrap(), "second");
}

#[tokio::test]
async fn test_seed_default_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);

    store.seed_default("v1-v1").await.unwrap();
    assert_eq!(store.get("v1-v1").await.unwrap(), DEFAULT_AGENT_PROMPT);

    // A second seed never clobbers operator-stored content
    store.put("v1-v1", "customized").await.unwrap();
    store.seed_default("v1-v1").await.unwrap();
    assert_eq!(store.get("v1-v1").await.unwrap(), "customized");
}

#[tokio::test]
async fn test_versions_are_independent_blobs() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);

    store.put("v1-v1", "one").await.unwrap();
    let successor = next_version("v1-v1").unwrap();
    store.put(&successor, "two").await.unwrap();

    assert_eq!(store.get("v1-v1").await.unwrap(), "one");
    assert_eq!(store.get("v1-v2").await.unwrap(), "two");
}
