// ABOUTME: Shared server resources created once at startup
// ABOUTME: Bundles database, gateway, prompt store, event bus, and configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recoup Labs

//! Shared server resources.
//!
//! One [`ServerResources`] is created at startup and shared behind an `Arc`
//! by every route handler and background task. Handlers never construct
//! their own connections or providers.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::database::Database;
use crate::events::RunEventBus;
use crate::llm::LlmProvider;
use crate::prompts::PromptStore;

/// Everything a request handler needs, created once
pub struct ServerResources {
    /// SQLite database
    pub database: Database,
    /// Text-generation gateway
    pub gateway: Arc<dyn LlmProvider>,
    /// Versioned agent prompt store
    pub prompt_store: PromptStore,
    /// Live run event registry
    pub event_bus: RunEventBus,
    /// Server configuration snapshot
    pub config: ServerConfig,
}

impl ServerResources {
    /// Bundle the shared resources
    #[must_use]
    pub fn new(
        database: Database,
        gateway: Arc<dyn LlmProvider>,
        prompt_store: PromptStore,
        config: ServerConfig,
    ) -> Self {
        Self {
            database,
            gateway,
            prompt_store,
            event_bus: RunEventBus::new(),
            config,
        }
    }
}

impl std::fmt::Debug for ServerResources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerResources")
            .field("gateway", &self.gateway.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
