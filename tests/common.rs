// ABOUTME: Shared test harness with a scripted gateway and resource builders
// ABOUTME: Provides temp-file backed database and prompt store setup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recoup Labs
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]

//! Shared test utilities for `recoup` integration tests

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use tempfile::TempDir;

use recoup::config::ServerConfig;
use recoup::database::Database;
use recoup::errors::AppError;
use recoup::llm::{ChatRequest, ChatResponse, LlmProvider};
use recoup::models::{Persona, PersonaDraft};
use recoup::prompts::{FsPromptStore, PromptStore};
use recoup::resources::ServerResources;

/// Gateway double replaying a scripted sequence of outcomes.
///
/// Each call pops the next entry; `Err` entries surface as generation
/// failures. Requests are recorded for assertions.
pub struct MockGateway {
    script: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<ChatRequest>>,
    latency: Duration,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            latency: Duration::ZERO,
        }
    }

    /// Gateway answering with the given responses in order
    pub fn scripted<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let gateway = Self::new();
        for response in responses {
            gateway.push_ok(response);
        }
        gateway
    }

    /// Delay every completion, giving streaming clients time to attach
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn push_ok(&self, content: impl Into<String>) {
        self.script.lock().unwrap().push_back(Ok(content.into()));
    }

    pub fn push_err(&self, message: impl Into<String>) {
        self.script.lock().unwrap().push_back(Err(message.into()));
    }

    /// Requests observed so far
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for MockGateway {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.requests.lock().unwrap().push(request.clone());
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(content)) => Ok(ChatResponse {
                content,
                model: "mock-model".to_owned(),
            }),
            Some(Err(message)) => Err(AppError::generation(message)),
            None => Err(AppError::generation("mock gateway script exhausted")),
        }
    }
}

/// Everything a test needs, with temp storage kept alive by the guard
pub struct TestContext {
    pub resources: Arc<ServerResources>,
    pub gateway: Arc<MockGateway>,
    _dir: TempDir,
}

/// Build server resources over a temp database and prompt directory
pub async fn test_context(gateway: MockGateway) -> TestContext {
    let dir = TempDir::new().unwrap();
    let database_url = format!("sqlite://{}", dir.path().join("test.db").display());
    let database = Database::new(&database_url).await.unwrap();

    let prompt_store = PromptStore::new(Arc::new(FsPromptStore::new(dir.path().join("prompts"))));
    let config = ServerConfig {
        http_port: 0,
        database_url,
        prompt_dir: dir.path().join("prompts"),
        prompt_version: "v1-v1".to_owned(),
        log_level: "warn".to_owned(),
    };
    prompt_store.seed_default(&config.prompt_version).await.unwrap();

    let gateway = Arc::new(gateway);
    let resources = Arc::new(ServerResources::new(
        database,
        Arc::clone(&gateway) as Arc<dyn LlmProvider>,
        prompt_store,
        config,
    ));

    TestContext {
        resources,
        gateway,
        _dir: dir,
    }
}

/// Store a fixed persona and return it
pub async fn seed_persona(resources: &ServerResources) -> Persona {
    let draft = PersonaDraft {
        full_name: "Jane Doe".to_owned(),
        age: 41,
        gender: "female".to_owned(),
        debt_amount: 1520.5,
        due_date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
        description: "Single mother of two, recently laid off.".to_owned(),
    };
    resources.database.personas().create(&draft).await.unwrap()
}

/// A judge response rating the agent polite and hard
pub fn passing_judgment() -> String {
    serde_json::json!({
        "metric": {"politeness": "polite", "negotiation_level": "hard"},
        "status": "passed",
        "feedback": "Firm and respectful throughout."
    })
    .to_string()
}

/// A judge response rating the agent too soft
pub fn failing_judgment() -> String {
    serde_json::json!({
        "metric": {"politeness": "too_polite", "negotiation_level": "low"},
        "status": "failed",
        "feedback": "The agent apologized constantly and never asked for a payment date."
    })
    .to_string()
}
