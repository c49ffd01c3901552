// ABOUTME: Test run route handlers for starting, listing, and inspecting runs
// ABOUTME: Starting a run returns immediately with the WebSocket URL for live events
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recoup Labs

//! Test run routes

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::database::test_runs::TestRunSummary;
use crate::errors::AppError;
use crate::models::TestRun;
use crate::resources::ServerResources;
use crate::services::orchestrator;

/// Request to start a test run
#[derive(Debug, Deserialize)]
pub struct StartTestRequest {
    /// Operator-chosen run name
    pub name: String,
    /// Persona to converse with
    pub persona_id: i64,
    /// Agent/persona exchanges to simulate; defaults to
    /// [`orchestrator::DEFAULT_ITERATIONS`], floored at one
    #[serde(default)]
    pub iterations: Option<u32>,
}

/// Response for a started test run
#[derive(Debug, Serialize)]
pub struct StartTestResponse {
    /// ID of the created run
    pub test_run_id: i64,
    /// WebSocket path streaming the run's live events
    pub ws_url: String,
}

/// Pagination parameters for run listing
#[derive(Debug, Deserialize)]
pub struct ListTestsQuery {
    /// Rows to skip
    #[serde(default)]
    pub skip: i64,
    /// Maximum rows to return
    #[serde(default = "default_limit")]
    pub limit: i64,
}

const fn default_limit() -> i64 {
    50
}

/// Test run routes handler
pub struct TestRunRoutes;

impl TestRunRoutes {
    /// Create all test run routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/tests/start", post(Self::start_test))
            .route("/api/tests", get(Self::list_tests))
            .route("/api/tests/:test_run_id", get(Self::get_test))
            .with_state(resources)
    }

    /// Create a run and launch its simulation in the background
    async fn start_test(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<StartTestRequest>,
    ) -> Result<(StatusCode, Json<StartTestResponse>), AppError> {
        let (run, handle) = orchestrator::start(
            resources,
            &request.name,
            request.persona_id,
            request.iterations,
        )
        .await?;

        let run_id = run.id;
        tokio::spawn(async move {
            if let Err(e) = handle.await {
                tracing::error!("Simulation task for run {run_id} panicked: {e}");
            }
        });

        Ok((
            StatusCode::ACCEPTED,
            Json(StartTestResponse {
                test_run_id: run.id,
                ws_url: format!("/ws/tests/{}", run.id),
            }),
        ))
    }

    /// List runs with persona names, newest first
    async fn list_tests(
        State(resources): State<Arc<ServerResources>>,
        Query(query): Query<ListTestsQuery>,
    ) -> Result<Json<Vec<TestRunSummary>>, AppError> {
        let runs = resources
            .database
            .test_runs()
            .list(query.skip, query.limit)
            .await?;
        Ok(Json(runs))
    }

    /// Fetch one run with its full transcript
    async fn get_test(
        State(resources): State<Arc<ServerResources>>,
        Path(test_run_id): Path<i64>,
    ) -> Result<Json<TestRun>, AppError> {
        let run = resources
            .database
            .test_runs()
            .get(test_run_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Test run {test_run_id} not found")))?;
        Ok(Json(run))
    }
}
