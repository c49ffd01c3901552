// ABOUTME: Prompt improvement route handler
// ABOUTME: Rewrites the agent prompt from a failed run's judgment and stores the next version
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recoup Labs

//! Prompt routes

use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::models::RunStatus;
use crate::prompts::next_version;
use crate::resources::ServerResources;
use crate::services::improver;

/// Request to improve the prompt from a failed run
#[derive(Debug, Deserialize)]
pub struct ImprovePromptRequest {
    /// Failed run whose judgment drives the rewrite
    pub test_run_id: i64,
}

/// Response for a stored prompt improvement
#[derive(Debug, Serialize)]
pub struct ImprovePromptResponse {
    /// Whether the improved prompt was stored
    pub success: bool,
    /// Version the improved prompt was stored under
    pub new_version: String,
    /// Operator-facing summary
    pub message: String,
}

/// Prompt routes handler
pub struct PromptRoutes;

impl PromptRoutes {
    /// Create all prompt routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/prompts/improve", post(Self::improve_prompt))
            .with_state(resources)
    }

    /// Rewrite the agent prompt from a failed run's judgment.
    ///
    /// The run must be judged and failed: a passing run has nothing to fix,
    /// and a run whose judge aborted carries no metric to improve from.
    async fn improve_prompt(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<ImprovePromptRequest>,
    ) -> Result<Json<ImprovePromptResponse>, AppError> {
        let run_id = request.test_run_id;
        let run = resources
            .database
            .test_runs()
            .get(run_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Test run {run_id} not found")))?;

        if run.status != RunStatus::Failed {
            return Err(AppError::precondition_failed(format!(
                "Test run {run_id} has status '{}'; only failed runs can drive an improvement",
                run.status
            )));
        }
        let (metric, feedback) = match (run.metric, run.feedback.as_deref()) {
            (Some(metric), Some(feedback)) => (metric, feedback),
            _ => {
                return Err(AppError::precondition_failed(format!(
                    "Test run {run_id} carries no judgment to improve from"
                )));
            }
        };

        let current_prompt = resources.prompt_store.get(&run.prompt_version).await?;
        let improved =
            improver::improve(resources.gateway.as_ref(), &current_prompt, metric, feedback)
                .await?;

        let new_version = next_version(&run.prompt_version)?;
        resources.prompt_store.put(&new_version, &improved).await?;
        info!(
            "Stored improved prompt '{new_version}' from run {run_id} \
             (previous version '{}')",
            run.prompt_version
        );

        Ok(Json(ImprovePromptResponse {
            success: true,
            new_version: new_version.clone(),
            message: format!("Improved prompt stored under version '{new_version}'"),
        }))
    }
}
