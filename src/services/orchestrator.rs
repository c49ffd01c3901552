// ABOUTME: Drives the full lifecycle of a test run from creation to terminal status
// ABOUTME: Spawns the simulation task and guarantees a terminal event on every path
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recoup Labs

//! Run orchestration.
//!
//! `start` creates a run and returns immediately; the simulation and judging
//! happen on a spawned task. Whatever happens on that task, the run lands on
//! a terminal status and subscribers observe a terminal event: a gateway or
//! judge failure forces `failed` with no metric and no feedback rather than
//! leaving the run stuck in `running`.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

use crate::errors::{AppError, AppResult};
use crate::events::RunEvent;
use crate::models::{Persona, RunStatus, TestRun};
use crate::prompts::{render_agent_prompt, DEFAULT_AGENT_PROMPT};
use crate::resources::ServerResources;
use crate::services::judge;
use crate::services::simulator::Simulator;

/// Exchanges simulated when the caller does not specify a count
pub const DEFAULT_ITERATIONS: u32 = 6;

/// Create a test run and launch its simulation in the background.
///
/// Returns the freshly created run (already carrying the seed transcript and
/// the pinned prompt version) together with the handle of the background
/// task, which callers may await when they need completion.
///
/// # Errors
///
/// Returns `ResourceNotFound` if the persona does not exist, or a database
/// error if run creation fails.
#[instrument(skip(resources), fields(persona_id = persona_id))]
pub async fn start(
    resources: Arc<ServerResources>,
    name: &str,
    persona_id: i64,
    iterations: Option<u32>,
) -> AppResult<(TestRun, JoinHandle<()>)> {
    let persona = resources
        .database
        .personas()
        .get(persona_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Persona {persona_id} not found")))?;

    let iterations = iterations.unwrap_or(DEFAULT_ITERATIONS).max(1);
    let prompt_version = resources.config.prompt_version.clone();
    let run = resources
        .database
        .test_runs()
        .create(name, persona_id, &prompt_version)
        .await?;
    resources.event_bus.open(run.id).await;

    info!(
        "Starting test run {} ('{name}') against prompt version {prompt_version}",
        run.id
    );

    let run_id = run.id;
    let task_resources = Arc::clone(&resources);
    let handle = tokio::spawn(async move {
        execute(&task_resources, run_id, &persona, &prompt_version, iterations).await;
    });

    Ok((run, handle))
}

/// Run the simulation and judging for an already-created run.
///
/// Never returns an error: every failure path finalizes the run as `failed`
/// and publishes a terminal event before the channel is torn down.
pub async fn execute(
    resources: &ServerResources,
    run_id: i64,
    persona: &Persona,
    prompt_version: &str,
    iterations: u32,
) {
    resources
        .event_bus
        .publish(
            run_id,
            RunEvent::Start {
                test_run_id: run_id,
                persona: persona.clone(),
                prompt_version: prompt_version.to_owned(),
            },
        )
        .await;

    let outcome = run_to_completion(resources, run_id, persona, prompt_version, iterations).await;

    if let Err(e) = outcome {
        error!("Test run {run_id} aborted: {e}");
        resources
            .event_bus
            .publish(
                run_id,
                RunEvent::Error {
                    message: e.to_string(),
                },
            )
            .await;

        // Judge output is unavailable on this path; the run still must leave
        // the running state.
        if let Err(db_error) = resources
            .database
            .test_runs()
            .finalize(run_id, None, None, RunStatus::Failed)
            .await
        {
            error!("Failed to record aborted run {run_id}: {db_error}");
        }
        resources
            .event_bus
            .publish(
                run_id,
                RunEvent::End {
                    metric: None,
                    feedback: None,
                    status: RunStatus::Failed,
                },
            )
            .await;
    }

    resources.event_bus.close_after_grace(run_id);
}

/// Simulate, judge, and finalize. Any error propagates to `execute` for the
/// forced-failure path.
async fn run_to_completion(
    resources: &ServerResources,
    run_id: i64,
    persona: &Persona,
    prompt_version: &str,
    iterations: u32,
) -> AppResult<()> {
    let template = match resources.prompt_store.get(prompt_version).await {
        Ok(template) => template,
        Err(e) => {
            warn!(
                "Prompt version '{prompt_version}' unavailable ({e}), \
                 falling back to the built-in prompt"
            );
            DEFAULT_AGENT_PROMPT.to_owned()
        }
    };
    let agent_prompt = render_agent_prompt(&template, persona);

    let simulator = Simulator::new(resources.gateway.as_ref());
    let outcome = simulator
        .run(
            &resources.database,
            &resources.event_bus,
            run_id,
            persona,
            &agent_prompt,
            iterations,
        )
        .await?;

    // A gateway failure mid-simulation stops further turns but the partial
    // transcript is still judged; subscribers see the failure as a
    // non-terminal error event.
    if let Some(abort) = outcome.abort {
        warn!("Run {run_id} simulation cut short: {abort}");
        resources
            .event_bus
            .publish(
                run_id,
                RunEvent::Error {
                    message: abort.to_string(),
                },
            )
            .await;
    }

    let judgment = judge::judge(resources.gateway.as_ref(), &outcome.transcript).await?;

    resources
        .database
        .test_runs()
        .finalize(
            run_id,
            Some(&judgment.metric),
            Some(&judgment.feedback),
            judgment.status,
        )
        .await?;

    info!(
        "Test run {run_id} finished with status '{}'",
        judgment.status
    );
    resources
        .event_bus
        .publish(
            run_id,
            RunEvent::End {
                metric: Some(judgment.metric),
                feedback: Some(judgment.feedback),
                status: judgment.status,
            },
        )
        .await;

    Ok(())
}
