// ABOUTME: Test run aggregate storage with transcript append and one-shot finalization
// ABOUTME: Transcripts and metrics are stored as JSON text columns
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recoup Labs

//! Test run storage.
//!
//! A run is created with the seed transcript and the pinned prompt version,
//! grows one turn at a time while the simulation is live, and is finalized
//! exactly once with metric, feedback, and a terminal status written in a
//! single update.

use chrono::Utc;
use serde::Serialize;
use sqlx::sqlite::SqlitePool;
use sqlx::Row;

use crate::errors::{AppError, AppResult};
use crate::models::{ConversationTurn, Metric, RunStatus, TestRun};

/// A test run joined with the name of its persona, for list views
#[derive(Debug, Clone, Serialize)]
pub struct TestRunSummary {
    /// Run fields
    #[serde(flatten)]
    pub run: TestRun,
    /// Full name of the persona the run conversed with
    pub persona_name: String,
}

/// Manager for the test_runs table
pub struct TestRunManager<'a> {
    pool: &'a SqlitePool,
}

impl<'a> TestRunManager<'a> {
    /// Create a manager borrowing the shared pool
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a run in the `running` state with the seed transcript.
    ///
    /// `prompt_version` is snapshotted here and never changes for the life of
    /// the run.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails, including when `persona_id` does
    /// not reference an existing persona.
    pub async fn create(
        &self,
        name: &str,
        persona_id: i64,
        prompt_version: &str,
    ) -> AppResult<TestRun> {
        let conversation = vec![ConversationTurn::seed()];
        let conversation_json = serde_json::to_string(&conversation)
            .map_err(|e| AppError::database(format!("Failed to encode transcript: {e}")))?;
        let now = Utc::now().to_rfc3339();

        let row = sqlx::query(
            r"
            INSERT INTO test_runs (name, persona_id, conversation, status, prompt_version, created_at, updated_at)
            VALUES (?, ?, ?, 'running', ?, ?, ?)
            RETURNING id
            ",
        )
        .bind(name)
        .bind(persona_id)
        .bind(&conversation_json)
        .bind(prompt_version)
        .bind(&now)
        .bind(&now)
        .fetch_one(self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to insert test run: {e}")))?;

        let id: i64 = row
            .try_get("id")
            .map_err(|e| AppError::database(format!("Failed to read run id: {e}")))?;

        Ok(TestRun {
            id,
            name: name.to_owned(),
            persona_id,
            conversation,
            metric: None,
            feedback: None,
            status: RunStatus::Running,
            prompt_version: prompt_version.to_owned(),
        })
    }

    /// Fetch one run by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored row is malformed.
    pub async fn get(&self, id: i64) -> AppResult<Option<TestRun>> {
        let row = sqlx::query(
            r"
            SELECT id, name, persona_id, conversation, metric, feedback, status, prompt_version
            FROM test_runs
            WHERE id = ?
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to fetch test run: {e}")))?;

        row.map(|r| row_to_run(&r)).transpose()
    }

    /// List runs newest-first with their persona names
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored row is malformed.
    pub async fn list(&self, skip: i64, limit: i64) -> AppResult<Vec<TestRunSummary>> {
        let rows = sqlx::query(
            r"
            SELECT t.id, t.name, t.persona_id, t.conversation, t.metric, t.feedback,
                   t.status, t.prompt_version, p.full_name AS persona_name
            FROM test_runs t
            JOIN personas p ON p.id = t.persona_id
            ORDER BY t.id DESC
            LIMIT ? OFFSET ?
            ",
        )
        .bind(limit)
        .bind(skip)
        .fetch_all(self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list test runs: {e}")))?;

        rows.iter()
            .map(|row| {
                let run = row_to_run(row)?;
                let persona_name: String = row.try_get("persona_name").map_err(|e| {
                    AppError::database(format!("Failed to read persona_name: {e}"))
                })?;
                Ok(TestRunSummary { run, persona_name })
            })
            .collect()
    }

    /// Append one turn to a live run's transcript, returning the updated
    /// transcript.
    ///
    /// The turn is durable before the caller proceeds to the next gateway
    /// call, so a crash mid-simulation never loses recorded turns.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the run does not exist, or a database
    /// error on failure.
    pub async fn append_turn(
        &self,
        id: i64,
        turn: &ConversationTurn,
    ) -> AppResult<Vec<ConversationTurn>> {
        let run = self
            .get(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Test run {id} not found")))?;

        let mut conversation = run.conversation;
        conversation.push(turn.clone());
        let conversation_json = serde_json::to_string(&conversation)
            .map_err(|e| AppError::database(format!("Failed to encode transcript: {e}")))?;

        sqlx::query(r"UPDATE test_runs SET conversation = ?, updated_at = ? WHERE id = ?")
            .bind(&conversation_json)
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to append turn: {e}")))?;

        Ok(conversation)
    }

    /// Write metric, feedback, and terminal status in a single update.
    ///
    /// `metric` and `feedback` stay `NULL` when the judge itself failed; the
    /// run still lands on a terminal status.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the run does not exist, or a database
    /// error on failure.
    pub async fn finalize(
        &self,
        id: i64,
        metric: Option<&Metric>,
        feedback: Option<&str>,
        status: RunStatus,
    ) -> AppResult<()> {
        let metric_json = metric
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| AppError::database(format!("Failed to encode metric: {e}")))?;

        let result = sqlx::query(
            r"
            UPDATE test_runs
            SET metric = ?, feedback = ?, status = ?, updated_at = ?
            WHERE id = ?
            ",
        )
        .bind(metric_json)
        .bind(feedback)
        .bind(status.as_str())
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to finalize test run: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Test run {id} not found")));
        }
        Ok(())
    }
}

/// Map a database row onto the domain test run
fn row_to_run(row: &sqlx::sqlite::SqliteRow) -> AppResult<TestRun> {
    let conversation_json: String = row
        .try_get("conversation")
        .map_err(|e| AppError::database(format!("Failed to read conversation: {e}")))?;
    let conversation: Vec<ConversationTurn> = serde_json::from_str(&conversation_json)
        .map_err(|e| AppError::database(format!("Malformed stored transcript: {e}")))?;

    let metric_json: Option<String> = row
        .try_get("metric")
        .map_err(|e| AppError::database(format!("Failed to read metric: {e}")))?;
    let metric: Option<Metric> = metric_json
        .as_deref()
        .map(serde_json::from_str)
        .transpose()
        .map_err(|e| AppError::database(format!("Malformed stored metric: {e}")))?;

    let status_text: String = row
        .try_get("status")
        .map_err(|e| AppError::database(format!("Failed to read status: {e}")))?;
    let status: RunStatus = status_text
        .parse()
        .map_err(|_| AppError::database(format!("Malformed stored status '{status_text}'")))?;

    Ok(TestRun {
        id: row
            .try_get("id")
            .map_err(|e| AppError::database(format!("Failed to read id: {e}")))?,
        name: row
            .try_get("name")
            .map_err(|e| AppError::database(format!("Failed to read name: {e}")))?,
        persona_id: row
            .try_get("persona_id")
            .map_err(|e| AppError::database(format!("Failed to read persona_id: {e}")))?,
        conversation,
        metric,
        feedback: row
            .try_get("feedback")
            .map_err(|e| AppError::database(format!("Failed to read feedback: {e}")))?,
        status,
        prompt_version: row
            .try_get("prompt_version")
            .map_err(|e| AppError::database(format!("Failed to read prompt_version: {e}")))?,
    })
}
