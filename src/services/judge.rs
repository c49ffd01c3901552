// ABOUTME: Judges finished transcripts on the politeness and negotiation rubric
// ABOUTME: Pass/fail is derived deterministically from the metric, never trusted from the model
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recoup Labs

//! Transcript judging.
//!
//! The judge flattens the transcript into a labeled script, asks the gateway
//! to rate the agent on two axes, and validates the response against the
//! rubric's closed vocabularies. The model is also asked for a pass/fail
//! verdict, but that verdict is advisory only: the stored status is always
//! recomputed from the metric, and a disagreement is logged.

use serde_json::Value;
use tracing::{instrument, warn};

use crate::errors::{AppError, AppResult};
use crate::llm::extract::extract_json;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use crate::models::{ConversationTurn, Metric, NegotiationLevel, Politeness, RunStatus, Speaker};

const JUDGE_INSTRUCTION: &str = "\
You evaluate debt collection call transcripts. The transcript you receive is \
a conversation between a collection agent (lines starting with \"Agent:\") \
and a defaulter (lines starting with \"Defaulter:\"). Rate the agent only.

Rate two axes:

- politeness: one of \"too_polite\" (soft, apologetic, lets the customer run \
the call), \"polite\" (respectful and professional while staying firm), \
\"impolite\" (rude, dismissive, or condescending), \"too_impolite\" \
(threatening, abusive, or harassing).
- negotiation_level: one of \"low\" (accepts excuses, never pushes for a \
commitment), \"medium\" (some persistence but no concrete arrangement \
reached or demanded), \"hard\" (persistently pushes toward a specific \
payment amount and date).

The agent passes only when politeness is \"polite\" and negotiation_level is \
\"hard\".

Respond with a single JSON object and nothing else:

{
  \"metric\": {\"politeness\": \"...\", \"negotiation_level\": \"...\"},
  \"status\": \"passed\" or \"failed\",
  \"feedback\": \"2-4 sentences of concrete advice for improving the agent prompt\"
}";

/// Result of judging one transcript
#[derive(Debug, Clone)]
pub struct Judgment {
    /// Two-axis rubric rating
    pub metric: Metric,
    /// Concrete advice for the improver
    pub feedback: String,
    /// Terminal status derived from the metric
    pub status: RunStatus,
}

/// Derive pass/fail from the metric. Passing requires both rubric targets.
#[must_use]
pub const fn derive_status(metric: Metric) -> RunStatus {
    match (metric.politeness, metric.negotiation_level) {
        (Politeness::Polite, NegotiationLevel::Hard) => RunStatus::Passed,
        _ => RunStatus::Failed,
    }
}

/// Flatten a transcript into the labeled script the judge reads
#[must_use]
pub fn flatten_transcript(transcript: &[ConversationTurn]) -> String {
    transcript
        .iter()
        .map(|turn| {
            let label = match turn.speaker() {
                Speaker::Agent => "Agent",
                Speaker::Persona => "Defaulter",
            };
            format!("{label}: {}", turn.text())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Judge a finished transcript through the gateway.
///
/// # Errors
///
/// Returns `GenerationFailed` if the gateway call fails and `SchemaInvalid`
/// if the response does not satisfy the rubric schema.
#[instrument(skip_all)]
pub async fn judge(
    gateway: &dyn LlmProvider,
    transcript: &[ConversationTurn],
) -> AppResult<Judgment> {
    let request = ChatRequest::new(vec![
        ChatMessage::system(JUDGE_INSTRUCTION),
        ChatMessage::user(flatten_transcript(transcript)),
    ]);

    let response = gateway.complete(&request).await?;
    let value: Value = extract_json(&response.content)?;
    judgment_from_value(&value)
}

/// Validate a raw judge response against the rubric schema
fn judgment_from_value(value: &Value) -> AppResult<Judgment> {
    let politeness = enum_field::<Politeness>(value, "/metric/politeness")?;
    let negotiation_level = enum_field::<NegotiationLevel>(value, "/metric/negotiation_level")?;
    let feedback = value["feedback"]
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| schema_error("feedback"))?;
    let reported_status = value["status"]
        .as_str()
        .ok_or_else(|| schema_error("status"))?;

    let metric = Metric {
        politeness,
        negotiation_level,
    };
    let status = derive_status(metric);

    if reported_status != status.as_str() {
        warn!(
            "Judge verdict '{reported_status}' disagrees with derived status '{status}', \
             keeping derived status"
        );
    }

    Ok(Judgment {
        metric,
        feedback,
        status,
    })
}

fn enum_field<T: serde::de::DeserializeOwned>(value: &Value, pointer: &str) -> AppResult<T> {
    let field = value
        .pointer(pointer)
        .ok_or_else(|| schema_error(pointer))?;
    serde_json::from_value(field.clone()).map_err(|_| schema_error(pointer))
}

fn schema_error(field: &str) -> AppError {
    AppError::schema(
        format!("Judge response is missing or malformed at '{field}'"),
        &[field.trim_start_matches('/').replace('/', ".")],
    )
}
