// ABOUTME: Rewrites the agent prompt from judge feedback through the gateway
// ABOUTME: Rejects rewrites that drop any required template placeholder
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recoup Labs

//! Prompt improvement.
//!
//! Takes the prompt a failed run executed against, the judge's metric, and
//! the judge's feedback, and asks the gateway for a rewritten prompt that
//! addresses the feedback. The rewrite is validated before it can be stored:
//! a candidate that lost any of the required placeholders is rejected
//! outright rather than repaired.

use tracing::instrument;

use crate::errors::AppResult;
use crate::llm::extract::strip_code_fence;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use crate::models::Metric;
use crate::prompts::validate_placeholders;

const IMPROVER_INSTRUCTION: &str = "\
You improve system prompts for a debt collection voice agent. You receive \
the current prompt, the rating it earned on a simulated call, and an \
evaluator's feedback. Rewrite the prompt so the agent stays respectful and \
professional (politeness target: \"polite\") while pushing persistently \
toward a concrete payment commitment (negotiation target: \"hard\").

Direct your edits at the axis that failed:
- \"too_polite\": strengthen firmness and remove apologetic language.
- \"impolite\" or \"too_impolite\": add respect and professionalism without \
giving up persistence.
- negotiation \"low\" or \"medium\": add explicit instructions to push for a \
specific payment amount and date and to refuse vague promises.

Rules:
- Keep the placeholders {full_name}, {debt_amount}, and {due_date} exactly \
as written. They are substituted at call time and must all survive the \
rewrite.
- Preserve instructions that already serve the targets; change what the \
feedback criticizes.
- Respond with the rewritten prompt text only. No commentary, no headers, no \
code fences.";

/// Propose an improved agent prompt from a failed run's judgment.
///
/// # Errors
///
/// Returns `GenerationFailed` if the gateway call fails and
/// `PromptValidationFailed` if the rewrite drops a required placeholder.
#[instrument(skip_all)]
pub async fn improve(
    gateway: &dyn LlmProvider,
    current_prompt: &str,
    metric: Metric,
    feedback: &str,
) -> AppResult<String> {
    let user_message = format!(
        "Current prompt:\n{current_prompt}\n\n\
         Rating: politeness={politeness}, negotiation_level={negotiation}\n\n\
         Feedback:\n{feedback}",
        politeness = metric_label(&serde_json::to_value(metric.politeness)?),
        negotiation = metric_label(&serde_json::to_value(metric.negotiation_level)?),
    );

    let request = ChatRequest::new(vec![
        ChatMessage::system(IMPROVER_INSTRUCTION),
        ChatMessage::user(user_message),
    ]);

    let response = gateway.complete(&request).await?;
    let candidate = strip_code_fence(&response.content).to_owned();
    validate_placeholders(&candidate)?;
    Ok(candidate)
}

/// Extract the snake_case label from a serialized rubric enum
fn metric_label(value: &serde_json::Value) -> String {
    value.as_str().unwrap_or_default().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NegotiationLevel, Politeness};

    #[test]
    fn test_metric_labels_are_snake_case() {
        let politeness = serde_json::to_value(Politeness::TooPolite).unwrap();
        assert_eq!(metric_label(&politeness), "too_polite");
        let level = serde_json::to_value(NegotiationLevel::Hard).unwrap();
        assert_eq!(metric_label(&level), "hard");
    }
}
