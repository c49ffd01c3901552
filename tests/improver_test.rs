// ABOUTME: Integration tests for gateway-driven prompt improvement
// ABOUTME: Covers placeholder preservation, fence stripping, and rejection of bad rewrites
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recoup Labs
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{test_context, MockGateway};
use recoup::errors::ErrorCode;
use recoup::models::{Metric, NegotiationLevel, Politeness};
use recoup::services::improver;

const CURRENT_PROMPT: &str =
    "Call {full_name} about ${debt_amount} due on {due_date}. Be nice.";

fn failing_metric() -> Metric {
    Metric {
        politeness: Politeness::TooPolite,
        negotiation_level: NegotiationLevel::Low,
    }
}

#[tokio::test]
async fn test_valid_rewrite_accepted() {
    let rewrite = "Call {full_name} about ${debt_amount} due on {due_date}. \
                   Stay respectful and push for a concrete payment date.";
    let ctx = test_context(MockGateway::scripted([rewrite])).await;

    let improved = improver::improve(
        ctx.gateway.as_ref(),
        CURRENT_PROMPT,
        failing_metric(),
        "The agent never asked for a payment date.",
    )
    .await
    .unwrap();
    assert_eq!(improved, rewrite);

    // The gateway received the prompt, the rating, and the feedback
    let requests = ctx.gateway.requests();
    let user_message = &requests[0].messages[1].content;
    assert!(user_message.contains(CURRENT_PROMPT));
    assert!(user_message.contains("too_polite"));
    assert!(user_message.contains("never asked for a payment date"));
}

#[tokio::test]
async fn test_fenced_rewrite_is_unwrapped() {
    let ctx = test_context(MockGateway::scripted([
        "```\nCall {full_name} about ${debt_amount} due on {due_date}. Be firm.\n```",
    ]))
    .await;

    let improved = improver::improve(
        ctx.gateway.as_ref(),
        CURRENT_PROMPT,
        failing_metric(),
        "Too soft.",
    )
    .await
    .unwrap();
    assert!(!improved.contains("```"));
    assert!(improved.contains("{due_date}"));
}

#[tokio::test]
async fn test_rewrite_dropping_placeholder_rejected() {
    let ctx = test_context(MockGateway::scripted([
        "Call the customer about their debt. Be firm about {due_date}.",
    ]))
    .await;

    let error = improver::improve(
        ctx.gateway.as_ref(),
        CURRENT_PROMPT,
        failing_metric(),
        "Too soft.",
    )
    .await
    .unwrap_err();
    assert_eq!(error.code, ErrorCode::PromptValidationFailed);
    let missing = error.details["missing_placeholders"].as_array().unwrap();
    assert_eq!(missing.len(), 2);
}
