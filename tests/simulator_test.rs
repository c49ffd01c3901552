// ABOUTME: Integration tests for the dual-role conversation simulator
// ABOUTME: Covers transcript growth, persistence ordering, and gateway failure
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recoup Labs
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{test_context, MockGateway};
use recoup::models::{ConversationTurn, Speaker};
use recoup::services::simulator::Simulator;

#[tokio::test]
async fn test_three_iterations_produce_seven_turns() {
    let gateway = MockGateway::scripted([
        "Am I speaking with Jane Doe?",
        "Yes, who is asking?",
        "This is about your outstanding balance.",
        "I can't pay right now.",
        "What amount could you pay, and on which date?",
        "Maybe fifty dollars next Friday.",
    ]);
    let ctx = test_context(gateway).await;
    let persona = common::seed_persona(&ctx.resources).await;
    let run = ctx
        .resources
        .database
        .test_runs()
        .create("baseline", persona.id, "v1-v1")
        .await
        .unwrap();

    let simulator = Simulator::new(ctx.gateway.as_ref());
    let outcome = simulator
        .run(
            &ctx.resources.database,
            &ctx.resources.event_bus,
            run.id,
            &persona,
            "You are a collection agent.",
            3,
        )
        .await
        .unwrap();
    assert!(outcome.abort.is_none());

    let transcript = outcome.transcript;
    assert_eq!(transcript.len(), 7);
    assert_eq!(transcript[0], ConversationTurn::seed());
    let speakers: Vec<Speaker> = transcript.iter().map(ConversationTurn::speaker).collect();
    assert_eq!(
        speakers,
        [
            Speaker::Persona,
            Speaker::Agent,
            Speaker::Persona,
            Speaker::Agent,
            Speaker::Persona,
            Speaker::Agent,
            Speaker::Persona,
        ]
    );

    // The persisted transcript matches what the simulator returned
    let stored = ctx
        .resources
        .database
        .test_runs()
        .get(run.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.conversation, transcript);
}

#[tokio::test]
async fn test_gateway_failure_keeps_recorded_turns() {
    let gateway = MockGateway::new();
    gateway.push_ok("Am I speaking with Jane Doe?");
    gateway.push_err("gateway unavailable");
    let ctx = test_context(gateway).await;
    let persona = common::seed_persona(&ctx.resources).await;
    let run = ctx
        .resources
        .database
        .test_runs()
        .create("flaky", persona.id, "v1-v1")
        .await
        .unwrap();

    let simulator = Simulator::new(ctx.gateway.as_ref());
    let outcome = simulator
        .run(
            &ctx.resources.database,
            &ctx.resources.event_bus,
            run.id,
            &persona,
            "You are a collection agent.",
            3,
        )
        .await
        .unwrap();
    assert!(outcome.abort.is_some());
    // Seed plus the one agent turn generated before the failure
    assert_eq!(outcome.transcript.len(), 2);

    let stored = ctx
        .resources
        .database
        .test_runs()
        .get(run.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.conversation.len(), 2);
    assert_eq!(stored.conversation[1].speaker(), Speaker::Agent);
}

#[tokio::test]
async fn test_agent_sees_rendered_prompt_and_role_projection() {
    let gateway = MockGateway::scripted(["Hello Jane.", "Hi."]);
    let ctx = test_context(gateway).await;
    let persona = common::seed_persona(&ctx.resources).await;
    let run = ctx
        .resources
        .database
        .test_runs()
        .create("projection", persona.id, "v1-v1")
        .await
        .unwrap();

    let simulator = Simulator::new(ctx.gateway.as_ref());
    simulator
        .run(
            &ctx.resources.database,
            &ctx.resources.event_bus,
            run.id,
            &persona,
            "You are calling Jane Doe about $1520.50.",
            1,
        )
        .await
        .unwrap();

    let requests = ctx.gateway.requests();
    assert_eq!(requests.len(), 2);

    // First call is the agent's view: system prompt plus the seed as user input
    let agent_view = &requests[0];
    assert_eq!(
        agent_view.messages[0].content,
        "You are calling Jane Doe about $1520.50."
    );
    assert_eq!(agent_view.messages[1].content, "Hello.");

    // Second call is the persona's view: the agent turn arrives as user input
    let persona_view = &requests[1];
    assert!(persona_view.messages[0].content.contains("Jane Doe"));
    assert_eq!(persona_view.messages[2].content, "Hello Jane.");
}
