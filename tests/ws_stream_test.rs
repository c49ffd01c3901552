// ABOUTME: Integration test streaming live run events over a real WebSocket
// ABOUTME: Boots the router on an ephemeral port and reads until the terminal event
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recoup Labs
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use serde_json::Value;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use common::{failing_judgment, test_context, MockGateway};
use recoup::routes;
use recoup::services::orchestrator;

#[tokio::test(flavor = "multi_thread")]
async fn test_websocket_streams_until_terminal_event() {
    let gateway = MockGateway::scripted([
        "Am I speaking with Jane Doe?".to_owned(),
        "Yes, who is asking?".to_owned(),
        failing_judgment(),
    ])
    .with_latency(Duration::from_millis(200));
    let ctx = test_context(gateway).await;
    let persona = common::seed_persona(&ctx.resources).await;

    let app = routes::router(Arc::clone(&ctx.resources));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let (run, _handle) =
        orchestrator::start(Arc::clone(&ctx.resources), "streamed", persona.id, Some(1))
            .await
            .unwrap();

    let url = format!("ws://{addr}/ws/tests/{}", run.id);
    let (mut socket, _) = connect_async(&url).await.unwrap();

    let mut message_events = 0;
    let mut terminal: Option<Value> = None;
    let deadline = tokio::time::timeout(Duration::from_secs(10), async {
        while let Some(frame) = socket.next().await {
            match frame.unwrap() {
                Message::Text(payload) => {
                    let event: Value = serde_json::from_str(&payload).unwrap();
                    match event["type"].as_str() {
                        Some("message") => message_events += 1,
                        Some("end") => {
                            terminal = Some(event);
                            break;
                        }
                        _ => {}
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    })
    .await;
    deadline.unwrap();

    // Both simulated turns streamed before the terminal event
    assert_eq!(message_events, 2);
    let terminal = terminal.expect("terminal event not received");
    assert_eq!(terminal["status"], "failed");
    assert_eq!(terminal["metric"]["politeness"], "too_polite");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_websocket_for_unknown_run_is_rejected() {
    let ctx = test_context(MockGateway::new()).await;
    let app = routes::router(Arc::clone(&ctx.resources));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let url = format!("ws://{addr}/ws/tests/999");
    assert!(connect_async(&url).await.is_err());
}
