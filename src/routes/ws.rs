// ABOUTME: WebSocket route streaming live events for one test run
// ABOUTME: Forwards broadcast events until the channel closes or the client leaves
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recoup Labs

//! Live test run streaming

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::Response,
    routing::get,
    Router,
};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::events::RunEvent;
use crate::resources::ServerResources;

/// WebSocket routes handler
pub struct WsRoutes;

impl WsRoutes {
    /// Create all WebSocket routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/ws/tests/:test_run_id", get(Self::stream_test))
            .with_state(resources)
    }

    /// Upgrade and stream one run's events.
    ///
    /// Subscribing happens before the upgrade so an unknown or already
    /// torn-down run is rejected with a regular 404 instead of a dead socket.
    async fn stream_test(
        ws: WebSocketUpgrade,
        Path(test_run_id): Path<i64>,
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Response, AppError> {
        let receiver = resources
            .event_bus
            .subscribe(test_run_id)
            .await
            .ok_or_else(|| {
                AppError::not_found(format!("No live event stream for test run {test_run_id}"))
            })?;

        info!("WebSocket subscriber attached to run {test_run_id}");
        Ok(ws.on_upgrade(move |socket| Self::forward_events(socket, receiver, test_run_id)))
    }

    /// Pump broadcast events into the socket
    async fn forward_events(
        mut socket: WebSocket,
        mut receiver: broadcast::Receiver<RunEvent>,
        run_id: i64,
    ) {
        loop {
            tokio::select! {
                event = receiver.recv() => match event {
                    Ok(event) => {
                        let Ok(payload) = serde_json::to_string(&event) else {
                            continue;
                        };
                        if socket.send(Message::Text(payload)).await.is_err() {
                            debug!("WebSocket client for run {run_id} disconnected");
                            break;
                        }
                        if matches!(event, RunEvent::End { .. }) {
                            let _ = socket.send(Message::Close(None)).await;
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!("WebSocket subscriber for run {run_id} lagged by {skipped} events");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        let _ = socket.send(Message::Close(None)).await;
                        break;
                    }
                },
                incoming = socket.recv() => {
                    // Clients only listen on this stream; any close or error
                    // ends the session.
                    if incoming.is_none_or(|message| message.is_err()) {
                        debug!("WebSocket client for run {run_id} went away");
                        break;
                    }
                }
            }
        }
    }
}
