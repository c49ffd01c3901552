// ABOUTME: Live run event types and the per-run broadcast registry
// ABOUTME: WebSocket sessions subscribe here to stream simulation progress
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recoup Labs

//! # Run Events
//!
//! Each live test run owns a broadcast channel in the [`RunEventBus`]
//! registry. The orchestrator publishes [`RunEvent`]s as the simulation
//! progresses; any number of WebSocket sessions subscribe and forward them to
//! clients. Publishing is fire-and-forget: a run proceeds identically whether
//! zero or many subscribers are attached.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use crate::models::{Metric, Persona, RunStatus, Speaker};

/// Broadcast channel capacity per run. A slow subscriber that falls more than
/// this many events behind observes a lag error and resumes from the oldest
/// retained event.
const CHANNEL_CAPACITY: usize = 256;

/// How long a finished run's channel stays registered so late subscribers can
/// still observe the terminal event.
pub const TEARDOWN_GRACE: Duration = Duration::from_secs(60);

/// One progress event on a live test run
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RunEvent {
    /// Simulation started
    Start {
        /// ID of the run
        test_run_id: i64,
        /// Persona the run converses with
        persona: Persona,
        /// Prompt version the run executes against
        prompt_version: String,
    },
    /// One utterance was produced and persisted
    Message {
        /// Who spoke
        role: Speaker,
        /// Spoken text
        content: String,
    },
    /// The run aborted before judging completed normally
    Error {
        /// Operator-facing description of the failure
        message: String,
    },
    /// The run reached a terminal state
    End {
        /// Judge metric; absent when the judge itself failed
        metric: Option<Metric>,
        /// Judge feedback; absent when the judge itself failed
        feedback: Option<String>,
        /// Terminal status
        status: RunStatus,
    },
}

/// Registry of per-run broadcast channels
#[derive(Clone, Default)]
pub struct RunEventBus {
    channels: Arc<RwLock<HashMap<i64, broadcast::Sender<RunEvent>>>>,
}

impl RunEventBus {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a channel for a run. Idempotent; re-opening an existing run
    /// keeps the current channel.
    pub async fn open(&self, run_id: i64) {
        let mut channels = self.channels.write().await;
        channels
            .entry(run_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
    }

    /// Subscribe to a run's events. Returns `None` when the run is unknown or
    /// already torn down.
    pub async fn subscribe(&self, run_id: i64) -> Option<broadcast::Receiver<RunEvent>> {
        let channels = self.channels.read().await;
        channels.get(&run_id).map(broadcast::Sender::subscribe)
    }

    /// Publish an event to a run's subscribers. Dropped silently when the run
    /// has no channel or no subscribers.
    pub async fn publish(&self, run_id: i64, event: RunEvent) {
        let channels = self.channels.read().await;
        if let Some(sender) = channels.get(&run_id) {
            // send only fails when there are no receivers
            let _ = sender.send(event);
        }
    }

    /// Remove a run's channel after the teardown grace period, letting late
    /// subscribers still catch the terminal event.
    pub fn close_after_grace(&self, run_id: i64) {
        let channels = Arc::clone(&self.channels);
        tokio::spawn(async move {
            tokio::time::sleep(TEARDOWN_GRACE).await;
            channels.write().await.remove(&run_id);
            debug!("Tore down event channel for run {run_id}");
        });
    }

    /// Remove a run's channel immediately
    pub async fn close_now(&self, run_id: i64) {
        self.channels.write().await.remove(&run_id);
    }
}
