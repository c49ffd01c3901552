// ABOUTME: HTTP route assembly for the evaluation service
// ABOUTME: Merges route groups and applies tracing and CORS layers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recoup Labs

//! # HTTP Routes
//!
//! REST surface of the evaluation service plus the per-run WebSocket stream.
//! Each route group is a unit struct with a `routes` constructor taking the
//! shared [`ServerResources`]; [`router`] merges them and layers on request
//! tracing and permissive CORS.

pub mod personas;
pub mod prompts;
pub mod test_runs;
pub mod ws;

pub use personas::PersonaRoutes;
pub use prompts::PromptRoutes;
pub use test_runs::TestRunRoutes;
pub use ws::WsRoutes;

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::resources::ServerResources;

/// Assemble the full application router
#[must_use]
pub fn router(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .merge(PersonaRoutes::routes(Arc::clone(&resources)))
        .merge(TestRunRoutes::routes(Arc::clone(&resources)))
        .merge(PromptRoutes::routes(Arc::clone(&resources)))
        .merge(WsRoutes::routes(resources))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Liveness probe
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}
