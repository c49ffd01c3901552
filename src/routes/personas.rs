// ABOUTME: Persona route handlers for synthesis and listing
// ABOUTME: Generation goes through the gateway and persists only validated personas
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recoup Labs

//! Persona routes

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::models::Persona;
use crate::resources::ServerResources;
use crate::services::persona_synthesis;

/// Request body for persona generation; the whole body is optional
#[derive(Debug, Default, Deserialize)]
pub struct GeneratePersonaRequest {
    /// Optional guidance steering the generated persona
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Pagination parameters for persona listing
#[derive(Debug, Deserialize)]
pub struct ListPersonasQuery {
    /// Rows to skip
    #[serde(default)]
    pub skip: i64,
    /// Maximum rows to return
    #[serde(default = "default_limit")]
    pub limit: i64,
}

const fn default_limit() -> i64 {
    50
}

/// Persona routes handler
pub struct PersonaRoutes;

impl PersonaRoutes {
    /// Create all persona routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/personas/generate", post(Self::generate_persona))
            .route("/api/personas", get(Self::list_personas))
            .with_state(resources)
    }

    /// Synthesize a new persona and store it
    async fn generate_persona(
        State(resources): State<Arc<ServerResources>>,
        body: Option<Json<GeneratePersonaRequest>>,
    ) -> Result<(StatusCode, Json<Persona>), AppError> {
        let request = body.map(|Json(request)| request).unwrap_or_default();
        let draft =
            persona_synthesis::synthesize(resources.gateway.as_ref(), request.prompt.as_deref())
                .await?;
        let persona = resources.database.personas().create(&draft).await?;
        info!("Generated persona {} ('{}')", persona.id, persona.full_name);
        Ok((StatusCode::CREATED, Json(persona)))
    }

    /// List stored personas, newest first
    async fn list_personas(
        State(resources): State<Arc<ServerResources>>,
        Query(query): Query<ListPersonasQuery>,
    ) -> Result<Json<Vec<Persona>>, AppError> {
        let personas = resources
            .database
            .personas()
            .list(query.skip, query.limit)
            .await?;
        Ok(Json(personas))
    }
}
