// ABOUTME: Server binary wiring configuration, storage, gateway, and HTTP routes
// ABOUTME: Seeds the default agent prompt and serves until shutdown
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recoup Labs

//! # Recoup Server Binary
//!
//! Starts the prompt-evaluation service: SQLite storage, the Gemini gateway,
//! the versioned prompt store, and the REST plus WebSocket surface.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use recoup::config::ServerConfig;
use recoup::database::Database;
use recoup::llm::{GeminiProvider, LlmProvider};
use recoup::logging;
use recoup::prompts::{FsPromptStore, PromptStore};
use recoup::resources::ServerResources;
use recoup::routes;

#[derive(Parser)]
#[command(name = "recoup-server")]
#[command(about = "Recoup - prompt evaluation service for debt collection voice agents")]
struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }

    logging::init_from_env()?;
    info!("Starting Recoup evaluation service");
    info!("{}", config.summary());

    let database = Database::new(&config.database_url).await?;

    let gateway = Arc::new(GeminiProvider::from_env()?);
    info!("Gateway provider: {}", gateway.default_model());

    let prompt_store = PromptStore::new(Arc::new(FsPromptStore::new(&config.prompt_dir)));
    prompt_store.seed_default(&config.prompt_version).await?;

    let http_port = config.http_port;
    let resources = Arc::new(ServerResources::new(
        database,
        gateway,
        prompt_store,
        config,
    ));

    let app = routes::router(resources);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", http_port)).await?;
    info!("Listening on port {http_port}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    // Exit cleanly on ctrl-c; failure to install the handler means we can
    // only be killed, which is still acceptable.
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
