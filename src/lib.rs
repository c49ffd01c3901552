// ABOUTME: Library root for the Recoup prompt-evaluation service
// ABOUTME: Exposes the domain model, services, storage, and HTTP surface
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recoup Labs

//! # Recoup
//!
//! Prompt-evaluation service for debt collection voice agents. Recoup
//! synthesizes debtor personas, simulates full collection calls by playing
//! both sides of the conversation through an LLM gateway, judges the agent's
//! performance on a politeness and negotiation rubric, and rewrites the agent
//! prompt from judge feedback under monotonically advancing versions.
//!
//! ## Architecture
//!
//! - [`llm`] - the text-generation gateway trait and the Gemini backend
//! - [`models`] - personas, transcripts, metrics, and test runs
//! - [`database`] - SQLite persistence for personas and test runs
//! - [`prompts`] - versioned agent prompt storage and templates
//! - [`services`] - synthesis, simulation, judging, improvement, orchestration
//! - [`events`] - per-run broadcast channels behind the WebSocket stream
//! - [`routes`] - the REST and WebSocket surface

#![deny(unsafe_code)]

pub mod config;
pub mod database;
pub mod errors;
pub mod events;
pub mod llm;
pub mod logging;
pub mod models;
pub mod prompts;
pub mod resources;
pub mod routes;
pub mod services;
