// ABOUTME: Domain services for the prompt-evaluation loop
// ABOUTME: Persona synthesis, conversation simulation, judging, prompt improvement, orchestration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recoup Labs

//! # Services
//!
//! The evaluation loop proper. Each service is a thin, testable unit over the
//! LLM gateway: the synthesizer invents debtor personas, the simulator plays
//! both sides of a collection call, the judge scores the finished transcript,
//! and the improver rewrites the agent prompt from judge feedback. The
//! orchestrator wires them into the lifecycle of a test run.

pub mod improver;
pub mod judge;
pub mod orchestrator;
pub mod persona_synthesis;
pub mod simulator;
