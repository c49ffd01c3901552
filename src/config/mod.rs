// ABOUTME: Configuration management for the Recoup evaluation service
// ABOUTME: Environment-only configuration loaded once at startup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recoup Labs

//! Configuration management and environment loading

pub mod environment;

pub use environment::ServerConfig;
