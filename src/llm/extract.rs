// ABOUTME: Structured-output extraction from loosely-formatted gateway text
// ABOUTME: Strips an optional markdown code fence before JSON deserialization
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recoup Labs

//! Schema extraction from loosely-structured model output.
//!
//! Models asked for JSON frequently wrap it in a markdown code fence. Every
//! consumer of gateway text that expects structure goes through
//! [`extract_json`] rather than parsing inline, so fence handling lives in
//! exactly one place.

use serde::de::DeserializeOwned;

use crate::errors::AppError;

/// Strip an optional markdown code fence (```json ... ``` or ``` ... ```)
/// from around a payload, returning the inner text trimmed.
#[must_use]
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop an optional language tag on the opening fence line
    let rest = rest
        .split_once('\n')
        .map_or(rest, |(first_line, body)| {
            if first_line.trim().chars().all(char::is_alphanumeric) {
                body
            } else {
                rest
            }
        });

    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Extract a JSON value of type `T` from gateway output.
///
/// # Errors
///
/// Returns [`AppError`] with `SchemaInvalid` if the payload does not parse as
/// the expected shape after fence stripping.
pub fn extract_json<T: DeserializeOwned>(text: &str) -> Result<T, AppError> {
    let payload = strip_code_fence(text);
    serde_json::from_str(payload).map_err(|e| {
        AppError::schema(format!("Gateway output is not valid JSON: {e}"), &[])
    })
}
