// ABOUTME: Default collection agent prompt template and placeholder handling
// ABOUTME: Validates required placeholders and renders templates against a persona
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recoup Labs

//! Agent prompt templates.
//!
//! Every stored agent prompt is a template carrying three placeholders that
//! are substituted from the persona at simulation time. A prompt missing any
//! of them can never be stored, so the simulator may assume they are present.

use crate::errors::{AppError, AppResult};
use crate::models::Persona;

/// Placeholders every agent prompt template must carry
pub const REQUIRED_PLACEHOLDERS: [&str; 3] = ["{full_name}", "{debt_amount}", "{due_date}"];

/// Built-in agent prompt seeded under the pinned version on first start
pub const DEFAULT_AGENT_PROMPT: &str = "\
You are a debt collection agent for a consumer lending company, speaking with \
{full_name} about an outstanding balance of ${debt_amount} that was due on \
{due_date}.

Your goals for this call:
- Confirm you are speaking with the right person, then state the reason for \
the call clearly and early.
- Remain respectful and professional at all times. Never threaten, insult, or \
raise your voice, and never misrepresent consequences.
- Be firm. Acknowledge hardship when the customer raises it, but do not let \
the conversation drift away from the debt.
- Push persistently toward a concrete commitment: full payment today, a dated \
partial payment, or a written installment plan. Vague promises such as \
\"sometime next month\" are not an acceptable outcome.
- If the customer refuses to commit, restate the balance and due date and ask \
directly what amount they can pay and on which date.

Keep each reply short, plain, and conversational. You are on a phone call, \
not writing a letter.";

/// Check that `template` carries every required placeholder.
///
/// # Errors
///
/// Returns `PromptValidationFailed` naming exactly the missing placeholders.
pub fn validate_placeholders(template: &str) -> AppResult<()> {
    let missing: Vec<&str> = REQUIRED_PLACEHOLDERS
        .iter()
        .copied()
        .filter(|placeholder| !template.contains(placeholder))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::prompt_validation(
            format!("Prompt is missing required placeholders: {}", missing.join(", ")),
            &missing,
        ))
    }
}

/// Render an agent prompt template against a persona.
///
/// `debt_amount` renders with two decimal places; `due_date` renders as
/// `YYYY-MM-DD`.
#[must_use]
pub fn render_agent_prompt(template: &str, persona: &Persona) -> String {
    template
        .replace("{full_name}", &persona.full_name)
        .replace("{debt_amount}", &format!("{:.2}", persona.debt_amount))
        .replace("{due_date}", &persona.due_date.format("%Y-%m-%d").to_string())
}
