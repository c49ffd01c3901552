// ABOUTME: Dual-role conversation simulator playing agent and persona turn by turn
// ABOUTME: Persists and broadcasts each turn before requesting the next one
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recoup Labs

//! Conversation simulation.
//!
//! The simulator drives both sides of a collection call through the same
//! gateway, alternating system instructions and role projections. From the
//! agent's point of view the persona's utterances are user input; from the
//! persona's point of view the agent's utterances are user input. Each
//! generated turn is durable in the database and broadcast to subscribers
//! before the next gateway call starts, so an interrupted run leaves a
//! truthful transcript behind.

use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::events::{RunEvent, RunEventBus};
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use crate::models::{ConversationTurn, Persona};

/// Pause between iterations so a streaming client can render the exchange
const ITERATION_PAUSE: Duration = Duration::from_millis(100);

/// Result of driving one run's simulation loop.
///
/// A gateway failure does not discard the conversation: the turns recorded
/// before the failure stay in `transcript` and the failure itself lands in
/// `abort`, letting the caller judge the partial transcript.
#[derive(Debug)]
pub struct SimulationOutcome {
    /// Final transcript, including the seed turn
    pub transcript: Vec<ConversationTurn>,
    /// Gateway failure that cut the loop short, if any
    pub abort: Option<AppError>,
}

/// Build the completion request for the agent's next utterance.
///
/// The agent sees persona turns as user input and its own prior turns as
/// model output.
#[must_use]
pub fn agent_request(agent_prompt: &str, transcript: &[ConversationTurn]) -> ChatRequest {
    let mut messages = vec![ChatMessage::system(agent_prompt)];
    for turn in transcript {
        messages.push(match turn {
            ConversationTurn::Persona(text) => ChatMessage::user(text.clone()),
            ConversationTurn::Agent(text) => ChatMessage::assistant(text.clone()),
        });
    }
    ChatRequest::new(messages)
}

/// Build the completion request for the persona's next utterance.
///
/// The projection swaps relative to [`agent_request`]: agent turns become
/// user input, persona turns become model output.
#[must_use]
pub fn persona_request(persona: &Persona, transcript: &[ConversationTurn]) -> ChatRequest {
    let mut messages = vec![ChatMessage::system(persona_system_prompt(persona))];
    for turn in transcript {
        messages.push(match turn {
            ConversationTurn::Agent(text) => ChatMessage::user(text.clone()),
            ConversationTurn::Persona(text) => ChatMessage::assistant(text.clone()),
        });
    }
    ChatRequest::new(messages)
}

/// System instruction putting the model in the debtor's shoes
fn persona_system_prompt(persona: &Persona) -> String {
    format!(
        "You are {full_name}, a {age}-year-old {gender} with an unpaid debt of \
         ${debt_amount:.2} that was due on {due_date}. Background: {description}\n\n\
         You are on a phone call with a debt collection agent. Stay fully in \
         character: react the way this person would, with their excuses, worries, \
         and manner of speaking. Keep each reply short and conversational, and \
         never mention that you are an AI or part of a simulation.",
        full_name = persona.full_name,
        age = persona.age,
        gender = persona.gender,
        debt_amount = persona.debt_amount,
        due_date = persona.due_date.format("%Y-%m-%d"),
        description = persona.description,
    )
}

/// Conversation simulator bound to a gateway
pub struct Simulator<'a> {
    gateway: &'a dyn LlmProvider,
}

impl<'a> Simulator<'a> {
    /// Create a simulator over the given gateway
    #[must_use]
    pub const fn new(gateway: &'a dyn LlmProvider) -> Self {
        Self { gateway }
    }

    /// Run `iterations` agent/persona exchanges on top of the run's stored
    /// transcript.
    ///
    /// Every generated turn is persisted and broadcast before the next
    /// gateway call. A gateway failure stops the loop without retrying and
    /// surfaces in [`SimulationOutcome::abort`]; the transcript recorded so
    /// far is kept so the caller can still judge it.
    ///
    /// # Errors
    ///
    /// Returns an error only for database failures; gateway failures are the
    /// abort path, not an error.
    #[instrument(skip_all, fields(run_id = run_id, iterations = iterations))]
    pub async fn run(
        &self,
        database: &Database,
        event_bus: &RunEventBus,
        run_id: i64,
        persona: &Persona,
        agent_prompt: &str,
        iterations: u32,
    ) -> AppResult<SimulationOutcome> {
        let run = database.test_runs().get(run_id).await?.ok_or_else(|| {
            AppError::not_found(format!("Test run {run_id} not found"))
        })?;
        let mut transcript = run.conversation;

        for iteration in 0..iterations {
            debug!("Simulation iteration {} of {iterations}", iteration + 1);

            let agent_text = match self
                .gateway
                .complete(&agent_request(agent_prompt, &transcript))
                .await
            {
                Ok(response) => response.content,
                Err(e) => {
                    warn!("Agent generation failed, aborting remaining iterations: {e}");
                    return Ok(SimulationOutcome {
                        transcript,
                        abort: Some(e),
                    });
                }
            };
            transcript = self
                .record_turn(
                    database,
                    event_bus,
                    run_id,
                    ConversationTurn::Agent(agent_text),
                )
                .await?;

            let persona_text = match self
                .gateway
                .complete(&persona_request(persona, &transcript))
                .await
            {
                Ok(response) => response.content,
                Err(e) => {
                    warn!("Persona generation failed, aborting remaining iterations: {e}");
                    return Ok(SimulationOutcome {
                        transcript,
                        abort: Some(e),
                    });
                }
            };
            transcript = self
                .record_turn(
                    database,
                    event_bus,
                    run_id,
                    ConversationTurn::Persona(persona_text),
                )
                .await?;

            tokio::time::sleep(ITERATION_PAUSE).await;
        }

        Ok(SimulationOutcome {
            transcript,
            abort: None,
        })
    }

    /// Persist a turn, then broadcast it
    async fn record_turn(
        &self,
        database: &Database,
        event_bus: &RunEventBus,
        run_id: i64,
        turn: ConversationTurn,
    ) -> AppResult<Vec<ConversationTurn>> {
        let transcript = database.test_runs().append_turn(run_id, &turn).await?;
        event_bus
            .publish(
                run_id,
                RunEvent::Message {
                    role: turn.speaker(),
                    content: turn.text().to_owned(),
                },
            )
            .await;
        Ok(transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MessageRole;
    use chrono::NaiveDate;

    fn persona() -> Persona {
        Persona {
            id: 1,
            full_name: "Jane Doe".to_owned(),
            age: 41,
            gender: "female".to_owned(),
            debt_amount: 1520.5,
            due_date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            description: "Single mother of two, recently laid off.".to_owned(),
        }
    }

    fn transcript() -> Vec<ConversationTurn> {
        vec![
            ConversationTurn::seed(),
            ConversationTurn::Agent("Am I speaking with Jane Doe?".to_owned()),
            ConversationTurn::Persona("Yes, who is asking?".to_owned()),
        ]
    }

    #[test]
    fn test_agent_projection_maps_persona_to_user() {
        let request = agent_request("You are an agent.", &transcript());
        let roles: Vec<MessageRole> = request.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            [
                MessageRole::System,
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::User,
            ]
        );
        assert_eq!(request.messages[0].content, "You are an agent.");
    }

    #[test]
    fn test_persona_projection_swaps_roles() {
        let request = persona_request(&persona(), &transcript());
        let roles: Vec<MessageRole> = request.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            [
                MessageRole::System,
                MessageRole::Assistant,
                MessageRole::User,
                MessageRole::Assistant,
            ]
        );
    }

    #[test]
    fn test_persona_system_prompt_carries_profile() {
        let prompt = persona_system_prompt(&persona());
        assert!(prompt.contains("Jane Doe"));
        assert!(prompt.contains("$1520.50"));
        assert!(prompt.contains("2025-03-14"));
        assert!(prompt.contains("laid off"));
    }
}
