// ABOUTME: Core domain model for personas, test runs, transcripts, and judge metrics
// ABOUTME: Defines the wire shapes shared by storage, services, and the HTTP layer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recoup Labs

//! # Domain Model
//!
//! Data structures for the prompt-evaluation domain: synthetic debtor
//! personas, test runs, conversation transcripts, and the two-axis judge
//! metric. Conversation turns serialize as single-key objects
//! (`{"agent": text}` / `{"persona": text}`) so stored transcripts match the
//! live event payloads.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::AppError;

// ============================================================================
// Persona
// ============================================================================

/// Synthetic debtor profile used as the conversational partner in a test run.
///
/// Created once by the persona synthesizer and immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    /// Unique persona ID
    pub id: i64,
    /// Realistic full name
    pub full_name: String,
    /// Age in years (18-75)
    pub age: i64,
    /// Gender identity
    pub gender: String,
    /// Original amount owed
    pub debt_amount: f64,
    /// Payment due date
    pub due_date: NaiveDate,
    /// Free-text persona description (200-500 words)
    pub description: String,
}

/// A validated persona that has not been stored yet.
///
/// Produced by the persona synthesizer after schema validation and
/// normalization; the persona store assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaDraft {
    /// Realistic full name
    pub full_name: String,
    /// Age in years (18-75)
    pub age: i64,
    /// Gender identity
    pub gender: String,
    /// Original amount owed
    pub debt_amount: f64,
    /// Payment due date
    pub due_date: NaiveDate,
    /// Free-text persona description (200-500 words)
    pub description: String,
}

// ============================================================================
// Conversation
// ============================================================================

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    /// The collection agent under evaluation
    Agent,
    /// The synthetic debtor persona
    Persona,
}

impl Speaker {
    /// String form used in event payloads and transcript flattening
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Persona => "persona",
        }
    }
}

/// One utterance in a simulated conversation.
///
/// Serializes as a single-key object, e.g. `{"agent": "Hello Jane."}`.
/// Turns are append-only; a turn is never mutated once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationTurn {
    /// Utterance by the collection agent
    Agent(String),
    /// Utterance by the debtor persona
    Persona(String),
}

impl ConversationTurn {
    /// The seed turn every transcript starts with
    #[must_use]
    pub fn seed() -> Self {
        Self::Persona("Hello.".to_owned())
    }

    /// Who spoke this turn
    #[must_use]
    pub const fn speaker(&self) -> Speaker {
        match self {
            Self::Agent(_) => Speaker::Agent,
            Self::Persona(_) => Speaker::Persona,
        }
    }

    /// The spoken text
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Agent(text) | Self::Persona(text) => text,
        }
    }
}

// ============================================================================
// Judge Metric
// ============================================================================

/// Politeness axis of the judge rubric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Politeness {
    /// Overly accommodating, insufficiently firm
    TooPolite,
    /// Respectful but firm - the target
    Polite,
    /// Disrespectful or aggressive
    Impolite,
    /// Threatening or abusive
    TooImpolite,
}

/// Negotiation-strength axis of the judge rubric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegotiationLevel {
    /// Accepts excuses, no push for commitment
    Low,
    /// Some persistence, no concrete arrangement
    Medium,
    /// Strong, persistent push toward payment commitments - the target
    Hard,
}

/// Two-axis judgment of a finished transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    /// Politeness rating
    pub politeness: Politeness,
    /// Negotiation-strength rating
    pub negotiation_level: NegotiationLevel,
}

// ============================================================================
// Test Run
// ============================================================================

/// Lifecycle state of a test run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Simulation in progress
    Running,
    /// Judged and met both rubric targets
    Passed,
    /// Judged and missed at least one rubric target
    Failed,
}

impl RunStatus {
    /// String form stored in the database
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Passed => "passed",
            Self::Failed => "failed",
        }
    }

    /// Whether the run has reached a terminal state
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Passed | Self::Failed)
    }
}

impl FromStr for RunStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(Self::Running),
            "passed" => Ok(Self::Passed),
            "failed" => Ok(Self::Failed),
            other => Err(AppError::invalid_format(format!(
                "Unknown run status: {other}"
            ))),
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One full simulated conversation plus judgment cycle.
///
/// `prompt_version` is snapshotted at creation and never changes, even if the
/// prompt store advances past it. `metric`, `feedback`, and a terminal
/// `status` are written together, exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestRun {
    /// Unique run ID
    pub id: i64,
    /// Operator-chosen run name
    pub name: String,
    /// Persona this run converses with
    pub persona_id: i64,
    /// Ordered transcript; starts with the seed persona turn
    pub conversation: Vec<ConversationTurn>,
    /// Judge metric, present once judged
    pub metric: Option<Metric>,
    /// Judge feedback, present once judged
    pub feedback: Option<String>,
    /// Lifecycle status
    pub status: RunStatus,
    /// Agent prompt version the run was executed against
    pub prompt_version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_serializes_as_single_key_object() {
        let turn = ConversationTurn::Agent("Good morning.".to_owned());
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json, serde_json::json!({"agent": "Good morning."}));

        let turn = ConversationTurn::Persona("Who is this?".to_owned());
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json, serde_json::json!({"persona": "Who is this?"}));
    }

    #[test]
    fn test_turn_round_trips() {
        let turns = vec![
            ConversationTurn::seed(),
            ConversationTurn::Agent("Hello, am I speaking with Jane?".to_owned()),
        ];
        let json = serde_json::to_string(&turns).unwrap();
        let back: Vec<ConversationTurn> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, turns);
    }

    #[test]
    fn test_seed_turn_is_persona_hello() {
        let seed = ConversationTurn::seed();
        assert_eq!(seed.speaker(), Speaker::Persona);
        assert_eq!(seed.text(), "Hello.");
    }

    #[test]
    fn test_metric_serde_snake_case() {
        let metric = Metric {
            politeness: Politeness::TooPolite,
            negotiation_level: NegotiationLevel::Hard,
        };
        let json = serde_json::to_value(metric).unwrap();
        assert_eq!(json["politeness"], "too_polite");
        assert_eq!(json["negotiation_level"], "hard");
    }

    #[test]
    fn test_run_status_parse() {
        assert_eq!("running".parse::<RunStatus>().unwrap(), RunStatus::Running);
        assert_eq!("passed".parse::<RunStatus>().unwrap(), RunStatus::Passed);
        assert!("done".parse::<RunStatus>().is_err());
        assert!(RunStatus::Failed.is_terminal());
        assert!(!RunStatus::Running.is_terminal());
    }
}
