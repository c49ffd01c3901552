// ABOUTME: Synthesizes realistic debtor personas through the LLM gateway
// ABOUTME: Validates the six-field schema and normalizes types before storage
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recoup Labs

//! Persona synthesis.
//!
//! Asks the gateway for a JSON persona, then validates the response against
//! the six-field schema before anything touches storage. A response missing
//! fields or carrying wrong types is rejected with a schema error naming the
//! offending fields; nothing is repaired or defaulted.

use chrono::NaiveDate;
use serde_json::Value;
use tracing::instrument;

use crate::errors::{AppError, AppResult};
use crate::llm::extract::extract_json;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use crate::models::PersonaDraft;

/// Fields every synthesized persona must carry, sorted for stable error
/// messages
const REQUIRED_FIELDS: [&str; 6] = [
    "age",
    "debt_amount",
    "description",
    "due_date",
    "full_name",
    "gender",
];

const SYNTHESIS_INSTRUCTION: &str = "\
You invent realistic debtor personas for testing a debt collection voice \
agent. Respond with a single JSON object and nothing else, carrying exactly \
these fields:

- \"full_name\": a realistic full name
- \"age\": an integer between 18 and 75
- \"gender\": the persona's gender
- \"debt_amount\": the outstanding balance as a number
- \"due_date\": the original due date in YYYY-MM-DD format
- \"description\": 200 to 500 words covering the persona's life situation, \
why the debt is unpaid, their attitude toward the collector, and how they \
tend to behave on the phone

Vary occupation, temperament, and financial circumstances between personas. \
Do not add any fields beyond the six listed.";

/// Synthesize one debtor persona through the gateway.
///
/// `guidance` steers the generation (e.g. "an elderly pensioner on a fixed
/// income"); when absent a generic request is sent.
///
/// # Errors
///
/// Returns `GenerationFailed` if the gateway call fails and `SchemaInvalid`
/// if the response does not satisfy the persona schema.
#[instrument(skip(gateway, guidance))]
pub async fn synthesize(
    gateway: &dyn LlmProvider,
    guidance: Option<&str>,
) -> AppResult<PersonaDraft> {
    let request = ChatRequest::new(vec![
        ChatMessage::system(SYNTHESIS_INSTRUCTION),
        ChatMessage::user(guidance.unwrap_or("Generate a new debtor persona.")),
    ]);

    let response = gateway.complete(&request).await?;
    let value: Value = extract_json(&response.content)?;
    draft_from_value(&value)
}

/// Validate a raw JSON persona and normalize it into a draft
fn draft_from_value(value: &Value) -> AppResult<PersonaDraft> {
    let missing: Vec<String> = REQUIRED_FIELDS
        .iter()
        .filter(|field| value.get(**field).is_none_or(Value::is_null))
        .map(|field| (*field).to_owned())
        .collect();
    if !missing.is_empty() {
        return Err(AppError::schema(
            format!("Persona is missing required fields: {}", missing.join(", ")),
            &missing,
        ));
    }

    let full_name = string_field(value, "full_name")?;
    let gender = string_field(value, "gender")?;
    let description = string_field(value, "description")?;

    let age = value["age"]
        .as_i64()
        .ok_or_else(|| field_type_error("age", "integer"))?;

    let debt_amount = value["debt_amount"]
        .as_f64()
        .ok_or_else(|| field_type_error("debt_amount", "number"))?;

    let due_date_text = string_field(value, "due_date")?;
    let due_date = NaiveDate::parse_from_str(&due_date_text, "%Y-%m-%d").map_err(|_| {
        AppError::schema(
            format!("Persona field 'due_date' is not a YYYY-MM-DD date: '{due_date_text}'"),
            &["due_date".to_owned()],
        )
    })?;

    Ok(PersonaDraft {
        full_name,
        age,
        gender,
        debt_amount,
        due_date,
        description,
    })
}

fn string_field(value: &Value, field: &str) -> AppResult<String> {
    value[field]
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| field_type_error(field, "string"))
}

fn field_type_error(field: &str, expected: &str) -> AppError {
    AppError::schema(
        format!("Persona field '{field}' is not a {expected}"),
        &[field.to_owned()],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use serde_json::json;

    fn valid_value() -> Value {
        json!({
            "full_name": "Marcus Webb",
            "age": 37,
            "gender": "male",
            "debt_amount": 2340.75,
            "due_date": "2025-01-31",
            "description": "A warehouse supervisor between contracts."
        })
    }

    #[test]
    fn test_valid_persona_accepted() {
        let draft = draft_from_value(&valid_value()).unwrap();
        assert_eq!(draft.full_name, "Marcus Webb");
        assert_eq!(draft.age, 37);
        assert!((draft.debt_amount - 2340.75).abs() < f64::EPSILON);
        assert_eq!(draft.due_date.to_string(), "2025-01-31");
    }

    #[test]
    fn test_integer_debt_amount_accepted() {
        let mut value = valid_value();
        value["debt_amount"] = json!(1800);
        let draft = draft_from_value(&value).unwrap();
        assert!((draft.debt_amount - 1800.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_fields_named_sorted() {
        let value = json!({"full_name": "Marcus Webb", "gender": "male"});
        let error = draft_from_value(&value).unwrap_err();
        assert_eq!(error.code, ErrorCode::SchemaInvalid);
        let missing = error.details["missing_fields"].as_array().unwrap();
        let names: Vec<&str> = missing.iter().filter_map(Value::as_str).collect();
        assert_eq!(names, ["age", "debt_amount", "description", "due_date"]);
    }

    #[test]
    fn test_null_field_counts_as_missing() {
        let mut value = valid_value();
        value["description"] = Value::Null;
        let error = draft_from_value(&value).unwrap_err();
        assert_eq!(error.code, ErrorCode::SchemaInvalid);
    }

    #[test]
    fn test_bad_due_date_rejected() {
        let mut value = valid_value();
        value["due_date"] = json!("January 31st");
        let error = draft_from_value(&value).unwrap_err();
        assert_eq!(error.code, ErrorCode::SchemaInvalid);
        assert!(error.message.contains("due_date"));
    }

    #[test]
    fn test_wrong_type_rejected() {
        let mut value = valid_value();
        value["age"] = json!("thirty-seven");
        let error = draft_from_value(&value).unwrap_err();
        assert_eq!(error.code, ErrorCode::SchemaInvalid);
        assert!(error.message.contains("age"));
    }
}
