// ABOUTME: Persona aggregate storage with creation, lookup, and newest-first listing
// ABOUTME: Stores due dates as ISO-8601 text and amounts as REAL
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Recoup Labs

//! Persona storage. Personas are written once by the synthesizer and never
//! updated afterwards.

use chrono::{NaiveDate, Utc};
use sqlx::sqlite::SqlitePool;
use sqlx::Row;

use crate::errors::{AppError, AppResult};
use crate::models::{Persona, PersonaDraft};

/// Manager for the personas table
pub struct PersonaManager<'a> {
    pool: &'a SqlitePool,
}

impl<'a> PersonaManager<'a> {
    /// Create a manager borrowing the shared pool
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a validated persona draft and return the stored persona
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create(&self, draft: &PersonaDraft) -> AppResult<Persona> {
        let row = sqlx::query(
            r"
            INSERT INTO personas (full_name, age, gender, debt_amount, due_date, description, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            ",
        )
        .bind(&draft.full_name)
        .bind(draft.age)
        .bind(&draft.gender)
        .bind(draft.debt_amount)
        .bind(draft.due_date.format("%Y-%m-%d").to_string())
        .bind(&draft.description)
        .bind(Utc::now().to_rfc3339())
        .fetch_one(self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to insert persona: {e}")))?;

        let id: i64 = row
            .try_get("id")
            .map_err(|e| AppError::database(format!("Failed to read persona id: {e}")))?;

        Ok(Persona {
            id,
            full_name: draft.full_name.clone(),
            age: draft.age,
            gender: draft.gender.clone(),
            debt_amount: draft.debt_amount,
            due_date: draft.due_date,
            description: draft.description.clone(),
        })
    }

    /// Fetch one persona by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored row is malformed.
    pub async fn get(&self, id: i64) -> AppResult<Option<Persona>> {
        let row = sqlx::query(
            r"
            SELECT id, full_name, age, gender, debt_amount, due_date, description
            FROM personas
            WHERE id = ?
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to fetch persona: {e}")))?;

        row.map(|r| row_to_persona(&r)).transpose()
    }

    /// List personas newest-first with offset pagination
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored row is malformed.
    pub async fn list(&self, skip: i64, limit: i64) -> AppResult<Vec<Persona>> {
        let rows = sqlx::query(
            r"
            SELECT id, full_name, age, gender, debt_amount, due_date, description
            FROM personas
            ORDER BY id DESC
            LIMIT ? OFFSET ?
            ",
        )
        .bind(limit)
        .bind(skip)
        .fetch_all(self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list personas: {e}")))?;

        rows.iter().map(row_to_persona).collect()
    }
}

/// Map a database row onto the domain persona
fn row_to_persona(row: &sqlx::sqlite::SqliteRow) -> AppResult<Persona> {
    let due_date_text: String = row
        .try_get("due_date")
        .map_err(|e| AppError::database(format!("Failed to read due_date: {e}")))?;
    let due_date = NaiveDate::parse_from_str(&due_date_text, "%Y-%m-%d")
        .map_err(|e| AppError::database(format!("Malformed due_date '{due_date_text}': {e}")))?;

    Ok(Persona {
        id: row
            .try_get("id")
            .map_err(|e| AppError::database(format!("Failed to read id: {e}")))?,
        full_name: row
            .try_get("full_name")
            .map_err(|e| AppError::database(format!("Failed to read full_name: {e}")))?,
        age: row
            .try_get("age")
            .map_err(|e| AppError::database(format!("Failed to read age: {e}")))?,
        gender: row
            .try_get("gender")
            .map_err(|e| AppError::database(format!("Failed to read gender: {e}")))?,
        debt_amount: row
            .try_get("debt_amount")
            .map_err(|e| AppError::database(format!("Failed to read debt_amount: {e}")))?,
        due_date,
        description: row
            .try_get("description")
            .map_err(|e| AppError::database(format!("Failed to read description: {e}")))?,
    })
}
