//! Required fields in request bodies.
//!
//! Clients send ids either as JSON numbers or as numeric strings. Text fields
//! must be present but may be empty.

use jobflow_engine::EngineError;
use serde::Deserialize;

use crate::error::ServerError;

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IdField {
    Number(i64),
    Text(String),
}

/// Parse a required id field, rejecting missing, blank and non-numeric values.
pub fn require_id(field: &str, value: Option<&IdField>) -> Result<i64, ServerError> {
    let invalid = |reason: &str| {
        ServerError::Engine(EngineError::Validation(format!("{field} {reason}")))
    };
    match value {
        None => Err(invalid("is required")),
        Some(IdField::Number(n)) => Ok(*n),
        Some(IdField::Text(s)) if s.trim().is_empty() => Err(invalid("must not be empty")),
        Some(IdField::Text(s)) => s
            .trim()
            .parse()
            .map_err(|_| invalid("must be an integer")),
    }
}

/// Take a required text field, rejecting an absent (or `null`) value.
pub fn require_text(field: &str, value: Option<String>) -> Result<String, ServerError> {
    value.ok_or_else(|| {
        ServerError::Engine(EngineError::Validation(format!("{field} is required")))
    })
}
