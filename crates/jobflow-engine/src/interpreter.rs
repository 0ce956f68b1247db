//! Classification of routine output.
//!
//! Routines signal failure in-band: any output beginning with `ERROR:` is an
//! error whose message is everything after those six characters. There is no
//! other status channel.

use crate::error::{EngineError, Result};

/// Sentinel prefix marking an error payload.
pub const ERROR_PREFIX: &str = "ERROR:";

/// Classified routine output. Never persisted as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutineResult {
    pub is_error: bool,
    pub payload: String,
}

impl RoutineResult {
    pub fn success(payload: impl Into<String>) -> Self {
        Self {
            is_error: false,
            payload: payload.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            is_error: true,
            payload: message.into(),
        }
    }

    /// Convert an error result into [`EngineError::RoutineReported`].
    pub fn into_result(self) -> Result<String> {
        if self.is_error {
            Err(EngineError::RoutineReported(self.payload))
        } else {
            Ok(self.payload)
        }
    }
}

/// Classify raw routine output.
///
/// The payload is never trimmed or coerced.
pub fn classify(raw: &str) -> RoutineResult {
    match raw.strip_prefix(ERROR_PREFIX) {
        Some(message) => RoutineResult::error(message),
        None => RoutineResult::success(raw),
    }
}
