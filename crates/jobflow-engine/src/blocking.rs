//! Bounded execution of blocking store work from async code.

use std::time::Duration;

use crate::error::{EngineError, Result};

/// Run `f` on the blocking pool, failing with [`EngineError::Timeout`] when it
/// does not finish within `limit`.
///
/// A timed-out task is abandoned, not cancelled: the store call may still
/// complete in the background, and its transaction commits or rolls back as a
/// unit.
pub(crate) async fn run_bounded<T, F>(limit: Duration, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let handle = tokio::task::spawn_blocking(f);
    match tokio::time::timeout(limit, handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(EngineError::Internal(join_err.to_string())),
        Err(_) => Err(EngineError::Timeout(limit)),
    }
}
