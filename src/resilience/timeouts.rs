//! Optional deadlines for connection phases.
//!
//! # Responsibilities
//! - Bound the origin connect and each I/O phase when a limit is configured
//! - Leave phases unbounded when no limit is set
//!
//! # Design Decisions
//! - Unset by default: a stalled peer holds its connection task until it closes
//! - Uses Tokio's timeout facilities
//! - A timeout is its own error so it can be told apart from I/O failures

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// A connection phase ran past its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{phase} timed out after {after:?}")]
pub struct TimedOut {
    pub phase: &'static str,
    pub after: Duration,
}

/// Run `fut`, bounded by `limit` when one is given.
pub async fn with_deadline<F: Future>(
    limit: Option<Duration>,
    phase: &'static str,
    fut: F,
) -> Result<F::Output, TimedOut> {
    match limit {
        Some(after) => tokio::time::timeout(after, fut)
            .await
            .map_err(|_| TimedOut { phase, after }),
        None => Ok(fut.await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_limit_waits_for_completion() {
        let out = with_deadline(None, "test", async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            7
        })
        .await;
        assert_eq!(out, Ok(7));
    }

    #[tokio::test]
    async fn limit_reports_phase() {
        let err = with_deadline(
            Some(Duration::from_millis(20)),
            "origin read",
            std::future::pending::<()>(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.phase, "origin read");
        assert_eq!(err.after, Duration::from_millis(20));
        assert_eq!(err.to_string(), "origin read timed out after 20ms");
    }
}
