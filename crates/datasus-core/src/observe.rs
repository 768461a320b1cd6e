//! Logging and error translation around pipeline operations.
//!
//! Every boundary-facing operation in the pipeline runs through [`observe`]
//! (or [`observe_timed`] when the caller wants the timing back). The wrapper
//! logs entry, exit and elapsed time, and when the operation fails it logs a
//! summary for the [`ErrorKind`](crate::ErrorKind) plus the error detail. The
//! error itself is returned untouched so callers can branch on its kind.

use std::future::Future;

use jiff::Timestamp;

use crate::{Result, TRACING_TARGET_OPERATION, Timing};

/// Value produced by an observed operation together with its timing.
#[derive(Debug, Clone)]
pub struct Observed<T> {
    /// Value returned by the operation.
    pub value: T,
    /// When the operation started and ended.
    pub timing: Timing,
}

/// Runs `operation` with entry/exit logging and error reporting.
pub async fn observe<T, F>(name: &str, operation: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    observe_timed(name, operation)
        .await
        .map(|observed| observed.value)
}

/// Like [`observe`], but also returns the [`Timing`] of a successful run.
pub async fn observe_timed<T, F>(name: &str, operation: F) -> Result<Observed<T>>
where
    F: Future<Output = Result<T>>,
{
    tracing::info!(
        target: TRACING_TARGET_OPERATION,
        operation = name,
        "Entering {name}"
    );

    let started_at = Timestamp::now();
    let result = operation.await;
    let timing = Timing::since(started_at);

    tracing::info!(
        target: TRACING_TARGET_OPERATION,
        operation = name,
        elapsed_ms = timing.elapsed_ms(),
        "Exiting {name}. Duration: {:.2} seconds.",
        timing.seconds()
    );

    match result {
        Ok(value) => Ok(Observed { value, timing }),
        Err(error) => {
            tracing::error!(
                target: TRACING_TARGET_OPERATION,
                operation = name,
                kind = error.kind_str(),
                error = %error,
                "{}",
                error.kind().summary()
            );
            Err(error)
        }
    }
}
