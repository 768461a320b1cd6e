//! Timing information for operations.
//!
//! This module provides the [`Timing`] struct for capturing start and end
//! timestamps of pipeline operations.

use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};

/// Timing information for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    /// When the operation started.
    pub started_at: Timestamp,
    /// When the operation ended.
    pub ended_at: Timestamp,
}

impl Timing {
    /// Create a new timing with the given start and end timestamps.
    pub fn new(started_at: Timestamp, ended_at: Timestamp) -> Self {
        Self {
            started_at,
            ended_at,
        }
    }

    /// Create a timing that started at `started_at` and ends now.
    pub fn since(started_at: Timestamp) -> Self {
        Self::new(started_at, Timestamp::now())
    }

    /// Get the duration of the operation.
    pub fn duration(&self) -> SignedDuration {
        self.ended_at.duration_since(self.started_at)
    }

    /// Duration in fractional seconds, for log output.
    ///
    /// Zero when the wall clock stepped backwards during the operation.
    pub fn seconds(&self) -> f64 {
        self.duration().as_secs_f64().max(0.0)
    }

    /// Duration in whole milliseconds, never negative.
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.duration().as_millis()).unwrap_or(0)
    }
}
