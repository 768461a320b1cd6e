//! Telemetry and tracing configuration.

mod tracing;

use anyhow::Context;

/// Installs the process-wide tracing subscriber.
///
/// # Errors
///
/// Returns an error if a subscriber is already installed or `RUST_LOG` is
/// not a valid filter.
pub(crate) fn init_tracing() -> anyhow::Result<()> {
    tracing::init_tracing().context("Failed to initialize tracing")
}
