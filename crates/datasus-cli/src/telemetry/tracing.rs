//! Tracing initialization and configuration.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Filter used when `RUST_LOG` is unset.
///
/// Storage and transfer SDKs are held at `warn`.
pub(super) const DEFAULT_FILTER: &str =
    "info,object_store=warn,reqwest=warn,hyper=warn,suppaftp=warn";

/// Initializes the tracing subscriber for structured logging.
///
/// # Configuration
///
/// The log level can be configured via the `RUST_LOG` environment variable.
/// If not set, [`DEFAULT_FILTER`] applies.
///
/// # Examples
///
/// ```bash
/// RUST_LOG=debug datasus --local-store ./lake
/// RUST_LOG=datasus_object=debug,object_store=info datasus --period 202401
/// ```
///
/// # Errors
///
/// Returns an error if the tracing subscriber fails to initialize.
pub(super) fn init_tracing() -> anyhow::Result<()> {
    let env_filter = create_env_filter()?;
    let fmt_layer = create_fmt_layer();

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;

    Ok(())
}

/// Creates an environment filter for tracing.
fn create_env_filter() -> anyhow::Result<EnvFilter> {
    match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives)
            .map_err(|e| anyhow::anyhow!("Invalid {}: {e}", EnvFilter::DEFAULT_ENV)),
        _ => EnvFilter::try_new(DEFAULT_FILTER)
            .map_err(|e| anyhow::anyhow!("Failed to create env filter: {e}")),
    }
}

/// Creates a formatted tracing layer.
fn create_fmt_layer() -> fmt::Layer<tracing_subscriber::Registry> {
    fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_level(true)
        .with_ansi(true)
}
