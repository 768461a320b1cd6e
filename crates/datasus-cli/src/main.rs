#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod pipeline;
mod telemetry;

use std::process;

use anyhow::Context;

use crate::config::Cli;
use crate::pipeline::Pipeline;

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "datasus_cli::startup";
pub const TRACING_TARGET_SHUTDOWN: &str = "datasus_cli::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "datasus_cli::config";
pub const TRACING_TARGET_PIPELINE: &str = "datasus_cli::pipeline";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_SHUTDOWN,
            "pipeline completed successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SHUTDOWN,
            error = format!("{error:#}"),
            "pipeline terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    telemetry::init_tracing()?;
    tracing::info!(
        target: TRACING_TARGET_STARTUP,
        version = env!("CARGO_PKG_VERSION"),
        "starting datasus pipeline"
    );

    cli.log();
    cli.validate().context("invalid configuration")?;

    let pipeline = Pipeline::from_cli(cli).await?;
    let report = pipeline.run().await?;
    report.log();

    Ok(())
}
