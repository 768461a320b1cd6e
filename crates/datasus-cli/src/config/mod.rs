//! CLI configuration management.
//!
//! This module defines the complete CLI configuration hierarchy:
//!
//! ```text
//! Cli
//! ├── pipeline: PipelineConfig    # Source template, period, download dir, CSV inspection
//! ├── transport: TransportConfig  # Connect/read timeouts, user agent
//! └── storage: StorageConfig      # Connection string or local store, container, prefixes
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.
//!
//! # Example
//!
//! ```bash
//! # Ingest January 2024 into Azure
//! AZURE_STORAGE_CONNECTION_STRING="..." datasus --period 202401
//!
//! # Dry run against a local directory
//! datasus --local-store ./lake --inspect-csv tbEstabelecimento202401.csv
//! ```

mod pipeline;
mod storage;

use std::process;

use anyhow::Context;
use clap::Parser;
use datasus_fetch::TransportConfig;
pub use pipeline::PipelineConfig;
use serde::{Deserialize, Serialize};
pub use storage::StorageConfig;

use crate::TRACING_TARGET_CONFIG;

/// Complete CLI configuration.
///
/// Combines all configuration groups for one pipeline run:
/// - [`PipelineConfig`]: what to download and what to inspect
/// - [`TransportConfig`]: how the archive is downloaded
/// - [`StorageConfig`]: where the archive and its entries are written
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "datasus")]
#[command(about = "Download a DATASUS archive, store it and expand it into blob storage")]
#[command(version)]
pub struct Cli {
    /// Source, period and inspection settings.
    #[clap(flatten)]
    pub pipeline: PipelineConfig,

    /// Download transport settings.
    #[clap(flatten)]
    pub transport: TransportConfig,

    /// Object storage settings.
    #[clap(flatten)]
    pub storage: StorageConfig,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    ///
    /// The .env file is loaded before clap parses arguments so its values act
    /// as `env` fallbacks.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.pipeline
            .validate()
            .context("invalid pipeline configuration")?;
        self.storage
            .validate()
            .context("invalid storage configuration")?;
        Ok(())
    }

    /// Logs configuration (no sensitive information).
    pub fn log(&self) {
        Self::log_build_info();
        self.pipeline.log();
        self.storage.log();

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            connect_timeout_secs = self.transport.connect_timeout_secs,
            read_timeout_secs = self.transport.read_timeout_secs,
            user_agent = %self.transport.effective_user_agent(),
            "Transport configuration"
        );
    }

    /// Logs build information at debug level.
    fn log_build_info() {
        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}
