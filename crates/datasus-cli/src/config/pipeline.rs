//! Source, period and CSV inspection settings.

use std::path::PathBuf;

use anyhow::{Result as AnyhowResult, anyhow};
use clap::Args;
use datasus_core::{PERIOD_PLACEHOLDER, Period, render_template};
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_CONFIG;

/// Default source: the monthly CNES base on the DATASUS FTP mirror.
pub const DEFAULT_SOURCE_URL_TEMPLATE: &str =
    "ftp://ftp.datasus.gov.br/cnes/BASE_DE_DADOS_CNES_{period}.ZIP";

/// What to download and what to inspect afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, Args)]
pub struct PipelineConfig {
    /// URL of the archive; every `{period}` is replaced by `YYYYMM`.
    #[arg(
        long,
        env = "DATASUS_SOURCE_URL_TEMPLATE",
        default_value = DEFAULT_SOURCE_URL_TEMPLATE
    )]
    pub source_url_template: String,

    /// Period to ingest as `YYYYMM` (defaults to the previous month).
    #[arg(long, env = "DATASUS_PERIOD")]
    pub period: Option<Period>,

    /// Directory the archive is downloaded into.
    #[arg(long, env = "DATASUS_DOWNLOAD_DIR", default_value = "/tmp")]
    pub download_dir: PathBuf,

    /// Archive entry whose CSV header is read after the relay.
    #[arg(long, env = "DATASUS_INSPECT_CSV")]
    pub inspect_csv: Option<String>,

    /// Field delimiter of the inspected CSV.
    #[arg(long, env = "DATASUS_CSV_DELIMITER", default_value_t = ';')]
    pub csv_delimiter: char,
}

impl PipelineConfig {
    /// Validates the source template and inspection settings.
    pub fn validate(&self) -> AnyhowResult<()> {
        if !self.source_url_template.contains(PERIOD_PLACEHOLDER) {
            return Err(anyhow!(
                "Source URL template '{}' does not contain {PERIOD_PLACEHOLDER}",
                self.source_url_template
            ));
        }

        if !self.csv_delimiter.is_ascii() {
            return Err(anyhow!(
                "CSV delimiter '{}' must be a single ASCII character",
                self.csv_delimiter
            ));
        }

        if self
            .inspect_csv
            .as_deref()
            .is_some_and(|entry| entry.trim().is_empty())
        {
            return Err(anyhow!("CSV entry to inspect must not be empty"));
        }

        Ok(())
    }

    /// The configured period, or the month before today.
    pub fn resolved_period(&self) -> Period {
        self.period.unwrap_or_else(Period::current_default)
    }

    /// Source URL for the resolved period.
    pub fn source_url(&self) -> String {
        render_template(&self.source_url_template, self.resolved_period())
    }

    /// Delimiter as a byte; only meaningful after [`validate`](Self::validate).
    pub fn delimiter_byte(&self) -> u8 {
        u8::try_from(self.csv_delimiter).unwrap_or(b';')
    }

    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            source_url_template = %self.source_url_template,
            period = %self.resolved_period(),
            download_dir = %self.download_dir.display(),
            inspect_csv = ?self.inspect_csv,
            "Pipeline configuration"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PipelineConfig {
        PipelineConfig {
            source_url_template: DEFAULT_SOURCE_URL_TEMPLATE.to_owned(),
            period: Some("202312".parse().unwrap()),
            download_dir: PathBuf::from("/tmp"),
            inspect_csv: None,
            csv_delimiter: ';',
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn template_without_placeholder_is_rejected() {
        let mut config = config();
        config.source_url_template = "ftp://example.org/fixed.zip".to_owned();
        assert!(config.validate().is_err());
    }

    #[test]
    fn non_ascii_delimiter_is_rejected() {
        let mut config = config();
        config.csv_delimiter = '§';
        assert!(config.validate().is_err());
    }

    #[test]
    fn blank_inspect_entry_is_rejected() {
        let mut config = config();
        config.inspect_csv = Some("  ".to_owned());
        assert!(config.validate().is_err());
    }

    #[test]
    fn source_url_uses_period() {
        assert_eq!(
            config().source_url(),
            "ftp://ftp.datasus.gov.br/cnes/BASE_DE_DADOS_CNES_202312.ZIP"
        );
        assert_eq!(config().delimiter_byte(), b';');
    }
}
