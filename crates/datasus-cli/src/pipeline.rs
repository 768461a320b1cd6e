//! The ingestion run: fetch, upload, relay, and optionally inspect one CSV.

use std::future::Future;
use std::path::PathBuf;

use anyhow::{Context, anyhow};
use datasus_core::{ColumnRename, Period, Timing, normalize_header, observe};
use datasus_fetch::Fetcher;
use datasus_object::prelude::{ArchiveRelay, ObjectStoreClient, RelayReport, join_key};
use jiff::Timestamp;

use crate::TRACING_TARGET_PIPELINE;
use crate::config::Cli;

/// Duration of one pipeline step.
#[derive(Debug, Clone)]
pub struct StepTiming {
    pub name: &'static str,
    pub timing: Timing,
}

/// Everything a successful run produced.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub period: Period,
    pub source_url: String,
    pub archive_path: PathBuf,
    pub archive_key: String,
    pub relay: RelayReport,
    pub columns: Vec<ColumnRename>,
    pub steps: Vec<StepTiming>,
}

/// One configured run over a fetcher and a storage client.
pub struct Pipeline {
    cli: Cli,
    fetcher: Fetcher,
    relay: ArchiveRelay,
}

impl Pipeline {
    pub fn new(cli: Cli, fetcher: Fetcher, client: ObjectStoreClient) -> Self {
        Self {
            cli,
            fetcher,
            relay: ArchiveRelay::new(client),
        }
    }

    /// Builds the fetcher and storage client described by `cli`.
    pub async fn from_cli(cli: Cli) -> anyhow::Result<Self> {
        let fetcher = Fetcher::new(&cli.transport).context("failed to create fetcher")?;
        let client = cli.storage.connect().await?;
        Ok(Self::new(cli, fetcher, client))
    }

    /// Runs every step in order, stopping at the first failure.
    pub async fn run(&self) -> anyhow::Result<PipelineReport> {
        let mut steps = Vec::new();
        let period = self.cli.pipeline.resolved_period();
        let source_url = self.cli.pipeline.source_url();

        tracing::info!(
            target: TRACING_TARGET_PIPELINE,
            period = %period,
            url = %source_url,
            "Starting ingestion"
        );

        let archive_path = step(
            &mut steps,
            "download",
            self.fetcher
                .fetch(&source_url, &self.cli.pipeline.download_dir),
        )
        .await
        .with_context(|| format!("failed to download {source_url}"))?;

        let file_name = archive_path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| anyhow!("downloaded file has no UTF-8 name"))?;
        let archive_key = self.cli.storage.archive_key(file_name);

        step(
            &mut steps,
            "upload",
            self.relay.upload(&archive_path, &archive_key),
        )
        .await
        .with_context(|| format!("failed to upload {}", archive_path.display()))?;

        let entries_prefix = self.cli.storage.entries_prefix(period);
        let relay = step(
            &mut steps,
            "relay",
            self.relay.relay(&archive_key, &entries_prefix),
        )
        .await
        .with_context(|| format!("failed to expand {archive_key}"))?;

        let columns = match &self.cli.pipeline.inspect_csv {
            Some(entry) => {
                let key = join_key(&entries_prefix, entry);
                step(&mut steps, "inspect", self.inspect(&key))
                    .await
                    .with_context(|| format!("failed to inspect {key}"))?
            }
            None => Vec::new(),
        };

        Ok(PipelineReport {
            period,
            source_url,
            archive_path,
            archive_key,
            relay,
            columns,
            steps,
        })
    }

    /// Reads the header of the CSV object at `key` and logs its renames.
    async fn inspect(&self, key: &str) -> datasus_core::Result<Vec<ColumnRename>> {
        observe("inspect_csv", async {
            let object = self.relay.client().get(key).await?;
            let columns = normalize_header(&object.data, self.cli.pipeline.delimiter_byte())?;

            for column in &columns {
                tracing::info!(
                    target: TRACING_TARGET_PIPELINE,
                    original = %column.original,
                    normalized = %column.normalized,
                    "Column {} -> {}",
                    column.original,
                    column.normalized
                );
            }
            Ok(columns)
        })
        .await
    }
}

/// Awaits `operation` and records how long it took.
async fn step<T, F>(
    steps: &mut Vec<StepTiming>,
    name: &'static str,
    operation: F,
) -> datasus_core::Result<T>
where
    F: Future<Output = datasus_core::Result<T>>,
{
    let started_at = Timestamp::now();
    let result = operation.await;
    let timing = Timing::since(started_at);

    tracing::debug!(
        target: TRACING_TARGET_PIPELINE,
        step = name,
        ok = result.is_ok(),
        elapsed_ms = timing.elapsed_ms(),
        "Step finished"
    );
    steps.push(StepTiming { name, timing });
    result
}

impl PipelineReport {
    pub fn log(&self) {
        let total: f64 = self.steps.iter().map(|s| s.timing.seconds()).sum();
        for step in &self.steps {
            tracing::info!(
                target: TRACING_TARGET_PIPELINE,
                step = step.name,
                elapsed_ms = step.timing.elapsed_ms(),
                "Step {} took {:.2} seconds",
                step.name,
                step.timing.seconds()
            );
        }

        tracing::info!(
            target: TRACING_TARGET_PIPELINE,
            period = %self.period,
            source = %self.source_url,
            path = %self.archive_path.display(),
            archive = %self.archive_key,
            objects = self.relay.len(),
            size = self.relay.bytes_written,
            columns = self.columns.len(),
            "Ingestion finished in {total:.2} seconds"
        );
    }
}
