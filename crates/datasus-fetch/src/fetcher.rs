//! Idempotent retrieval of a remote resource into a local directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use datasus_core::{Error, Result, observe};
use url::Url;

use crate::TRACING_TARGET;
use crate::config::TransportConfig;
use crate::transport::{FtpTransport, HttpTransport, Transport};

/// Suffix of the file a transfer writes into before it is complete.
const PARTIAL_SUFFIX: &str = ".part";

/// Downloads remote resources to local disk, at most once per file name.
///
/// The file name is the last path segment of the URL. When a file with that
/// name already exists in the destination directory the fetch returns it
/// without contacting the remote side; its contents are not verified.
#[derive(Clone, Default)]
pub struct Fetcher {
    transports: Vec<Arc<dyn Transport>>,
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let schemes: Vec<_> = self
            .transports
            .iter()
            .flat_map(|t| t.schemes().iter().copied())
            .collect();
        f.debug_struct("Fetcher").field("schemes", &schemes).finish()
    }
}

impl Fetcher {
    /// Creates a fetcher with the FTP and HTTP(S) transports.
    pub fn new(config: &TransportConfig) -> Result<Self> {
        Ok(Self::empty()
            .with_transport(FtpTransport::new(config.clone()))
            .with_transport(HttpTransport::new(config.clone())?))
    }

    /// Creates a fetcher without any transport.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registers a transport. Earlier registrations win when two transports
    /// claim the same scheme.
    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transports.push(Arc::new(transport));
        self
    }

    /// Ensures the resource at `url` is present in `destination_dir` and
    /// returns its local path.
    ///
    /// # Errors
    ///
    /// - [`InvalidInput`](datasus_core::ErrorKind::InvalidInput) when `url`
    ///   does not parse, has no file name, or uses a scheme no transport
    ///   handles.
    /// - Any transport or filesystem failure. A failed transfer leaves no
    ///   file behind.
    pub async fn fetch(&self, url: &str, destination_dir: &Path) -> Result<PathBuf> {
        observe("fetch", self.fetch_inner(url, destination_dir)).await
    }

    async fn fetch_inner(&self, url: &str, destination_dir: &Path) -> Result<PathBuf> {
        let url = Url::parse(url).map_err(|e| {
            Error::invalid_input()
                .with_message(format!("`{url}` is not a valid URL"))
                .with_source(e)
        })?;
        let file_name = file_name_of(&url)?;

        tokio::fs::create_dir_all(destination_dir).await?;
        let target = destination_dir.join(&file_name);

        if tokio::fs::try_exists(&target).await? {
            tracing::info!(
                target: TRACING_TARGET,
                path = %target.display(),
                "File already exists: {}",
                target.display()
            );
            return Ok(target);
        }

        let transport = self.transport_for(url.scheme())?;
        let partial = destination_dir.join(format!("{file_name}{PARTIAL_SUFFIX}"));

        let outcome = match transport.retrieve(&url, &partial).await {
            Ok(size) => tokio::fs::rename(&partial, &target)
                .await
                .map(|()| size)
                .map_err(Error::from),
            Err(err) => Err(err),
        };

        let size = match outcome {
            Ok(size) => size,
            Err(err) => {
                remove_partial(&partial).await;
                return Err(err);
            }
        };

        tracing::info!(
            target: TRACING_TARGET,
            url = %url,
            path = %target.display(),
            size,
            "Downloaded {url} to {}",
            target.display()
        );

        Ok(target)
    }

    fn transport_for(&self, scheme: &str) -> Result<&dyn Transport> {
        self.transports
            .iter()
            .find(|t| t.supports(scheme))
            .map(|t| t.as_ref())
            .ok_or_else(|| {
                Error::invalid_input().with_message(format!("unsupported protocol `{scheme}`"))
            })
    }
}

/// Derives the local file name from the last path segment of `url`.
pub fn file_name_of(url: &Url) -> Result<String> {
    url.path_segments()
        .and_then(|segments| segments.last())
        .filter(|segment| !segment.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| {
            Error::invalid_input().with_message(format!("`{url}` does not name a file"))
        })
}

async fn remove_partial(partial: &Path) {
    match tokio::fs::remove_file(partial).await {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            tracing::warn!(
                target: TRACING_TARGET,
                path = %partial.display(),
                error = %err,
                "Failed to remove partial download"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use datasus_core::ErrorKind;

    use super::*;

    const ARCHIVE_URL: &str = "ftp://ftp.datasus.gov.br/cnes/BASE_DE_DADOS_CNES_202304.ZIP";

    /// Writes a fixed body and counts how often it was asked to.
    #[derive(Clone, Default)]
    struct CountingTransport {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl Transport for CountingTransport {
        fn schemes(&self) -> &[&'static str] {
            &["ftp"]
        }

        async fn retrieve(&self, _url: &Url, destination: &Path) -> Result<u64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::fs::write(destination, b"PK-archive-bytes").await?;
            Ok(16)
        }
    }

    /// Writes part of a body, then fails.
    struct BrokenTransport;

    #[async_trait::async_trait]
    impl Transport for BrokenTransport {
        fn schemes(&self) -> &[&'static str] {
            &["ftp"]
        }

        async fn retrieve(&self, _url: &Url, destination: &Path) -> Result<u64> {
            tokio::fs::write(destination, b"PK-trunc").await?;
            Err(Error::operation_failure().with_message("connection reset"))
        }
    }

    #[tokio::test]
    async fn second_fetch_skips_transfer() {
        let dir = tempfile::TempDir::new().unwrap();
        let transport = CountingTransport::default();
        let fetcher = Fetcher::empty().with_transport(transport.clone());

        let first = fetcher.fetch(ARCHIVE_URL, dir.path()).await.unwrap();
        let second = fetcher.fetch(ARCHIVE_URL, dir.path()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first, dir.path().join("BASE_DE_DADOS_CNES_202304.ZIP"));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);

        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
        assert_eq!(std::fs::read(&first).unwrap(), b"PK-archive-bytes");
    }

    #[tokio::test]
    async fn creates_missing_ancestors() {
        let dir = tempfile::TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b").join("c");
        let fetcher = Fetcher::empty().with_transport(CountingTransport::default());

        let path = fetcher.fetch(ARCHIVE_URL, &nested).await.unwrap();

        assert!(nested.is_dir());
        assert!(path.is_file());
    }

    #[tokio::test]
    async fn existing_file_is_trusted_without_transfer() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("BASE_DE_DADOS_CNES_202304.ZIP"), b"stale").unwrap();
        let transport = CountingTransport::default();
        let fetcher = Fetcher::empty().with_transport(transport.clone());

        let path = fetcher.fetch(ARCHIVE_URL, dir.path()).await.unwrap();

        assert_eq!(std::fs::read(path).unwrap(), b"stale");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_transfer_leaves_nothing_behind() {
        let dir = tempfile::TempDir::new().unwrap();
        let fetcher = Fetcher::empty().with_transport(BrokenTransport);

        let err = fetcher.fetch(ARCHIVE_URL, dir.path()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::OperationFailure);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn unsupported_scheme_is_invalid_input() {
        let dir = tempfile::TempDir::new().unwrap();
        let fetcher = Fetcher::empty().with_transport(CountingTransport::default());

        let err = fetcher
            .fetch("gopher://example.org/base.zip", dir.path())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn malformed_urls_are_invalid_input() {
        let dir = tempfile::TempDir::new().unwrap();
        let fetcher = Fetcher::empty().with_transport(CountingTransport::default());

        for url in ["not a url", "ftp://ftp.datasus.gov.br/cnes/"] {
            let err = fetcher.fetch(url, dir.path()).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput, "url {url}");
        }
    }

    #[test]
    fn file_name_is_last_segment_without_query() {
        let url = Url::parse("https://example.org/data/base.zip?token=abc").unwrap();
        assert_eq!(file_name_of(&url).unwrap(), "base.zip");

        let url = Url::parse("https://example.org/").unwrap();
        assert!(file_name_of(&url).is_err());

        let url = Url::parse("ftp://ftp.datasus.gov.br/cnes/").unwrap();
        assert!(file_name_of(&url).is_err());
    }

    #[test]
    fn default_fetcher_handles_ftp_and_http() {
        let fetcher = Fetcher::new(&TransportConfig::default()).unwrap();
        for scheme in ["ftp", "http", "https"] {
            assert!(fetcher.transport_for(scheme).is_ok(), "scheme {scheme}");
        }
        assert!(fetcher.transport_for("s3").is_err());
    }
}
