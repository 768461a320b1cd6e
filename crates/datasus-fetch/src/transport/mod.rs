//! Protocol-specific retrieval of a URL into a local file.

mod ftp;
mod http;

use std::path::Path;

use datasus_core::Result;
pub use ftp::FtpTransport;
pub use http::HttpTransport;
use url::Url;

/// Streams the resource behind a URL into a local file.
///
/// The [`Fetcher`](crate::Fetcher) owns idempotency, naming and cleanup; a
/// transport only moves bytes. `destination` is created or truncated by the
/// transport.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// URL schemes this transport handles, lowercase.
    fn schemes(&self) -> &[&'static str];

    /// Writes the resource at `url` to `destination` and returns the number
    /// of bytes written.
    async fn retrieve(&self, url: &Url, destination: &Path) -> Result<u64>;

    /// Whether this transport handles `scheme`.
    fn supports(&self, scheme: &str) -> bool {
        self.schemes().iter().any(|s| s.eq_ignore_ascii_case(scheme))
    }
}
