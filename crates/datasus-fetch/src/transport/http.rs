//! HTTP(S) transport backed by reqwest.

use std::path::Path;
use std::sync::Arc;

use datasus_core::Result;
use futures::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use url::Url;

use super::Transport;
use crate::config::TransportConfig;
use crate::error::from_reqwest;
use crate::TRACING_TARGET_TRANSPORT;

/// Inner state that holds the HTTP client and configuration.
struct HttpTransportInner {
    http: Client,
    config: TransportConfig,
}

/// Streams HTTP and HTTPS resources to disk.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct HttpTransport {
    inner: Arc<HttpTransportInner>,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Creates a new HTTP transport with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built (for
    /// example when the TLS backend fails to initialize).
    pub fn new(config: TransportConfig) -> Result<Self> {
        let connect_timeout = config.effective_connect_timeout();
        let read_timeout = config.effective_read_timeout();
        let user_agent = config.effective_user_agent();

        tracing::debug!(
            target: TRACING_TARGET_TRANSPORT,
            connect_timeout_ms = connect_timeout.as_millis() as u64,
            read_timeout_ms = read_timeout.as_millis() as u64,
            "Creating HTTP transport"
        );

        let http = Client::builder()
            .connect_timeout(connect_timeout)
            .read_timeout(read_timeout)
            .user_agent(user_agent)
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            inner: Arc::new(HttpTransportInner { http, config }),
        })
    }

    /// Gets the transport configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.inner.config
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    fn schemes(&self) -> &[&'static str] {
        &["http", "https"]
    }

    async fn retrieve(&self, url: &Url, destination: &Path) -> Result<u64> {
        tracing::debug!(
            target: TRACING_TARGET_TRANSPORT,
            url = %url,
            path = %destination.display(),
            "Starting HTTP transfer"
        );

        let response = self
            .inner
            .http
            .get(url.clone())
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(from_reqwest)?;

        let expected = response.content_length();
        let mut file = tokio::fs::File::create(destination).await?;
        let mut body = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(from_reqwest)?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        file.sync_all().await?;

        tracing::debug!(
            target: TRACING_TARGET_TRANSPORT,
            url = %url,
            size = written,
            expected = ?expected,
            "HTTP transfer complete"
        );

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use datasus_core::ErrorKind;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    use super::*;

    /// Answers a single request with `status` and `body`, returning its URL.
    async fn serve_once(status: &'static str, body: &'static str) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let read = socket.read(&mut buf).await.unwrap();
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..read]);
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        Url::parse(&format!("http://{addr}/cnes/BASE.ZIP")).unwrap()
    }

    async fn retrieve_status(status: &'static str) -> Result<u64> {
        let dir = tempfile::TempDir::new().unwrap();
        let url = serve_once(status, "").await;
        let transport = HttpTransport::new(TransportConfig::default()).unwrap();
        transport.retrieve(&url, &dir.path().join("BASE.ZIP")).await
    }

    #[tokio::test]
    async fn successful_transfer_writes_body() {
        let dir = tempfile::TempDir::new().unwrap();
        let url = serve_once("200 OK", "zip-bytes").await;
        let destination = dir.path().join("BASE.ZIP");
        let transport = HttpTransport::new(TransportConfig::default()).unwrap();

        let written = transport.retrieve(&url, &destination).await.unwrap();

        assert_eq!(written, 9);
        assert_eq!(std::fs::read(&destination).unwrap(), b"zip-bytes");
    }

    #[tokio::test]
    async fn missing_resources_are_not_found() {
        for status in ["404 Not Found", "410 Gone"] {
            let err = retrieve_status(status).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotFound, "{status}");
        }
    }

    #[tokio::test]
    async fn other_failures_are_operation_failures() {
        for status in ["403 Forbidden", "500 Internal Server Error"] {
            let err = retrieve_status(status).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::OperationFailure, "{status}");
        }
    }

    #[test]
    fn test_transport_creation() {
        let transport = HttpTransport::new(TransportConfig::default()).unwrap();
        assert!(transport.config().user_agent.is_none());
    }

    #[test]
    fn test_supported_schemes() {
        let transport = HttpTransport::new(TransportConfig::default()).unwrap();
        assert!(transport.supports("http"));
        assert!(transport.supports("HTTPS"));
        assert!(!transport.supports("ftp"));
    }
}
