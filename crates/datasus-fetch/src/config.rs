//! Configuration for the HTTP and FTP transports.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// Default timeout for establishing a connection: 30 seconds.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout between two reads of a transfer: 60 seconds.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Settings shared by every transport.
///
/// Timeouts bound connection setup and stalls between reads, never the
/// whole transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct TransportConfig {
    /// Seconds to wait for a connection to be established (0 = default).
    #[cfg_attr(
        feature = "config",
        arg(long = "connect-timeout", env = "FETCH_CONNECT_TIMEOUT", default_value_t = 30)
    )]
    pub connect_timeout_secs: u64,

    /// Seconds to wait for the next chunk of a transfer (0 = default).
    #[cfg_attr(
        feature = "config",
        arg(long = "read-timeout", env = "FETCH_READ_TIMEOUT", default_value_t = 60)
    )]
    pub read_timeout_secs: u64,

    /// User-Agent header sent with HTTP requests.
    #[cfg_attr(feature = "config", arg(long = "user-agent", env = "FETCH_USER_AGENT"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT.as_secs(),
            read_timeout_secs: DEFAULT_READ_TIMEOUT.as_secs(),
            user_agent: None,
        }
    }
}

impl TransportConfig {
    /// Returns the default user agent string.
    fn default_user_agent() -> String {
        format!("datasus/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Sets the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_secs = timeout.as_secs();
        self
    }

    /// Sets the read timeout.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout_secs = timeout.as_secs();
        self
    }

    /// Sets the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Returns the effective connect timeout, using default if zero.
    pub fn effective_connect_timeout(&self) -> Duration {
        match self.connect_timeout_secs {
            0 => DEFAULT_CONNECT_TIMEOUT,
            secs => Duration::from_secs(secs),
        }
    }

    /// Returns the effective read timeout, using default if zero.
    pub fn effective_read_timeout(&self) -> Duration {
        match self.read_timeout_secs {
            0 => DEFAULT_READ_TIMEOUT,
            secs => Duration::from_secs(secs),
        }
    }

    /// Returns the effective user agent, using default if unset or empty.
    pub fn effective_user_agent(&self) -> String {
        match self.user_agent.as_deref() {
            Some(agent) if !agent.is_empty() => agent.to_owned(),
            _ => Self::default_user_agent(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = TransportConfig::default();
        assert_eq!(config.effective_connect_timeout(), Duration::from_secs(30));
        assert_eq!(config.effective_read_timeout(), Duration::from_secs(60));
        assert!(config.effective_user_agent().starts_with("datasus/"));
    }

    #[test]
    fn test_effective_timeouts_use_default_when_zero() {
        let config = TransportConfig::default()
            .with_connect_timeout(Duration::ZERO)
            .with_read_timeout(Duration::ZERO);
        assert_eq!(config.effective_connect_timeout(), DEFAULT_CONNECT_TIMEOUT);
        assert_eq!(config.effective_read_timeout(), DEFAULT_READ_TIMEOUT);
    }

    #[test]
    fn test_effective_user_agent_uses_default_when_empty() {
        let config = TransportConfig::default().with_user_agent("");
        assert!(config.effective_user_agent().contains("datasus"));

        let config = TransportConfig::default().with_user_agent("cnes-bot/1.0");
        assert_eq!(config.effective_user_agent(), "cnes-bot/1.0");
    }
}
