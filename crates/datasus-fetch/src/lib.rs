#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for fetcher operations.
pub const TRACING_TARGET: &str = "datasus_fetch::fetcher";

/// Tracing target for transport-level operations.
pub const TRACING_TARGET_TRANSPORT: &str = "datasus_fetch::transport";

mod config;
mod error;
mod fetcher;
pub mod transport;

pub use crate::config::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT, TransportConfig};
pub use crate::fetcher::{Fetcher, file_name_of};
pub use crate::transport::{FtpTransport, HttpTransport, Transport};
