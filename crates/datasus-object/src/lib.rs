#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for object store client operations.
pub const TRACING_TARGET_CLIENT: &str = "datasus_object::client";

/// Tracing target for provider connections.
pub const TRACING_TARGET_PROVIDER: &str = "datasus_object::provider";

/// Tracing target for archive relay operations.
pub const TRACING_TARGET_RELAY: &str = "datasus_object::relay";

pub mod client;
mod error;
/// Client trait and object storage providers.
pub mod providers;
/// Upload, download and ZIP expansion on top of the client.
pub mod relay;

#[doc(hidden)]
pub mod prelude;
