#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for observed pipeline operations.
pub const TRACING_TARGET_OPERATION: &str = "datasus_core::operation";

mod columns;
mod error;
mod observe;
mod period;
mod timing;

pub use columns::{ColumnRename, normalize_header, to_snake_case};
pub use error::{BoxedError, Error, ErrorKind, Result};
pub use observe::{Observed, observe, observe_timed};
pub use period::{PERIOD_PLACEHOLDER, Period, render_template};
pub use timing::Timing;
