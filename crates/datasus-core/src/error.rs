//! Common error type definitions.

use strum::{AsRefStr, IntoStaticStr};
use thiserror::Error;

/// Type alias for boxed dynamic errors that can be sent across threads.
///
/// Used as the source of a structured [`Error`] so that any underlying
/// failure (I/O, HTTP, FTP, object store, ZIP) can be carried along
/// without leaking its concrete type into the public API.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with our custom Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of errors that pipeline operations report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Object, container or local file is missing.
    NotFound,
    /// Target object exists and the write was create-only.
    AlreadyExists,
    /// Downloaded bytes are not a readable ZIP container.
    InvalidArchive,
    /// Caller supplied a malformed or unsupported argument.
    InvalidInput,
    /// Anything else: network, permission, disk.
    OperationFailure,
}

impl ErrorKind {
    /// Human-readable summary logged when an operation fails with this kind.
    pub fn summary(self) -> &'static str {
        match self {
            Self::NotFound => "container or object not found",
            Self::AlreadyExists => "object already exists and overwrite is disabled",
            Self::InvalidArchive => "downloaded object is not a valid ZIP archive",
            Self::InvalidInput => "invalid input",
            Self::OperationFailure => "operation failed",
        }
    }
}

/// A structured error type for pipeline operations.
#[derive(Debug, Error)]
#[error("{}{}", kind.as_ref(), message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional error message.
    pub message: Option<String>,
    /// Optional source error.
    #[source]
    pub source: Option<BoxedError>,
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
        }
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Adds a source error to this error.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Creates a new not found error.
    pub fn not_found() -> Self {
        Self::new(ErrorKind::NotFound)
    }

    /// Creates a new already exists error.
    pub fn already_exists() -> Self {
        Self::new(ErrorKind::AlreadyExists)
    }

    /// Creates a new invalid archive error.
    pub fn invalid_archive() -> Self {
        Self::new(ErrorKind::InvalidArchive)
    }

    /// Creates a new invalid input error.
    pub fn invalid_input() -> Self {
        Self::new(ErrorKind::InvalidInput)
    }

    /// Creates a new operation failure.
    pub fn operation_failure() -> Self {
        Self::new(ErrorKind::OperationFailure)
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error kind as a string.
    pub fn kind_str(&self) -> &'static str {
        self.kind.into()
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound,
            std::io::ErrorKind::AlreadyExists => ErrorKind::AlreadyExists,
            _ => ErrorKind::OperationFailure,
        };
        Self::new(kind).with_message(err.to_string()).with_source(err)
    }
}
