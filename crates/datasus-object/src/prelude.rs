//! Convenience re-exports.

pub use crate::client::{GetOutput, ObjectStoreClient, PutOutput, UploadOptions};
pub use crate::providers::{
    AzureCredentials, AzureProvider, Client, LocalCredentials, LocalProvider,
};
pub use crate::relay::{ArchiveRelay, RelayReport, join_key};
