//! Client trait and the storage backends the pipeline can write to.

mod azure;
mod local;
mod provider;

pub use azure::{AzureCredentials, AzureProvider};
pub use local::{LocalCredentials, LocalProvider};
pub use provider::Client;
