//! Provider trait for building connected storage clients.

use datasus_core::Result;

use crate::client::ObjectStoreClient;

/// Factory for a storage backend.
///
/// Implementations turn typed credentials into an [`ObjectStoreClient`]
/// pointed at a single container (or root directory).
#[allow(async_fn_in_trait)]
pub trait Client: Sized {
    /// Strongly-typed credentials for this backend.
    type Credentials;

    /// Short backend identifier used in logs (e.g. "azure").
    const ID: &str;

    /// Build a client from `creds`.
    ///
    /// Building does not contact the backend; bad credentials surface on
    /// the first request.
    async fn connect(creds: &Self::Credentials) -> Result<Self>;

    /// Consume the provider and return the underlying client.
    fn into_client(self) -> ObjectStoreClient;
}
