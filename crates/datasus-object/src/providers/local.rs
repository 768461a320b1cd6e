//! Local filesystem provider, used for dry runs without cloud credentials.

use std::path::PathBuf;

use datasus_core::Result;
use derive_more::Deref;
use object_store::local::LocalFileSystem;
use serde::{Deserialize, Serialize};

use super::Client;
use crate::TRACING_TARGET_PROVIDER;
use crate::client::ObjectStoreClient;
use crate::error::from_object_store;

/// Root directory that object keys are resolved against.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalCredentials {
    pub root: PathBuf,
}

impl LocalCredentials {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

/// Filesystem-backed object storage client.
#[derive(Debug, Clone, Deref)]
pub struct LocalProvider(ObjectStoreClient);

impl Client for LocalProvider {
    type Credentials = LocalCredentials;

    const ID: &str = "local";

    async fn connect(creds: &Self::Credentials) -> Result<Self> {
        tokio::fs::create_dir_all(&creds.root).await?;
        let store = LocalFileSystem::new_with_prefix(&creds.root).map_err(from_object_store)?;

        tracing::debug!(
            target: TRACING_TARGET_PROVIDER,
            provider = Self::ID,
            root = %creds.root.display(),
            "Storage client ready"
        );

        Ok(Self(ObjectStoreClient::new(store)))
    }

    fn into_client(self) -> ObjectStoreClient {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    #[tokio::test]
    async fn writes_below_root() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path().join("store");
        let provider = LocalProvider::connect(&LocalCredentials::new(&root))
            .await
            .unwrap();

        provider
            .put("bronze/a.txt", Bytes::from("abc"), None)
            .await
            .unwrap();

        let written = std::fs::read(root.join("bronze").join("a.txt")).unwrap();
        assert_eq!(written, b"abc");
    }
}
