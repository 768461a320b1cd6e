//! Object storage settings.

use std::path::PathBuf;

use anyhow::{Context, Result as AnyhowResult, anyhow};
use clap::Args;
use datasus_core::Period;
use datasus_object::prelude::{
    AzureCredentials, AzureProvider, Client, LocalCredentials, LocalProvider, ObjectStoreClient,
    join_key,
};
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_CONFIG;

/// Where the archive and its extracted entries are written.
///
/// Exactly one backend is used: the local store when `--local-store` is
/// given, Azure Blob Storage otherwise.
#[derive(Clone, Serialize, Deserialize, Args)]
pub struct StorageConfig {
    /// Azure Storage connection string.
    #[arg(long, env = "AZURE_STORAGE_CONNECTION_STRING", hide_env_values = true)]
    #[serde(skip_serializing)]
    pub connection_string: Option<String>,

    /// Blob container the pipeline writes into.
    #[arg(long, env = "DATASUS_CONTAINER", default_value = "bronze")]
    pub container: String,

    /// Use a local directory as the container instead of Azure.
    #[arg(long, env = "DATASUS_LOCAL_STORE")]
    pub local_store: Option<PathBuf>,

    /// Prefix the downloaded archive is uploaded under.
    #[arg(long, env = "DATASUS_ZIP_PREFIX", default_value = "sus_data/zip_files")]
    pub zip_prefix: String,

    /// Prefix the archive entries are expanded under, followed by the period.
    #[arg(long, env = "DATASUS_CSV_PREFIX", default_value = "sus_data/csv_files")]
    pub csv_prefix: String,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field(
                "connection_string",
                &self.connection_string.as_ref().map(|_| "<redacted>"),
            )
            .field("container", &self.container)
            .field("local_store", &self.local_store)
            .field("zip_prefix", &self.zip_prefix)
            .field("csv_prefix", &self.csv_prefix)
            .finish()
    }
}

impl StorageConfig {
    /// Validates that a backend is configured.
    pub fn validate(&self) -> AnyhowResult<()> {
        if self.container.trim().is_empty() {
            return Err(anyhow!("Container name must not be empty"));
        }

        let has_connection_string = self
            .connection_string
            .as_deref()
            .is_some_and(|cs| !cs.trim().is_empty());
        if !has_connection_string && self.local_store.is_none() {
            return Err(anyhow!(
                "No storage credentials: set AZURE_STORAGE_CONNECTION_STRING, \
                 --connection-string or --local-store"
            ));
        }

        Ok(())
    }

    /// Name of the backend that [`connect`](Self::connect) will use.
    pub fn backend(&self) -> &'static str {
        if self.local_store.is_some() {
            LocalProvider::ID
        } else {
            AzureProvider::ID
        }
    }

    /// Builds the client for the configured backend.
    pub async fn connect(&self) -> AnyhowResult<ObjectStoreClient> {
        if let Some(root) = &self.local_store {
            let creds = LocalCredentials::new(root.join(&self.container));
            let provider = LocalProvider::connect(&creds)
                .await
                .context("failed to open local store")?;
            return Ok(provider.into_client());
        }

        let connection_string = self
            .connection_string
            .as_deref()
            .ok_or_else(|| anyhow!("No Azure connection string configured"))?;
        let creds = AzureCredentials::from_connection_string(connection_string, &self.container)
            .context("invalid Azure connection string")?;
        let provider = AzureProvider::connect(&creds)
            .await
            .context("failed to configure Azure Blob Storage")?;
        Ok(provider.into_client())
    }

    /// Object key of the uploaded archive.
    pub fn archive_key(&self, file_name: &str) -> String {
        join_key(&self.zip_prefix, file_name)
    }

    /// Prefix the archive of `period` expands under.
    pub fn entries_prefix(&self, period: Period) -> String {
        join_key(&self.csv_prefix, &period.to_string())
    }

    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            backend = self.backend(),
            container = %self.container,
            local_store = ?self.local_store,
            zip_prefix = %self.zip_prefix,
            csv_prefix = %self.csv_prefix,
            "Storage configuration"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> StorageConfig {
        StorageConfig {
            connection_string: None,
            container: "bronze".to_owned(),
            local_store: None,
            zip_prefix: "sus_data/zip_files".to_owned(),
            csv_prefix: "sus_data/csv_files/".to_owned(),
        }
    }

    #[test]
    fn missing_credentials_are_rejected() {
        assert!(config().validate().is_err());

        let mut blank = config();
        blank.connection_string = Some("   ".to_owned());
        assert!(blank.validate().is_err());
    }

    #[test]
    fn empty_container_is_rejected() {
        let mut config = config();
        config.local_store = Some(PathBuf::from("/tmp/lake"));
        config.container = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn local_store_wins_over_connection_string() {
        let mut config = config();
        config.connection_string = Some("UseDevelopmentStorage=true".to_owned());
        assert_eq!(config.backend(), "azure");
        config.local_store = Some(PathBuf::from("/tmp/lake"));
        assert_eq!(config.backend(), "local");
    }

    #[test]
    fn keys_are_joined_under_prefixes() {
        let config = config();
        let period: Period = "202401".parse().unwrap();
        assert_eq!(
            config.archive_key("BASE.ZIP"),
            "sus_data/zip_files/BASE.ZIP"
        );
        assert_eq!(config.entries_prefix(period), "sus_data/csv_files/202401");
    }

    #[test]
    fn debug_hides_connection_string() {
        let mut config = config();
        config.connection_string = Some("AccountName=a;AccountKey=secret".to_owned());
        assert!(!format!("{config:?}").contains("secret"));
    }

    #[tokio::test]
    async fn local_store_is_created_per_container() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = config();
        config.local_store = Some(dir.path().to_path_buf());

        config.connect().await.unwrap();
        assert!(dir.path().join("bronze").is_dir());
    }
}
