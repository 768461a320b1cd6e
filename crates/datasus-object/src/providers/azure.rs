//! Azure Blob Storage provider using [`object_store::azure::MicrosoftAzureBuilder`].

use std::fmt;

use datasus_core::{Error, Result};
use derive_more::Deref;
use object_store::azure::MicrosoftAzureBuilder;
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};

use super::Client;
use crate::TRACING_TARGET_PROVIDER;
use crate::client::ObjectStoreClient;

/// Account used by the Azurite storage emulator.
const EMULATOR_ACCOUNT: &str = "devstoreaccount1";

/// Typed credentials for Azure Blob Storage.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureCredentials {
    /// Azure storage container name.
    pub container: String,
    /// Azure storage account name.
    pub account_name: String,
    /// Storage account access key.
    #[serde(default)]
    pub access_key: Option<String>,
    /// Shared Access Signature token.
    #[serde(default)]
    pub sas_token: Option<String>,
    /// Custom endpoint URL (for Azure Stack or Azurite).
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Target the local storage emulator.
    #[serde(default)]
    pub use_emulator: bool,
}

impl fmt::Debug for AzureCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureCredentials")
            .field("container", &self.container)
            .field("account_name", &self.account_name)
            .field("access_key", &self.access_key.as_ref().map(|_| "<redacted>"))
            .field("sas_token", &self.sas_token.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("use_emulator", &self.use_emulator)
            .finish()
    }
}

impl AzureCredentials {
    /// Parses an Azure storage connection string.
    ///
    /// Recognised keys (case-insensitive): `AccountName`, `AccountKey`,
    /// `SharedAccessSignature`, `BlobEndpoint`, `DefaultEndpointsProtocol`,
    /// `EndpointSuffix` and `UseDevelopmentStorage`. Unknown keys are ignored.
    pub fn from_connection_string(
        connection_string: &str,
        container: impl Into<String>,
    ) -> Result<Self> {
        let mut creds = Self {
            container: container.into(),
            ..Self::default()
        };
        let mut protocol = None;
        let mut suffix = None;

        for segment in connection_string.split(';') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let mut parts = segment.splitn(2, '=');
            let key = parts.next().unwrap_or_default().trim();
            let Some(value) = parts.next().map(str::trim) else {
                return Err(Error::invalid_input()
                    .with_message(format!("malformed connection string segment '{key}'")));
            };

            match key.to_ascii_lowercase().as_str() {
                "accountname" => creds.account_name = value.to_owned(),
                "accountkey" => creds.access_key = Some(value.to_owned()),
                "sharedaccesssignature" => creds.sas_token = Some(value.to_owned()),
                "blobendpoint" => creds.endpoint = Some(value.to_owned()),
                "defaultendpointsprotocol" => protocol = Some(value.to_owned()),
                "endpointsuffix" => suffix = Some(value.to_owned()),
                "usedevelopmentstorage" => {
                    creds.use_emulator = value.eq_ignore_ascii_case("true");
                }
                _ => {}
            }
        }

        if creds.use_emulator {
            if creds.account_name.is_empty() {
                creds.account_name = EMULATOR_ACCOUNT.to_owned();
            }
            return Ok(creds);
        }

        if creds.account_name.is_empty() {
            return Err(Error::invalid_input().with_message("connection string has no AccountName"));
        }
        if creds.access_key.is_none() && creds.sas_token.is_none() {
            return Err(Error::invalid_input()
                .with_message("connection string has neither AccountKey nor SharedAccessSignature"));
        }

        if creds.endpoint.is_none()
            && let Some(suffix) = suffix
        {
            let protocol = protocol.as_deref().unwrap_or("https");
            creds.endpoint = Some(format!(
                "{protocol}://{}.blob.{suffix}",
                creds.account_name
            ));
        }

        Ok(creds)
    }
}

/// Azure Blob Storage-backed object storage client.
#[derive(Debug, Clone, Deref)]
pub struct AzureProvider(ObjectStoreClient);

impl Client for AzureProvider {
    type Credentials = AzureCredentials;

    const ID: &str = "azure";

    async fn connect(creds: &Self::Credentials) -> Result<Self> {
        if creds.container.is_empty() {
            return Err(Error::invalid_input().with_message("container name must not be empty"));
        }

        let mut builder = MicrosoftAzureBuilder::new()
            .with_container_name(&creds.container)
            .with_account(&creds.account_name)
            .with_use_emulator(creds.use_emulator);

        if let Some(key) = &creds.access_key {
            builder = builder.with_access_key(key);
        }

        if let Some(sas) = &creds.sas_token {
            builder = builder.with_sas_authorization(sas_pairs(sas)?);
        }

        if let Some(endpoint) = &creds.endpoint {
            builder = builder
                .with_allow_http(endpoint.starts_with("http://"))
                .with_endpoint(endpoint.clone());
        }

        let store = builder.build().map_err(|e| {
            Error::invalid_input()
                .with_message(format!("cannot configure Azure storage: {e}"))
                .with_source(e)
        })?;

        tracing::debug!(
            target: TRACING_TARGET_PROVIDER,
            provider = Self::ID,
            account = %creds.account_name,
            container = %creds.container,
            emulator = creds.use_emulator,
            "Storage client ready"
        );

        Ok(Self(ObjectStoreClient::new(store)))
    }

    fn into_client(self) -> ObjectStoreClient {
        self.0
    }
}

/// Splits a SAS token query string into decoded key/value pairs.
///
/// The store encodes the pairs again when it builds request URLs, so a
/// signature such as `sig=a%2Bb%3D` must be passed on as `a+b=`.
fn sas_pairs(sas: &str) -> Result<Vec<(String, String)>> {
    sas.trim_start_matches('?')
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            Ok((decode_sas(key)?, decode_sas(value)?))
        })
        .collect()
}

fn decode_sas(component: &str) -> Result<String> {
    percent_decode_str(component)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| {
            Error::invalid_input()
                .with_message("SharedAccessSignature is not valid UTF-8 once decoded")
                .with_source(e)
        })
}
