//! Unified object-store client backed by [`object_store::ObjectStore`].
//!
//! [`ObjectStoreClient`] is a thin, cloneable wrapper around
//! `Arc<dyn ObjectStore>` that provides convenience methods for the
//! operations the pipeline needs. Every public method is instrumented with
//! [`tracing`] and reports failures as [`datasus_core::Error`].

use std::sync::Arc;

use bytes::Bytes;
use datasus_core::{Error, Result};
use futures::TryStreamExt;
use object_store::path::Path;
use object_store::{ObjectMeta, ObjectStore, PutMode, PutOptions, PutPayload, WriteMultipart};
use tokio::io::AsyncReadExt;

use crate::TRACING_TARGET_CLIENT;
use crate::error::from_object_store;

mod output;
mod upload_options;

pub use output::{GetOutput, PutOutput};
pub use upload_options::{DEFAULT_CHUNK_SIZE, DEFAULT_MAX_CONCURRENCY, UploadOptions};

/// Cloneable handle to any [`ObjectStore`] backend (Azure, local, in-memory).
///
/// All methods accept human-readable string keys and convert them to
/// [`object_store::path::Path`] internally.
#[derive(Clone, Debug)]
pub struct ObjectStoreClient(pub Arc<dyn ObjectStore>);

impl ObjectStoreClient {
    /// Wrap a concrete [`ObjectStore`] implementation.
    pub fn new(store: impl ObjectStore) -> Self {
        Self(Arc::new(store))
    }

    /// List object metadata under `prefix`.
    #[tracing::instrument(name = "object.list", skip(self), fields(prefix))]
    pub async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>> {
        let prefix = if prefix.is_empty() {
            None
        } else {
            Some(Path::from(prefix))
        };
        self.0
            .list(prefix.as_ref())
            .try_collect()
            .await
            .map_err(from_object_store)
    }

    /// Retrieve the raw bytes, content-type, and metadata stored at `key`.
    #[tracing::instrument(name = "object.get", skip(self), fields(key))]
    pub async fn get(&self, key: &str) -> Result<GetOutput> {
        let path = Path::from(key);
        let result = self.0.get(&path).await.map_err(from_object_store)?;
        let meta = result.meta.clone();
        let content_type = result
            .attributes
            .get(&object_store::Attribute::ContentType)
            .map(|v| v.to_string());
        let data = result.bytes().await.map_err(from_object_store)?;
        Ok(GetOutput {
            data,
            content_type,
            meta,
        })
    }

    /// Upload `data` to `key`, overwriting any existing object.
    pub async fn put(&self, key: &str, data: Bytes, content_type: Option<&str>) -> Result<PutOutput> {
        self.put_opts(key, data, PutMode::Overwrite, content_type)
            .await
    }

    /// Upload `data` to `key` with the specified [`PutMode`].
    #[tracing::instrument(name = "object.put_opts", skip(self, data), fields(key, size = data.len()))]
    pub async fn put_opts(
        &self,
        key: &str,
        data: Bytes,
        mode: PutMode,
        content_type: Option<&str>,
    ) -> Result<PutOutput> {
        let path = Path::from(key);
        let size = data.len() as u64;
        let payload = PutPayload::from(data);
        let mut opts = PutOptions {
            mode,
            ..Default::default()
        };
        if let Some(ct) = content_type {
            opts.attributes
                .insert(object_store::Attribute::ContentType, ct.to_string().into());
        }
        let result = self
            .0
            .put_opts(&path, payload, opts)
            .await
            .map_err(from_object_store)?;
        Ok(PutOutput::new(key, size, result))
    }

    /// Upload the file at `local_path` to `key`, overwriting any existing
    /// object.
    ///
    /// Files no larger than one chunk go up in a single request. Larger
    /// files are streamed as a multipart upload with at most
    /// `options.max_concurrency` parts in flight; a failed multipart upload
    /// is aborted so no partial object is left behind.
    #[tracing::instrument(
        name = "object.put_file",
        skip(self, options),
        fields(key, path = %local_path.display())
    )]
    pub async fn put_file(
        &self,
        key: &str,
        local_path: &std::path::Path,
        options: UploadOptions,
    ) -> Result<PutOutput> {
        let mut file = tokio::fs::File::open(local_path).await?;
        let size = file.metadata().await?.len();
        let chunk_size = options.effective_chunk_size();

        if size <= chunk_size as u64 {
            let mut data = Vec::with_capacity(size as usize);
            file.read_to_end(&mut data).await?;
            return self.put(key, Bytes::from(data), None).await;
        }

        let path = Path::from(key);
        let upload = self
            .0
            .put_multipart(&path)
            .await
            .map_err(from_object_store)?;
        let mut writer = WriteMultipart::new_with_chunk_size(upload, chunk_size);

        let streamed = async {
            let mut buf = vec![0u8; chunk_size];
            loop {
                let read = file.read(&mut buf).await?;
                if read == 0 {
                    break;
                }
                writer
                    .wait_for_capacity(options.effective_max_concurrency())
                    .await
                    .map_err(from_object_store)?;
                writer.write(&buf[..read]);
            }
            Ok::<_, Error>(())
        }
        .await;

        if let Err(err) = streamed {
            if let Err(abort_err) = writer.abort().await {
                tracing::warn!(
                    target: TRACING_TARGET_CLIENT,
                    key,
                    error = %abort_err,
                    "Failed to abort multipart upload"
                );
            }
            return Err(err);
        }

        let result = writer.finish().await.map_err(from_object_store)?;

        tracing::debug!(
            target: TRACING_TARGET_CLIENT,
            key,
            size,
            chunk_size,
            "Multipart upload complete"
        );

        Ok(PutOutput::new(key, size, result))
    }
}

#[cfg(test)]
mod tests {
    use datasus_core::ErrorKind;
    use object_store::memory::InMemory;

    use super::*;

    fn test_client() -> ObjectStoreClient {
        ObjectStoreClient::new(InMemory::new())
    }

    #[tokio::test]
    async fn put_and_get() {
        let client = test_client();
        let data = Bytes::from("hello world");
        client
            .put("test.txt", data.clone(), Some("text/plain"))
            .await
            .unwrap();

        let result = client.get("test.txt").await.unwrap();
        assert_eq!(result.data, data);
        assert_eq!(result.content_type.as_deref(), Some("text/plain"));
    }

    #[tokio::test]
    async fn put_overwrites() {
        let client = test_client();
        client.put("same.bin", Bytes::from("first"), None).await.unwrap();
        client.put("same.bin", Bytes::from("second"), None).await.unwrap();

        let result = client.get("same.bin").await.unwrap();
        assert_eq!(result.data, Bytes::from("second"));
    }

    #[tokio::test]
    async fn get_not_found() {
        let client = test_client();
        let err = client.get("missing").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn list() {
        let client = test_client();
        for i in 0..3 {
            client
                .put(
                    &format!("dir/file{i}.txt"),
                    Bytes::from(format!("{i}")),
                    None,
                )
                .await
                .unwrap();
        }
        client.put("other/file.txt", Bytes::from("x"), None).await.unwrap();

        let items = client.list("dir/").await.unwrap();
        assert_eq!(items.len(), 3);
    }

    #[tokio::test]
    async fn put_create_only() {
        let client = test_client();
        client
            .put_opts("unique.bin", Bytes::from("first"), PutMode::Create, None)
            .await
            .unwrap();

        let err = client
            .put_opts("unique.bin", Bytes::from("second"), PutMode::Create, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    }

    #[tokio::test]
    async fn put_file_single_request() {
        let client = test_client();
        let dir = tempfile::TempDir::new().unwrap();
        let local = dir.path().join("small.bin");
        std::fs::write(&local, b"tiny").unwrap();

        client
            .put_file("zips/small.bin", &local, UploadOptions::default())
            .await
            .unwrap();

        let result = client.get("zips/small.bin").await.unwrap();
        assert_eq!(result.data, Bytes::from("tiny"));
    }

    #[tokio::test]
    async fn put_file_multipart() {
        let client = test_client();
        let dir = tempfile::TempDir::new().unwrap();
        let local = dir.path().join("large.bin");
        let contents: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&local, &contents).unwrap();

        let options = UploadOptions::default()
            .with_chunk_size(1024)
            .with_max_concurrency(2);
        let output = client
            .put_file("zips/large.bin", &local, options)
            .await
            .unwrap();
        assert_eq!(output.size, contents.len() as u64);

        let result = client.get("zips/large.bin").await.unwrap();
        assert_eq!(result.data.as_ref(), contents.as_slice());
    }

    #[tokio::test]
    async fn put_file_missing_local_file() {
        let client = test_client();
        let dir = tempfile::TempDir::new().unwrap();

        let err = client
            .put_file("x", &dir.path().join("nope"), UploadOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
