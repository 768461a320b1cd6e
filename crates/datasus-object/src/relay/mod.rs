//! Moving archives between local disk and the object store, and expanding
//! a stored ZIP archive into one object per entry.
//!
//! A relay is not atomic. Entries are written one at a time, so a failure
//! partway through leaves the entries written so far in place, and readers
//! listing the target prefix during a relay may observe a partial set.
//! Objects under the prefix that the archive no longer contains are left
//! untouched.

use std::io::{Cursor, Read};
use std::path::{Component, Path};

use bytes::Bytes;
use datasus_core::{Error, Result, observe};
use zip::ZipArchive;

use crate::TRACING_TARGET_RELAY;
use crate::client::{ObjectStoreClient, PutOutput, UploadOptions};
use crate::error::from_zip;

mod report;

pub use report::RelayReport;

/// Upload, download and ZIP expansion on top of an [`ObjectStoreClient`].
#[derive(Debug, Clone)]
pub struct ArchiveRelay {
    client: ObjectStoreClient,
    upload_options: UploadOptions,
}

/// A single archive entry after decompression.
enum Entry {
    File { name: String, data: Vec<u8> },
    Directory,
    Unsafe { name: String },
}

impl ArchiveRelay {
    pub fn new(client: ObjectStoreClient) -> Self {
        Self {
            client,
            upload_options: UploadOptions::default(),
        }
    }

    /// Overrides chunking and concurrency of [`upload`](Self::upload).
    pub fn with_upload_options(mut self, upload_options: UploadOptions) -> Self {
        self.upload_options = upload_options;
        self
    }

    pub fn client(&self) -> &ObjectStoreClient {
        &self.client
    }

    /// Uploads the file at `local_path` to `object_name`, overwriting any
    /// existing object.
    ///
    /// # Errors
    ///
    /// `NotFound` when `local_path` is not an existing regular file; the
    /// store is not contacted in that case.
    pub async fn upload(&self, local_path: &Path, object_name: &str) -> Result<PutOutput> {
        observe("upload", async {
            let is_file = tokio::fs::metadata(local_path)
                .await
                .map(|meta| meta.is_file())
                .unwrap_or(false);
            if !is_file {
                return Err(Error::not_found()
                    .with_message(format!("The file {} does not exist.", local_path.display())));
            }

            let output = self
                .client
                .put_file(object_name, local_path, self.upload_options)
                .await?;

            tracing::info!(
                target: TRACING_TARGET_RELAY,
                key = object_name,
                path = %local_path.display(),
                size = output.size,
                "Uploaded {} to {object_name}",
                local_path.display()
            );
            Ok(output)
        })
        .await
    }

    /// Writes the object at `object_name` to `local_path`, overwriting any
    /// existing file, and returns the number of bytes written.
    pub async fn download(&self, object_name: &str, local_path: &Path) -> Result<u64> {
        observe("download", async {
            let object = self.client.get(object_name).await?;
            if let Some(parent) = local_path.parent()
                && !parent.as_os_str().is_empty()
            {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(local_path, &object.data).await?;

            tracing::info!(
                target: TRACING_TARGET_RELAY,
                key = object_name,
                path = %local_path.display(),
                size = object.len(),
                "Downloaded {object_name} to {}",
                local_path.display()
            );
            Ok(object.len() as u64)
        })
        .await
    }

    /// Expands the ZIP archive stored at `source` into one object per file
    /// entry under `target_prefix`.
    ///
    /// The archive is read fully into memory. Directory entries are skipped,
    /// as are entries whose name escapes the prefix (absolute paths or `..`
    /// above the root). Every file entry is written with overwrite.
    ///
    /// # Errors
    ///
    /// - `NotFound` when `source` does not exist.
    /// - `InvalidArchive` when `source` is not a ZIP archive; nothing is
    ///   written in that case.
    /// - Any storage error while writing entries. Entries written before the
    ///   failure remain.
    pub async fn relay(&self, source: &str, target_prefix: &str) -> Result<RelayReport> {
        observe("relay", async {
            let object = self.client.get(source).await?;
            let mut report = RelayReport::new(source, target_prefix, object.len() as u64);
            let mut archive = ZipArchive::new(Cursor::new(object.data)).map_err(from_zip)?;

            if let Err(error) = self.expand(&mut archive, &mut report).await {
                tracing::error!(
                    target: TRACING_TARGET_RELAY,
                    source,
                    target_prefix,
                    written = report.len(),
                    total = archive.len(),
                    "Relay stopped after {} of {} entries",
                    report.len(),
                    archive.len()
                );
                return Err(error);
            }

            tracing::info!(
                target: TRACING_TARGET_RELAY,
                source,
                target_prefix,
                objects = report.len(),
                directories_skipped = report.directories_skipped,
                unsafe_skipped = report.unsafe_skipped,
                size = report.bytes_written,
                "Relayed {source} into {target_prefix}"
            );
            Ok(report)
        })
        .await
    }

    async fn expand(
        &self,
        archive: &mut ZipArchive<Cursor<Bytes>>,
        report: &mut RelayReport,
    ) -> Result<()> {
        for index in 0..archive.len() {
            match read_entry(archive, index, report.archive_size)? {
                Entry::Directory => report.directories_skipped += 1,
                Entry::Unsafe { name } => {
                    tracing::warn!(
                        target: TRACING_TARGET_RELAY,
                        entry = %name,
                        "Skipping archive entry outside the target prefix"
                    );
                    report.unsafe_skipped += 1;
                }
                Entry::File { name, data } => {
                    let key = join_key(&report.target_prefix, &name);
                    let size = data.len() as u64;
                    self.client.put(&key, Bytes::from(data), None).await?;

                    tracing::debug!(target: TRACING_TARGET_RELAY, key = %key, size, "Entry written");
                    report.bytes_written += size;
                    report.objects.push(key);
                }
            }
        }
        Ok(())
    }
}

/// Decompresses entry `index`.
///
/// The size declared in the archive only bounds the read; an entry that
/// decompresses to a different length is an invalid archive.
fn read_entry(
    archive: &mut ZipArchive<Cursor<Bytes>>,
    index: usize,
    archive_size: u64,
) -> Result<Entry> {
    let mut file = archive.by_index(index).map_err(from_zip)?;
    if file.is_dir() {
        return Ok(Entry::Directory);
    }

    let Some(name) = file.enclosed_name().and_then(|path| entry_key(&path)) else {
        return Ok(Entry::Unsafe {
            name: file.name().to_owned(),
        });
    };

    let declared = file.size();
    let capacity = usize::try_from(declared.min(archive_size)).unwrap_or(0);
    let mut data = Vec::with_capacity(capacity);

    // One byte past the declared size so an overrun is seen and the reader
    // reaches its end, where the CRC is checked.
    (&mut file)
        .take(declared.saturating_add(1))
        .read_to_end(&mut data)
        .map_err(|e| {
            Error::invalid_archive()
                .with_message(format!("cannot decompress entry '{name}': {e}"))
                .with_source(e)
        })?;

    if data.len() as u64 != declared {
        return Err(Error::invalid_archive().with_message(format!(
            "entry '{name}' declares {declared} bytes but holds {}",
            data.len()
        )));
    }
    Ok(Entry::File { name, data })
}

/// Turns an enclosed entry path into a `/`-separated key suffix.
fn entry_key(path: &Path) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::ParentDir => {
                parts.pop()?;
            }
            Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    (!parts.is_empty()).then(|| parts.join("/"))
}

/// Joins an object key prefix and a name with exactly one `/` between them.
///
/// An empty prefix yields `name` unchanged.
pub fn join_key(prefix: &str, name: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let name = name.trim_start_matches('/');
    if prefix.is_empty() {
        name.to_owned()
    } else {
        format!("{prefix}/{name}")
    }
}
