//! Results returned by [`ObjectStoreClient`](super::ObjectStoreClient).

use bytes::Bytes;
use object_store::{ObjectMeta, PutResult};

/// A downloaded object.
#[derive(Debug)]
pub struct GetOutput {
    /// Object body.
    pub data: Bytes,
    /// MIME content-type, if the backend stores one.
    pub content_type: Option<String>,
    /// Size, etag and last-modified as reported by the backend.
    pub meta: ObjectMeta,
}

impl GetOutput {
    /// Body length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` for a zero-byte object.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A completed upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutOutput {
    /// Key the object was written to.
    pub key: String,
    /// Bytes written.
    pub size: u64,
    pub e_tag: Option<String>,
    pub version: Option<String>,
}

impl PutOutput {
    pub(crate) fn new(key: &str, size: u64, result: PutResult) -> Self {
        Self {
            key: key.to_owned(),
            size,
            e_tag: result.e_tag,
            version: result.version,
        }
    }
}
