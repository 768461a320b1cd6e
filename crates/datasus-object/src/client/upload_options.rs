//! Tuning knobs for [`ObjectStoreClient::put_file`](super::ObjectStoreClient::put_file).

/// Default multipart chunk size: 8 MiB.
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024 * 1024;

/// Default number of parts uploaded concurrently.
pub const DEFAULT_MAX_CONCURRENCY: usize = 5;

/// Chunking and parallelism of a file upload.
///
/// These only affect throughput; the stored object is identical either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadOptions {
    /// Size of each multipart chunk in bytes.
    pub chunk_size: usize,
    /// Parts allowed in flight at once.
    pub max_concurrency: usize,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

impl UploadOptions {
    /// Sets the chunk size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Sets the number of concurrent parts.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Chunk size, using the default if zero.
    pub fn effective_chunk_size(&self) -> usize {
        match self.chunk_size {
            0 => DEFAULT_CHUNK_SIZE,
            n => n,
        }
    }

    /// Concurrency, never below one.
    pub fn effective_max_concurrency(&self) -> usize {
        self.max_concurrency.max(1)
    }
}
