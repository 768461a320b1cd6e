//! Outcome of a ZIP relay.

use serde::Serialize;

/// What [`ArchiveRelay::relay`](super::ArchiveRelay::relay) wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayReport {
    /// Key of the archive object that was expanded.
    pub source: String,
    /// Prefix the entries were written under.
    pub target_prefix: String,
    /// Size of the archive object in bytes.
    pub archive_size: u64,
    /// Keys written, in archive order.
    pub objects: Vec<String>,
    /// Directory entries that produced no object.
    pub directories_skipped: usize,
    /// Entries whose name would escape the target prefix.
    pub unsafe_skipped: usize,
    /// Total decompressed bytes uploaded.
    pub bytes_written: u64,
}

impl RelayReport {
    pub(crate) fn new(source: &str, target_prefix: &str, archive_size: u64) -> Self {
        Self {
            source: source.to_owned(),
            target_prefix: target_prefix.to_owned(),
            archive_size,
            ..Self::default()
        }
    }

    /// Number of objects written.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns `true` when the archive produced no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
