//! Translation of storage and archive errors into the pipeline taxonomy.

use datasus_core::Error;

/// Convert an [`object_store::Error`] into a pipeline [`Error`].
pub(crate) fn from_object_store(err: object_store::Error) -> Error {
    let base = match err {
        object_store::Error::NotFound { .. } => Error::not_found(),
        object_store::Error::AlreadyExists { .. } => Error::already_exists(),
        object_store::Error::InvalidPath { .. } => Error::invalid_input(),
        _ => Error::operation_failure(),
    };
    base.with_message(err.to_string()).with_source(err)
}

/// Convert a [`zip::result::ZipError`] into a pipeline [`Error`].
///
/// The archive is fully buffered before it is opened, so even I/O errors
/// reported by the ZIP reader come from malformed archive data.
pub(crate) fn from_zip(err: zip::result::ZipError) -> Error {
    Error::invalid_archive()
        .with_message(err.to_string())
        .with_source(err)
}

#[cfg(test)]
mod tests {
    use datasus_core::ErrorKind;

    use super::*;

    #[test]
    fn not_found_keeps_its_kind() {
        let err = object_store::Error::NotFound {
            path: "missing".to_string(),
            source: "no such key".into(),
        };
        assert_eq!(from_object_store(err).kind(), ErrorKind::NotFound);
    }

    #[test]
    fn zip_errors_are_invalid_archives() {
        let err = from_zip(zip::result::ZipError::InvalidArchive("bad".into()));
        assert_eq!(err.kind(), ErrorKind::InvalidArchive);
    }
}
