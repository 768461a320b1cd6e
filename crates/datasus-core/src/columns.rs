//! Column name normalization for extracted CSV files.
//!
//! DATASUS headers mix upper case, spaces, dots and accented characters.
//! [`to_snake_case`] turns each header into a plain `snake_case` identifier
//! and [`normalize_header`] applies it to the header record of a delimited
//! file without reading any data rows.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

static UNWANTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9.\-_ ]+").expect("valid pattern"));

static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s.]+").expect("valid pattern"));

/// Original and normalized name of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRename {
    /// Header as it appears in the file.
    pub original: String,
    /// Normalized `snake_case` name.
    pub normalized: String,
}

/// Converts a column name to `snake_case`.
///
/// Characters outside `[a-zA-Z0-9.-_ ]` are dropped, runs of whitespace and
/// dots become a single underscore, and the result is lowercased.
pub fn to_snake_case(name: &str) -> String {
    let cleaned = UNWANTED.replace_all(name, "");
    SEPARATORS.replace_all(&cleaned, "_").to_lowercase()
}

/// Reads the header record of a delimited file and normalizes every column.
///
/// Header bytes that are not valid UTF-8 are decoded as Latin-1, which is
/// the encoding DATASUS publishes its CSV files in.
pub fn normalize_header(data: &[u8], delimiter: u8) -> Result<Vec<ColumnRename>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let headers = reader.byte_headers().map_err(|e| {
        Error::invalid_input()
            .with_message("failed to read CSV header")
            .with_source(e)
    })?;

    if headers.is_empty() {
        return Err(Error::invalid_input().with_message("CSV header is empty"));
    }

    Ok(headers
        .iter()
        .map(|field| {
            let original = decode_field(field);
            let normalized = to_snake_case(&original);
            ColumnRename {
                original,
                normalized,
            }
        })
        .collect())
}

fn decode_field(field: &[u8]) -> String {
    match std::str::from_utf8(field) {
        Ok(text) => text.to_owned(),
        Err(_) => field.iter().map(|&b| char::from(b)).collect(),
    }
}
