//! Delimited header codec
//!
//! A header line is split on the delimiter. The token at the key index is the
//! primary key. If the last remaining token starts with `{` it is the metadata
//! JSON, kept undecoded. Whatever remains are the secondary fields.
//!
//! There is no escaping: the delimiter must not occur inside a field value.

use crate::config::{HeaderStyle, StoreConfig};

use super::errors::{StoreError, StoreResult};
use super::record::{Record, DELIMITED_FIELD, SEQUENCE_FIELD};

/// Header start marker
pub const HEADER_MARKER: char = '>';

/// A header split into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedHeader {
    /// Primary key
    pub key: String,
    /// Remaining tokens, in order
    pub secondary_fields: Vec<String>,
    /// Undecoded metadata token, if any
    pub metadata: Option<String>,
}

/// Splits a header line (marker optional, already trimmed).
///
/// `line` is the 1-based line number, used for error context only.
pub fn parse_header(
    header: &str,
    key_index: usize,
    delimiter: &str,
    line: usize,
) -> StoreResult<ParsedHeader> {
    let header = header.strip_prefix(HEADER_MARKER).unwrap_or(header);
    let mut tokens: Vec<&str> = header.split(delimiter).collect();

    if key_index >= tokens.len() {
        return Err(StoreError::KeyIndexOutOfRange {
            line,
            key_index,
            token_count: tokens.len(),
        });
    }
    let key = tokens.remove(key_index).to_string();

    let metadata = if tokens.last().is_some_and(|t| t.starts_with('{')) {
        tokens.pop().map(str::to_string)
    } else {
        // Left behind by a trailing delimiter with no metadata after it
        if tokens.last().is_some_and(|t| t.is_empty()) {
            tokens.pop();
        }
        None
    };

    Ok(ParsedHeader {
        key,
        secondary_fields: tokens.into_iter().map(str::to_string).collect(),
        metadata,
    })
}

/// Renders the header line for a materialized record, without the newline.
///
/// The key is re-inserted at the key index and is always emitted. Records
/// whose header would not parse back to the same key and fields are
/// rejected with `FASTA_INVALID_FIELD` instead of being written lossily.
pub fn format_header(key: &str, record: &Record, config: &StoreConfig) -> StoreResult<String> {
    let delimiter = config.delimiter.as_str();

    check_token("key", key, delimiter)?;
    for token in &record.secondary_fields {
        check_token(DELIMITED_FIELD, token, delimiter)?;
    }
    if record.secondary_fields.len() < config.key_index {
        return Err(StoreError::invalid_field(
            DELIMITED_FIELD,
            format!(
                "key index {} needs at least {} secondary fields, record has {}",
                config.key_index,
                config.key_index,
                record.secondary_fields.len()
            ),
        ));
    }

    let mut tokens: Vec<&str> = record.secondary_fields.iter().map(String::as_str).collect();
    tokens.insert(config.key_index, key);

    let mut header = String::with_capacity(64);
    header.push(HEADER_MARKER);
    header.push_str(&tokens.join(delimiter));

    let metadata = match record.metadata.fields() {
        Some(fields) if !fields.is_empty() => Some(serde_json::to_string(fields).map_err(|e| {
            StoreError::invalid_field("metadata", format!("failed to encode: {}", e))
        })?),
        Some(_) => None,
        None => {
            return Err(StoreError::invalid_field(
                "metadata",
                "metadata has not been decoded yet",
            ))
        }
    };

    // An empty or '{'-prefixed last field would be dropped or read as metadata
    let last_is_ambiguous = record
        .secondary_fields
        .last()
        .is_some_and(|t| t.is_empty() || t.starts_with('{'));

    if metadata.is_some()
        || last_is_ambiguous
        || config.header_style == HeaderStyle::TrailingDelimiter
    {
        header.push_str(delimiter);
    }
    if let Some(json) = metadata {
        if json.contains(delimiter) {
            return Err(StoreError::invalid_field(
                "metadata",
                format!("encoded metadata contains the delimiter '{}'", delimiter),
            ));
        }
        header.push_str(&json);
    }

    // A bare marker reads back as end of input
    if header.len() == HEADER_MARKER.len_utf8() {
        return Err(StoreError::invalid_field(
            "key",
            "empty key with no other header content",
        ));
    }

    Ok(header)
}

/// Checks that a record's sequence survives the line-based reader.
pub fn check_sequence(sequence: &str) -> StoreResult<()> {
    if sequence.trim().is_empty() {
        // Reads back as end of input
        return Err(StoreError::invalid_field(SEQUENCE_FIELD, "sequence is empty"));
    }
    if sequence.contains(['\n', '\r']) {
        return Err(StoreError::invalid_field(
            SEQUENCE_FIELD,
            "sequence contains a line break",
        ));
    }
    Ok(())
}

fn check_token(field: &str, token: &str, delimiter: &str) -> StoreResult<()> {
    if token.contains(delimiter) {
        return Err(StoreError::invalid_field(
            field,
            format!("'{}' contains the delimiter '{}'", token, delimiter),
        ));
    }
    if token.contains(['\n', '\r']) {
        return Err(StoreError::invalid_field(
            field,
            format!("'{}' contains a line break", token.escape_debug()),
        ));
    }
    Ok(())
}
