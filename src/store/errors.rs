//! Record store error types
//!
//! Error codes:
//! - FASTA_IO_ERROR (ERROR severity)
//! - FASTA_KEY_INDEX_OUT_OF_RANGE (ERROR severity)
//! - FASTA_METADATA_DECODE_FAILED (ERROR severity)
//! - FASTA_INVALID_FIELD (ERROR severity)
//! - FASTA_INVALID_CONFIG (FATAL severity)
//!
//! Nothing here is retried. Every failure is local and deterministic.

use std::io;

use thiserror::Error;

use crate::observability::Severity;

/// Result type for record store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Record store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Source or destination could not be read or written
    #[error("I/O error: {message}: {source}")]
    Io {
        /// What was being attempted
        message: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// The configured key index does not exist in a header
    #[error(
        "Key index {key_index} out of range at line {line}: header has {token_count} tokens"
    )]
    KeyIndexOutOfRange {
        /// 1-based line number of the offending header
        line: usize,
        /// Configured key index
        key_index: usize,
        /// Number of delimited tokens found in the header
        token_count: usize,
    },

    /// Pending metadata is not a valid JSON object
    #[error("Failed to decode metadata for record '{key}': {source}")]
    MetadataDecode {
        /// Primary key of the record
        key: String,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// A reserved field was given a value of the wrong shape
    #[error("Invalid value for field '{field}': {reason}")]
    InvalidField {
        /// Field name
        field: String,
        /// Why the value was rejected
        reason: String,
    },

    /// Store configuration is unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl StoreError {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create an invalid field error
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Io { .. } => "FASTA_IO_ERROR",
            StoreError::KeyIndexOutOfRange { .. } => "FASTA_KEY_INDEX_OUT_OF_RANGE",
            StoreError::MetadataDecode { .. } => "FASTA_METADATA_DECODE_FAILED",
            StoreError::InvalidField { .. } => "FASTA_INVALID_FIELD",
            StoreError::InvalidConfig(_) => "FASTA_INVALID_CONFIG",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            StoreError::InvalidConfig(_) => Severity::Fatal,
            _ => Severity::Error,
        }
    }

    /// Returns whether this error is fatal (the store cannot be constructed)
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}
