//! Observable events for the record store
//!
//! Events are explicit and typed. Each carries its default severity.

use std::fmt;

use super::logger::Severity;

/// Observable events in the record store lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration loaded from a file
    ConfigLoaded,

    // Parse
    /// Parsing of a FASTA source begins
    ParseStart,
    /// Parsing finished, store populated
    ParseComplete,
    /// A later record replaced an earlier one with the same primary key
    DuplicateKey,

    // Materialization
    /// Pending metadata decoded into fields
    MetadataDecoded,
    /// Pending metadata is not valid JSON
    MetadataDecodeFailed,

    // Mutation
    /// Whole record replaced
    RecordReplaced,
    /// Single field set on a record
    FieldSet,

    // Write
    /// Serialization begins
    WriteStart,
    /// Serialization complete
    WriteComplete,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ParseStart => "FASTA_PARSE_BEGIN",
            Event::ParseComplete => "FASTA_PARSE_COMPLETE",
            Event::DuplicateKey => "FASTA_DUPLICATE_KEY",
            Event::MetadataDecoded => "METADATA_DECODED",
            Event::MetadataDecodeFailed => "METADATA_DECODE_FAILED",
            Event::RecordReplaced => "RECORD_REPLACED",
            Event::FieldSet => "RECORD_FIELD_SET",
            Event::WriteStart => "FASTA_WRITE_BEGIN",
            Event::WriteComplete => "FASTA_WRITE_COMPLETE",
        }
    }

    /// Returns the severity this event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::DuplicateKey | Event::MetadataDecodeFailed => Severity::Warn,
            Event::MetadataDecoded | Event::RecordReplaced | Event::FieldSet => Severity::Trace,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
