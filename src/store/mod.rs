//! Record Store subsystem
//!
//! Loads a delimited-header FASTA file into memory, keyed by primary key,
//! and writes it back reflecting any edits.
//!
//! # File format
//!
//! ```text
//! >field0|field1|...|fieldN|{"jsonKey":"jsonVal"}
//! SEQUENCE
//! ```
//!
//! # Design Principles
//!
//! - Two lines per record, sequence lines are opaque
//! - Headers split eagerly, metadata JSON decoded on first access
//! - Insertion order preserved; duplicate key overwrites in place
//! - Writing never consumes or alters in-memory records

mod errors;
mod fasta_store;
mod header;
mod reader;
mod record;
mod writer;

pub use errors::{StoreError, StoreResult};
pub use fasta_store::FastaStore;
pub use header::{format_header, parse_header, ParsedHeader, HEADER_MARKER};
pub use reader::{FastaReader, KeyedRecord};
pub use record::{Metadata, Record, DELIMITED_FIELD, SEQUENCE_FIELD};
pub use writer::FastaWriter;
