//! fastannotation - FASTA files with delimited headers and JSON metadata
//!
//! Headers carry a primary key at a fixed position, ordered secondary fields,
//! and an optional trailing JSON object:
//!
//! ```
//! use std::io::Cursor;
//! use fastannotation::{FastaStore, StoreConfig};
//! use serde_json::json;
//!
//! let input = ">seq1|desc|{\"len\":4}\nACGT\n";
//! let mut store = FastaStore::from_reader(Cursor::new(input), StoreConfig::default())?;
//!
//! let record = store.get("seq1")?.expect("present");
//! assert_eq!(record.sequence, "ACGT");
//! assert_eq!(record.metadata_field("len"), Some(&json!(4)));
//!
//! store.set_field("seq1", "gc", json!(0.5))?;
//! let mut out = Vec::new();
//! store.write_to(&mut out)?;
//! assert_eq!(out, b">seq1|desc|{\"gc\":0.5,\"len\":4}\nACGT\n");
//! # Ok::<(), fastannotation::StoreError>(())
//! ```

pub mod config;
pub mod observability;
pub mod store;

pub use config::{HeaderStyle, StoreConfig, DEFAULT_DELIMITER};
pub use store::{FastaStore, Metadata, Record, StoreError, StoreResult};
