//! FASTA writer
//!
//! Emits one header line and one sequence line per record. Records must be
//! materialized; the writer never decodes metadata itself and never mutates
//! what it is given.

use std::io::Write;

use crate::config::StoreConfig;

use super::errors::{StoreError, StoreResult};
use super::header::{check_sequence, format_header};
use super::record::Record;

/// Writer for delimited-header FASTA records
pub struct FastaWriter<'a, W: Write> {
    writer: W,
    config: &'a StoreConfig,
    records_written: usize,
}

impl<'a, W: Write> FastaWriter<'a, W> {
    /// Create a writer using the header layout in `config`
    pub fn new(writer: W, config: &'a StoreConfig) -> Self {
        Self {
            writer,
            config,
            records_written: 0,
        }
    }

    /// Returns the number of records written so far
    pub fn records_written(&self) -> usize {
        self.records_written
    }

    /// Writes one record.
    ///
    /// # Errors
    ///
    /// - `FASTA_INVALID_FIELD` if the record would not read back as written
    ///   (pending metadata, empty sequence, delimiter or line break in a token)
    /// - `FASTA_IO_ERROR` if the destination rejects the write
    pub fn write_record(&mut self, key: &str, record: &Record) -> StoreResult<()> {
        let header = format_header(key, record, self.config)?;
        check_sequence(&record.sequence)?;

        let mut buf = String::with_capacity(header.len() + record.sequence.len() + 2);
        buf.push_str(&header);
        buf.push('\n');
        buf.push_str(&record.sequence);
        buf.push('\n');

        self.writer
            .write_all(buf.as_bytes())
            .map_err(|e| StoreError::io(format!("failed to write record '{}'", key), e))?;
        self.records_written += 1;
        Ok(())
    }

    /// Flushes and returns the underlying writer
    pub fn finish(mut self) -> StoreResult<W> {
        self.writer
            .flush()
            .map_err(|e| StoreError::io("failed to flush output", e))?;
        Ok(self.writer)
    }
}
