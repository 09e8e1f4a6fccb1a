//! Line-pair FASTA reader
//!
//! Records are exactly two lines: a `>` header and one sequence line. An
//! empty header or sequence line (after trimming) ends the input. A
//! truncated last record is therefore "no more records", not an error.
//!
//! Metadata JSON is never decoded here; it is carried as
//! [`Metadata::Pending`](super::record::Metadata::Pending).

use std::io::BufRead;

use super::errors::{StoreError, StoreResult};
use super::header::{parse_header, HEADER_MARKER};
use super::record::{Metadata, Record};

/// A parsed record together with its primary key and header line number
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedRecord {
    /// Primary key
    pub key: String,
    /// Record body
    pub record: Record,
    /// 1-based line number of the header
    pub line: usize,
}

/// Sequential reader over header/sequence line pairs
pub struct FastaReader<R: BufRead> {
    reader: R,
    key_index: usize,
    delimiter: String,
    line_buffer: String,
    line_number: usize,
    finished: bool,
}

impl<R: BufRead> FastaReader<R> {
    /// Create a reader over any buffered source
    pub fn new(reader: R, key_index: usize, delimiter: impl Into<String>) -> Self {
        Self {
            reader,
            key_index,
            delimiter: delimiter.into(),
            line_buffer: String::with_capacity(256),
            line_number: 0,
            finished: false,
        }
    }

    /// Returns the number of lines consumed so far
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Reads one line, trimmed. `None` at end of input.
    fn read_trimmed_line(&mut self) -> StoreResult<Option<String>> {
        self.line_buffer.clear();
        let bytes = self.reader.read_line(&mut self.line_buffer).map_err(|e| {
            StoreError::io(format!("failed to read line {}", self.line_number + 1), e)
        })?;
        if bytes == 0 {
            return Ok(None);
        }
        self.line_number += 1;
        Ok(Some(self.line_buffer.trim().to_string()))
    }

    /// Reads the next record.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(record))` if a record was read
    /// - `Ok(None)` at end of input or at an empty header/sequence line
    /// - `Err(FASTA_KEY_INDEX_OUT_OF_RANGE)` if the header is too short
    pub fn read_next(&mut self) -> StoreResult<Option<KeyedRecord>> {
        if self.finished {
            return Ok(None);
        }

        let header = match self.read_trimmed_line()? {
            Some(line) => line,
            None => return self.finish(),
        };
        let header_line = self.line_number;
        let sequence = match self.read_trimmed_line()? {
            Some(line) => line,
            None => return self.finish(),
        };

        // Sentinel: empty header (bare '>' counts) or empty sequence
        let header_body = header.strip_prefix(HEADER_MARKER).unwrap_or(&header);
        if header_body.is_empty() || sequence.is_empty() {
            return self.finish();
        }

        let parsed = parse_header(&header, self.key_index, &self.delimiter, header_line)?;
        let record = Record {
            sequence,
            secondary_fields: parsed.secondary_fields,
            metadata: match parsed.metadata {
                Some(raw) => Metadata::Pending(raw),
                None => Metadata::default(),
            },
        };

        Ok(Some(KeyedRecord {
            key: parsed.key,
            record,
            line: header_line,
        }))
    }

    fn finish(&mut self) -> StoreResult<Option<KeyedRecord>> {
        self.finished = true;
        Ok(None)
    }

    /// Reads all remaining records in file order, duplicates included.
    pub fn read_all(&mut self) -> StoreResult<Vec<KeyedRecord>> {
        let mut records = Vec::new();
        while let Some(record) = self.read_next()? {
            records.push(record);
        }
        Ok(records)
    }
}

impl<R: BufRead> Iterator for FastaReader<R> {
    type Item = StoreResult<KeyedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_next() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
