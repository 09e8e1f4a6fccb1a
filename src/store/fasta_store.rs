//! In-memory record store over a delimited-header FASTA file
//!
//! The whole file is parsed up front: headers are split eagerly, metadata JSON
//! is decoded lazily on first structured access. Records keep file order for
//! write-back; a duplicate key overwrites the earlier record in its original
//! position.
//!
//! Lookups that decode metadata mutate the store, so [`FastaStore::get`] takes
//! `&mut self`. Sharing a store across threads needs an external lock
//! (e.g. `Mutex<FastaStore>`); the store has none of its own.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::config::StoreConfig;
use crate::observability::{log_event_with_fields, Event};

use super::errors::{StoreError, StoreResult};
use super::header::{check_sequence, format_header};
use super::reader::{FastaReader, KeyedRecord};
use super::record::Record;
use super::writer::FastaWriter;

/// Keyed, insertion-ordered collection of FASTA records
#[derive(Debug, Clone)]
pub struct FastaStore {
    config: StoreConfig,
    source_path: Option<PathBuf>,
    /// Records in insertion order
    entries: Vec<(String, Record)>,
    /// key -> index into `entries`
    positions: HashMap<String, usize>,
}

impl FastaStore {
    /// Creates an empty store.
    ///
    /// # Errors
    ///
    /// Returns `FASTA_INVALID_CONFIG` if the delimiter is empty.
    pub fn new(config: StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            source_path: None,
            entries: Vec::new(),
            positions: HashMap::new(),
        })
    }

    /// Opens and parses a FASTA file.
    ///
    /// # Arguments
    ///
    /// * `path` - File to read in full
    /// * `key_index` - Zero-based position of the primary key among header tokens
    /// * `delimiter` - Header token delimiter, usually `"|"`
    ///
    /// # Errors
    ///
    /// - `FASTA_IO_ERROR` if the file cannot be read
    /// - `FASTA_KEY_INDEX_OUT_OF_RANGE` if any header has too few tokens
    pub fn open(path: impl AsRef<Path>, key_index: usize, delimiter: &str) -> StoreResult<Self> {
        Self::open_with_config(path, StoreConfig::new(key_index, delimiter))
    }

    /// Opens and parses a FASTA file with a full configuration.
    pub fn open_with_config(path: impl AsRef<Path>, config: StoreConfig) -> StoreResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| StoreError::io(format!("failed to open {}", path.display()), e))?;
        Self::load(BufReader::new(file), config, Some(path.to_path_buf()))
    }

    /// Parses records from any buffered source.
    pub fn from_reader<R: BufRead>(reader: R, config: StoreConfig) -> StoreResult<Self> {
        Self::load(reader, config, None)
    }

    fn load<R: BufRead>(
        reader: R,
        config: StoreConfig,
        source_path: Option<PathBuf>,
    ) -> StoreResult<Self> {
        let mut store = Self::new(config)?;
        let source = describe(source_path.as_deref());
        log_event_with_fields(Event::ParseStart, &[("source", source.as_str())]);

        let mut reader = FastaReader::new(
            reader,
            store.config.key_index,
            store.config.delimiter.clone(),
        );
        while let Some(KeyedRecord { key, record, line }) = reader.read_next()? {
            if store.positions.contains_key(&key) {
                let line = line.to_string();
                log_event_with_fields(
                    Event::DuplicateKey,
                    &[("key", key.as_str()), ("line", line.as_str())],
                );
            }
            store.insert(key, record);
        }

        store.source_path = source_path;

        let records = store.len().to_string();
        let lines = reader.line_number().to_string();
        log_event_with_fields(
            Event::ParseComplete,
            &[
                ("source", source.as_str()),
                ("records", records.as_str()),
                ("lines", lines.as_str()),
            ],
        );

        Ok(store)
    }

    /// Inserts or overwrites in place. No materialization.
    fn insert(&mut self, key: String, record: Record) -> Option<Record> {
        match self.positions.get(&key) {
            Some(&idx) => Some(std::mem::replace(&mut self.entries[idx].1, record)),
            None => {
                self.positions.insert(key.clone(), self.entries.len());
                self.entries.push((key, record));
                None
            }
        }
    }

    /// Decodes pending metadata of the record at `idx`.
    fn materialize_at(&mut self, idx: usize) -> StoreResult<()> {
        let (key, record) = &mut self.entries[idx];
        match record.materialize() {
            Ok(true) => {
                log_event_with_fields(Event::MetadataDecoded, &[("key", key.as_str())]);
                Ok(())
            }
            Ok(false) => Ok(()),
            Err(source) => {
                let reason = source.to_string();
                log_event_with_fields(
                    Event::MetadataDecodeFailed,
                    &[("key", key.as_str()), ("reason", reason.as_str())],
                );
                Err(StoreError::MetadataDecode {
                    key: key.clone(),
                    source,
                })
            }
        }
    }

    /// Looks up a record, decoding its metadata on first access.
    ///
    /// Returns `Ok(None)` for an absent key. Once decoded, later lookups are
    /// side-effect free. A decode failure leaves the raw JSON in place, so
    /// every retry fails the same way.
    ///
    /// # Errors
    ///
    /// Returns `FASTA_METADATA_DECODE_FAILED` if the metadata is not a JSON object.
    pub fn get(&mut self, key: &str) -> StoreResult<Option<&Record>> {
        let Some(&idx) = self.positions.get(key) else {
            return Ok(None);
        };
        self.materialize_at(idx)?;
        Ok(Some(&self.entries[idx].1))
    }

    /// Like [`get`](Self::get), returning a mutable record.
    pub fn get_mut(&mut self, key: &str) -> StoreResult<Option<&mut Record>> {
        let Some(&idx) = self.positions.get(key) else {
            return Ok(None);
        };
        self.materialize_at(idx)?;
        Ok(Some(&mut self.entries[idx].1))
    }

    /// Returns a record as stored, without decoding anything.
    pub fn peek(&self, key: &str) -> Option<&Record> {
        self.positions.get(key).map(|&idx| &self.entries[idx].1)
    }

    /// Replaces a record wholesale, returning the previous one.
    ///
    /// Pending metadata of the previous record is decoded first so it is
    /// returned intact rather than as raw text. Fields of the previous record
    /// that are absent from `record` are gone.
    ///
    /// # Errors
    ///
    /// Returns `FASTA_METADATA_DECODE_FAILED` if the previous record's metadata
    /// cannot be decoded; the store is left unchanged.
    pub fn set(&mut self, key: impl Into<String>, record: Record) -> StoreResult<Option<Record>> {
        let key = key.into();
        if let Some(&idx) = self.positions.get(&key) {
            self.materialize_at(idx)?;
        }
        log_event_with_fields(Event::RecordReplaced, &[("key", key.as_str())]);
        Ok(self.insert(key, record))
    }

    /// Replaces a record from a flat field mapping (`seq`, `delimited`, metadata).
    pub fn set_fields(
        &mut self,
        key: impl Into<String>,
        fields: Map<String, Value>,
    ) -> StoreResult<Option<Record>> {
        let record = Record::from_flat_map(fields)?;
        self.set(key, record)
    }

    /// Sets one field, creating an empty record if the key is absent.
    ///
    /// Returns the value that was replaced, if any.
    ///
    /// # Errors
    ///
    /// - `FASTA_METADATA_DECODE_FAILED` if existing metadata cannot be decoded
    /// - `FASTA_INVALID_FIELD` if `seq` is not a string or `delimited` is not an array
    pub fn set_field(
        &mut self,
        key: impl Into<String>,
        name: &str,
        value: Value,
    ) -> StoreResult<Option<Value>> {
        let key = key.into();
        let previous = match self.positions.get(&key).copied() {
            Some(idx) => {
                self.materialize_at(idx)?;
                self.entries[idx].1.set_field(name, value)?
            }
            None => {
                let mut record = Record::default();
                record.set_field(name, value)?;
                self.entries.push((key.clone(), record));
                self.positions.insert(key.clone(), self.entries.len() - 1);
                None
            }
        };
        log_event_with_fields(Event::FieldSet, &[("key", key.as_str()), ("field", name)]);
        Ok(previous)
    }

    /// Returns the number of distinct primary keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the store holds no records
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns whether a record exists for `key`
    pub fn contains_key(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }

    /// Primary keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Records in insertion order, as stored (metadata may still be pending)
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Record)> + '_ {
        self.entries.iter().map(|(key, record)| (key.as_str(), record))
    }

    /// Returns the number of records still holding undecoded metadata
    pub fn pending_metadata(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, record)| record.metadata.is_pending())
            .count()
    }

    /// Decodes every pending record, stopping at the first failure.
    pub fn materialize_all(&mut self) -> StoreResult<()> {
        for idx in 0..self.entries.len() {
            self.materialize_at(idx)?;
        }
        Ok(())
    }

    /// Serializes every record in insertion order. Returns the record count.
    ///
    /// All metadata is decoded and every record is checked before the first
    /// byte is written, so a failure produces no output. The store stays
    /// usable afterwards.
    ///
    /// # Errors
    ///
    /// - `FASTA_METADATA_DECODE_FAILED` if any metadata cannot be decoded
    /// - `FASTA_INVALID_FIELD` if any record would not read back as written
    /// - `FASTA_IO_ERROR` if the destination rejects the write
    pub fn write_to<W: Write>(&mut self, writer: W) -> StoreResult<usize> {
        self.prepare_write()?;
        self.write_inner(writer, "<writer>")
    }

    /// Writes the store to `path`, truncating any existing file.
    ///
    /// The destination is only touched once every record has passed the
    /// checks in [`write_to`](Self::write_to).
    pub fn write_to_path(&mut self, path: impl AsRef<Path>) -> StoreResult<usize> {
        let path = path.as_ref();
        self.prepare_write()?;
        let file = File::create(path)
            .map_err(|e| StoreError::io(format!("failed to create {}", path.display()), e))?;
        self.write_inner(BufWriter::new(file), &path.display().to_string())
    }

    /// Writes the store to `path` and drops it.
    pub fn write_consuming(mut self, path: impl AsRef<Path>) -> StoreResult<usize> {
        self.write_to_path(path)
    }

    /// Decodes all metadata and rejects records that would not read back.
    fn prepare_write(&mut self) -> StoreResult<()> {
        self.materialize_all()?;
        for (key, record) in &self.entries {
            format_header(key, record, &self.config)?;
            check_sequence(&record.sequence)?;
        }
        Ok(())
    }

    fn write_inner<W: Write>(&self, writer: W, destination: &str) -> StoreResult<usize> {
        log_event_with_fields(Event::WriteStart, &[("destination", destination)]);

        let mut fasta = FastaWriter::new(writer, &self.config);
        for (key, record) in &self.entries {
            fasta.write_record(key, record)?;
        }
        let written = fasta.records_written();
        fasta.finish()?;

        let records = written.to_string();
        log_event_with_fields(
            Event::WriteComplete,
            &[("destination", destination), ("records", records.as_str())],
        );
        Ok(written)
    }

    /// Returns the store configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the primary key position
    pub fn key_index(&self) -> usize {
        self.config.key_index
    }

    /// Returns the header delimiter
    pub fn delimiter(&self) -> &str {
        &self.config.delimiter
    }

    /// Returns the file this store was opened from, if any
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }
}

fn describe(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "<reader>".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Cursor;

    fn store(text: &str) -> FastaStore {
        FastaStore::from_reader(Cursor::new(text.as_bytes().to_vec()), StoreConfig::default())
            .unwrap()
    }

    fn written(store: &mut FastaStore) -> String {
        let mut out = Vec::new();
        store.write_to(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_get_materializes() {
        let mut store = store(">seq1|desc|{\"len\":4}\nACGT\n");
        assert_eq!(store.pending_metadata(), 1);

        let record = store.get("seq1").unwrap().unwrap();
        assert_eq!(record.sequence, "ACGT");
        assert_eq!(record.secondary_fields, vec!["desc"]);
        assert_eq!(record.metadata_field("len"), Some(&json!(4)));
        assert_eq!(store.pending_metadata(), 0);
    }

    #[test]
    fn test_get_is_idempotent() {
        let mut store = store(">seq1|{\"a\":[1,{\"b\":null}]}\nAC\n");
        let first = store.get("seq1").unwrap().cloned();
        let second = store.get("seq1").unwrap().cloned();
        assert_eq!(first, second);
    }

    #[test]
    fn test_absent_key() {
        let mut store = store(">seq1\nAC\n");
        assert!(store.get("nonexistent").unwrap().is_none());
        assert!(!store.contains_key("nonexistent"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_decode_failure_repeats() {
        let mut store = store(">bad|{oops\nAC\n>good\nGG\n");
        assert_eq!(store.len(), 2);

        let err = store.get("bad").unwrap_err();
        assert_eq!(err.code(), "FASTA_METADATA_DECODE_FAILED");
        assert!(store.get("bad").is_err());
        assert_eq!(store.peek("bad").unwrap().metadata.raw(), Some("{oops"));

        assert!(store.get("good").unwrap().is_some());
    }

    #[test]
    fn test_duplicate_keys_last_wins_first_position() {
        let mut store = store(">a|one\nAA\n>b\nCC\n>a|two\nGG\n");
        assert_eq!(store.len(), 2);
        assert_eq!(store.keys().collect::<Vec<_>>(), vec!["a", "b"]);

        let record = store.get("a").unwrap().unwrap();
        assert_eq!(record.sequence, "GG");
        assert_eq!(record.secondary_fields, vec!["two"]);
    }

    #[test]
    fn test_set_replaces_wholesale() {
        let mut store = store(">a|old|{\"k\":1}\nAA\n");
        let previous = store.set("a", Record::new("TT")).unwrap().unwrap();
        assert_eq!(previous.metadata_field("k"), Some(&json!(1)));

        let record = store.get("a").unwrap().unwrap();
        assert_eq!(record, &Record::new("TT"));
    }

    #[test]
    fn test_set_over_undecodable_fails_without_change() {
        let mut store = store(">a|{oops\nAA\n");
        assert!(store.set("a", Record::new("TT")).is_err());
        assert_eq!(store.peek("a").unwrap().sequence, "AA");
    }

    #[test]
    fn test_set_fields_from_map() {
        let mut store = store(">a|x\nAA\n");
        let fields = match json!({"seq": "CC", "score": 3}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        store.set_fields("a", fields).unwrap();
        let record = store.get("a").unwrap().unwrap();
        assert!(record.secondary_fields.is_empty());
        assert_eq!(record.metadata_field("score"), Some(&json!(3)));
    }

    #[test]
    fn test_set_field_merges_with_pending() {
        let mut store = store(">a|{\"k\":1}\nAA\n");
        store.set_field("a", "extra", json!("v")).unwrap();

        let record = store.get("a").unwrap().unwrap();
        assert_eq!(record.metadata_field("k"), Some(&json!(1)));
        assert_eq!(record.metadata_field("extra"), Some(&json!("v")));
    }

    #[test]
    fn test_set_field_creates_record() {
        let mut store = store("");
        store.set_field("new", "seq", json!("ACGT")).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("new").unwrap().unwrap().sequence, "ACGT");
    }

    #[test]
    fn test_set_field_invalid_value_does_not_create() {
        let mut store = store("");
        assert!(store.set_field("new", "seq", json!(1)).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_write_reflects_edits_and_keeps_store() {
        let mut store = store(">a|x|{\"k\":1}\nAA\n>b\nCC\n");
        store.set_field("b", "len", json!(2)).unwrap();

        let expected = ">a|x|{\"k\":1}\nAA\n>b|{\"len\":2}\nCC\n";
        assert_eq!(written(&mut store), expected);
        // Still usable after write
        assert_eq!(written(&mut store), expected);
        assert_eq!(store.get("a").unwrap().unwrap().secondary_fields, vec!["x"]);
    }

    #[test]
    fn test_write_with_decode_failure_writes_nothing() {
        let mut store = store(">a\nAA\n>b|{oops\nCC\n");
        let mut out = Vec::new();
        assert!(store.write_to(&mut out).is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn test_write_with_empty_sequence_writes_nothing() {
        let mut store = store(">a\nAA\n>b\nCC\n");
        store.set("a", Record::new("")).unwrap();
        let mut out = Vec::new();
        let err = store.write_to(&mut out).unwrap_err();
        assert_eq!(err.code(), "FASTA_INVALID_FIELD");
        assert!(out.is_empty());
    }

    #[test]
    fn test_get_mut() {
        let mut store = store(">a\nAA\n");
        store.get_mut("a").unwrap().unwrap().sequence.push('G');
        assert_eq!(store.peek("a").unwrap().sequence, "AAG");
        assert!(store.get_mut("zz").unwrap().is_none());
    }

    #[test]
    fn test_materialize_all() {
        let mut store = store(">a|{\"x\":1}\nAA\n>b|{\"y\":2}\nCC\n");
        assert_eq!(store.pending_metadata(), 2);
        store.materialize_all().unwrap();
        assert_eq!(store.pending_metadata(), 0);
    }

    #[test]
    fn test_empty_delimiter_rejected() {
        let err = FastaStore::new(StoreConfig::new(0, "")).unwrap_err();
        assert_eq!(err.code(), "FASTA_INVALID_CONFIG");
    }

    #[test]
    fn test_accessors() {
        let store = FastaStore::from_reader(
            Cursor::new(b">x|k\nAC\n".to_vec()),
            StoreConfig::new(1, "|"),
        )
        .unwrap();
        assert_eq!(store.key_index(), 1);
        assert_eq!(store.delimiter(), "|");
        assert!(store.source_path().is_none());
        assert_eq!(store.iter().next().map(|(k, _)| k), Some("k"));
    }
}
