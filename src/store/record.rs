//! Record types for the FASTA record store
//!
//! A record is one header/sequence pair with the primary key taken out:
//!
//! ```text
//! >key|secondary_0|secondary_1|{"metadata":"json"}
//! SEQUENCE
//! ```
//!
//! Metadata is held as an explicit two-state value. Parsing captures the raw
//! JSON token as [`Metadata::Pending`]; the first structured access decodes it
//! into [`Metadata::Materialized`]. A failed decode leaves it pending.

use serde_json::{Map, Value};

use super::errors::{StoreError, StoreResult};

/// Flat field name that maps to [`Record::sequence`]
pub const SEQUENCE_FIELD: &str = "seq";

/// Flat field name that maps to [`Record::secondary_fields`]
pub const DELIMITED_FIELD: &str = "delimited";

/// Structured metadata attached to a record
#[derive(Debug, Clone, PartialEq)]
pub enum Metadata {
    /// Raw JSON text captured at parse time, not yet decoded
    Pending(String),
    /// Decoded top-level fields
    Materialized(Map<String, Value>),
}

impl Default for Metadata {
    fn default() -> Self {
        Metadata::Materialized(Map::new())
    }
}

impl Metadata {
    /// Returns whether the metadata still holds undecoded JSON
    pub fn is_pending(&self) -> bool {
        matches!(self, Metadata::Pending(_))
    }

    /// Returns the raw JSON if still pending
    pub fn raw(&self) -> Option<&str> {
        match self {
            Metadata::Pending(raw) => Some(raw.as_str()),
            Metadata::Materialized(_) => None,
        }
    }

    /// Returns the decoded fields, or `None` while pending
    pub fn fields(&self) -> Option<&Map<String, Value>> {
        match self {
            Metadata::Pending(_) => None,
            Metadata::Materialized(fields) => Some(fields),
        }
    }

    /// Decodes pending JSON in place.
    ///
    /// Returns `Ok(true)` if a decode happened, `Ok(false)` if the metadata was
    /// already materialized. On error the raw text is kept, so the next call
    /// fails the same way.
    pub fn materialize(&mut self) -> Result<bool, serde_json::Error> {
        let fields = match self {
            Metadata::Materialized(_) => return Ok(false),
            Metadata::Pending(raw) => serde_json::from_str::<Map<String, Value>>(raw)?,
        };
        *self = Metadata::Materialized(fields);
        Ok(true)
    }
}

/// One FASTA entry, keyed externally by its primary key
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    /// Raw sequence line, never validated
    pub sequence: String,
    /// Header tokens other than the primary key and the metadata token, in order
    pub secondary_fields: Vec<String>,
    /// Embedded JSON metadata
    pub metadata: Metadata,
}

impl Record {
    /// Create a record with a sequence and nothing else
    pub fn new(sequence: impl Into<String>) -> Self {
        Self {
            sequence: sequence.into(),
            ..Default::default()
        }
    }

    /// Set the secondary fields
    pub fn with_secondary_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.secondary_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the metadata with already-decoded fields
    pub fn with_metadata(mut self, fields: Map<String, Value>) -> Self {
        self.metadata = Metadata::Materialized(fields);
        self
    }

    /// Attach raw, undecoded metadata JSON
    pub fn with_pending_metadata(mut self, raw: impl Into<String>) -> Self {
        self.metadata = Metadata::Pending(raw.into());
        self
    }

    /// Build a record from a flat field mapping.
    ///
    /// `seq` is required and must be a string. `delimited`, if present, must be
    /// an array. Every other entry becomes a metadata field.
    pub fn from_flat_map(mut fields: Map<String, Value>) -> StoreResult<Self> {
        let sequence = match fields.remove(SEQUENCE_FIELD) {
            Some(value) => sequence_from_value(value)?,
            None => return Err(StoreError::invalid_field(SEQUENCE_FIELD, "field is required")),
        };
        let secondary_fields = match fields.remove(DELIMITED_FIELD) {
            Some(value) => tokens_from_value(value)?,
            None => Vec::new(),
        };
        Ok(Self {
            sequence,
            secondary_fields,
            metadata: Metadata::Materialized(fields),
        })
    }

    /// Returns the record as one flat attribute mapping.
    ///
    /// `delimited` is omitted when there are no secondary fields. Pending
    /// metadata contributes nothing. Reserved names win over metadata keys of
    /// the same name.
    pub fn to_flat_map(&self) -> Map<String, Value> {
        let mut flat = self.metadata.fields().cloned().unwrap_or_default();
        flat.insert(SEQUENCE_FIELD.to_string(), Value::String(self.sequence.clone()));
        if !self.secondary_fields.is_empty() {
            let tokens = self
                .secondary_fields
                .iter()
                .cloned()
                .map(Value::String)
                .collect();
            flat.insert(DELIMITED_FIELD.to_string(), Value::Array(tokens));
        }
        flat
    }

    /// Returns a decoded metadata field. Always `None` while metadata is pending.
    pub fn metadata_field(&self, name: &str) -> Option<&Value> {
        self.metadata.fields().and_then(|fields| fields.get(name))
    }

    /// Returns whether there is decoded metadata to write
    pub fn has_metadata(&self) -> bool {
        self.metadata.fields().is_some_and(|fields| !fields.is_empty())
    }

    /// Decode pending metadata in place. See [`Metadata::materialize`].
    pub fn materialize(&mut self) -> Result<bool, serde_json::Error> {
        self.metadata.materialize()
    }

    /// Set a single flat field, returning the value it replaced.
    ///
    /// `seq` and `delimited` address the sequence and secondary fields; any
    /// other name is a metadata field. Metadata must be materialized first,
    /// otherwise the raw JSON would be clobbered.
    pub fn set_field(&mut self, name: &str, value: Value) -> StoreResult<Option<Value>> {
        match name {
            SEQUENCE_FIELD => {
                let sequence = sequence_from_value(value)?;
                let previous = std::mem::replace(&mut self.sequence, sequence);
                Ok(Some(Value::String(previous)))
            }
            DELIMITED_FIELD => {
                let tokens = tokens_from_value(value)?;
                let previous = std::mem::replace(&mut self.secondary_fields, tokens);
                Ok((!previous.is_empty())
                    .then(|| Value::Array(previous.into_iter().map(Value::String).collect())))
            }
            _ => match &mut self.metadata {
                Metadata::Pending(_) => Err(StoreError::invalid_field(
                    name,
                    "metadata has not been decoded yet",
                )),
                Metadata::Materialized(fields) => Ok(fields.insert(name.to_string(), value)),
            },
        }
    }
}

fn sequence_from_value(value: Value) -> StoreResult<String> {
    match value {
        Value::String(sequence) => Ok(sequence),
        other => Err(StoreError::invalid_field(
            SEQUENCE_FIELD,
            format!("expected a string, got {}", other),
        )),
    }
}

/// Header tokens are text; non-string items keep their JSON rendering.
fn tokens_from_value(value: Value) -> StoreResult<Vec<String>> {
    match value {
        Value::Array(items) => Ok(items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect()),
        other => Err(StoreError::invalid_field(
            DELIMITED_FIELD,
            format!("expected an array, got {}", other),
        )),
    }
}
