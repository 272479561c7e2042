use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// Stable identifier of a quote.
///
/// Quotes fetched from the public API carry integer ids, quotes written by
/// the user carry generated UUIDs. Both are kept as an opaque string; integer
/// ids are normalised to their decimal form so `42` and `"42"` are the same
/// quote.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct QuoteId(String);

impl QuoteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh id for a user-authored quote.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Reads an id out of a stored value.
    ///
    /// Returns `None` for anything other than a non-empty string or an integer.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Some(Self(s.clone())),
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(Self(n.to_string())),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for QuoteId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        QuoteId::from_value(&value)
            .ok_or_else(|| D::Error::custom("quote id must be a non-empty string or an integer"))
    }
}

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QuoteId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for QuoteId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<i64> for QuoteId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

/// A quote, either fetched from the API or saved in a user's library.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Quote {
    pub id: QuoteId,
    pub text: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// User-authored notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Quote {
    pub fn new(id: impl Into<QuoteId>, text: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            author: author.into(),
            tags: None,
            notes: None,
        }
    }

    /// Creates a user-authored quote with a generated id.
    pub fn authored(text: impl Into<String>, author: impl Into<String>) -> Self {
        Self::new(QuoteId::generate(), text, author)
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Notes for display; an unsaved note reads as empty.
    pub fn notes_or_empty(&self) -> &str {
        self.notes.as_deref().unwrap_or("")
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags
            .as_ref()
            .is_some_and(|tags| tags.iter().any(|t| t.eq_ignore_ascii_case(tag)))
    }

    pub fn validate(&self) -> Result<(), QuoteError> {
        if self.id.is_empty() {
            return Err(QuoteError::EmptyId);
        }
        if self.text.trim().is_empty() {
            return Err(QuoteError::EmptyText);
        }
        if self.author.trim().is_empty() {
            return Err(QuoteError::EmptyAuthor);
        }
        Ok(())
    }

    /// Builds the stored record for this quote.
    ///
    /// The record is `{id, text, author, tags?, notes?}` with absent
    /// optionals left out, so two records for equal quotes are deep-equal.
    pub fn to_record(&self) -> Value {
        let mut record = Map::new();
        record.insert("id".to_string(), Value::String(self.id.to_string()));
        record.insert("text".to_string(), Value::String(self.text.clone()));
        record.insert("author".to_string(), Value::String(self.author.clone()));
        if let Some(tags) = &self.tags {
            let tags = tags.iter().cloned().map(Value::String).collect();
            record.insert("tags".to_string(), Value::Array(tags));
        }
        if let Some(notes) = &self.notes {
            record.insert("notes".to_string(), Value::String(notes.clone()));
        }
        Value::Object(record)
    }

    /// Reads a quote back from a stored record.
    ///
    /// Returns `None` if `id`, `text` or `author` is missing or empty.
    /// Optional fields of the wrong type are ignored rather than rejecting
    /// the whole record.
    pub fn from_record(record: &Value) -> Option<Self> {
        let fields = record.as_object()?;

        let id = fields.get("id").and_then(QuoteId::from_value)?;
        let text = non_empty_str(fields.get("text"))?;
        let author = non_empty_str(fields.get("author"))?;

        let tags = fields.get("tags").and_then(Value::as_array).map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        });
        let notes = fields
            .get("notes")
            .and_then(Value::as_str)
            .map(str::to_string);

        Some(Self {
            id,
            text: text.to_string(),
            author: author.to_string(),
            tags,
            notes,
        })
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\"{}\"", self.text)?;
        writeln!(f, "  -- {}", self.author)?;

        if let Some(tags) = &self.tags {
            if !tags.is_empty() {
                writeln!(f, "Tags: {}", tags.join(", "))?;
            }
        }

        if let Some(notes) = &self.notes {
            if !notes.is_empty() {
                writeln!(f, "\nNotes:\n{}", notes)?;
            }
        }

        Ok(())
    }
}

/// Response body of the random quote API.
///
/// The API calls the quote body `quote`; it becomes `Quote::text`.
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteWire {
    pub id: QuoteId,
    #[serde(rename = "quote")]
    pub text: String,
    pub author: String,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl From<QuoteWire> for Quote {
    fn from(wire: QuoteWire) -> Self {
        Self {
            id: wire.id,
            text: wire.text,
            author: wire.author,
            tags: wire.tags,
            notes: None,
        }
    }
}

/// Reasons a quote cannot be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuoteError {
    EmptyId,
    EmptyText,
    EmptyAuthor,
    /// Id that cannot name a document in the sub-document layout
    UnusableId(String),
}

impl fmt::Display for QuoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuoteError::EmptyId => write!(f, "quote id must not be empty"),
            QuoteError::EmptyText => write!(f, "quote text must not be empty"),
            QuoteError::EmptyAuthor => write!(f, "quote author must not be empty"),
            QuoteError::UnusableId(id) => {
                write!(f, "quote id '{}' cannot be used as a document key", id)
            }
        }
    }
}

impl std::error::Error for QuoteError {}
