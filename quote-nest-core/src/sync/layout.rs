//! Storage layouts and the decoded shape of a user's saved quotes.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::store::{Snapshot, StoredDocument};

/// Field of the user document holding the embedded quote array.
pub const QUOTES_FIELD: &str = "quotes";

/// Where a user's saved quotes live.
///
/// The layout also fixes how a quote is removed: from the embedded array
/// by exact stored value, or by deleting the sub-document keyed by its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageLayout {
    /// `users/{uid}` with an array field `quotes`
    #[default]
    Embedded,
    /// One document per quote at `users/{uid}/quotes/{id}`
    #[serde(alias = "sub-documents")]
    SubDocuments,
}

impl fmt::Display for StorageLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageLayout::Embedded => write!(f, "embedded"),
            StorageLayout::SubDocuments => write!(f, "subdocuments"),
        }
    }
}

impl FromStr for StorageLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "embedded" => Ok(StorageLayout::Embedded),
            "subdocuments" | "sub-documents" => Ok(StorageLayout::SubDocuments),
            other => Err(format!(
                "Unknown storage layout '{}'. Use 'embedded' or 'subdocuments'.",
                other
            )),
        }
    }
}

/// What the store currently holds for one user, decoded once per operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentShape {
    /// The user document does not exist yet
    Absent,
    /// Nothing saved: no array, an empty array, a non-array `quotes` field,
    /// or an empty sub-collection
    Empty,
    /// Embedded array with at least one element, as stored
    LegacyArray(Vec<Value>),
    /// At least one per-quote sub-document
    SubDocuments(Vec<StoredDocument>),
}

impl DocumentShape {
    /// Decodes the user document of the embedded layout.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        if !snapshot.exists {
            return DocumentShape::Absent;
        }

        let mut fields = snapshot.fields;
        match fields.remove(QUOTES_FIELD) {
            Some(Value::Array(records)) if !records.is_empty() => {
                DocumentShape::LegacyArray(records)
            }
            _ => DocumentShape::Empty,
        }
    }

    /// Decodes a listing of the sub-document layout.
    pub fn from_listing(documents: Vec<StoredDocument>) -> Self {
        if documents.is_empty() {
            DocumentShape::Empty
        } else {
            DocumentShape::SubDocuments(documents)
        }
    }

    /// Flattens the shape into stored records.
    ///
    /// A sub-document without an `id` field takes its key as the id.
    pub fn into_records(self) -> Vec<Value> {
        match self {
            DocumentShape::Absent | DocumentShape::Empty => Vec::new(),
            DocumentShape::LegacyArray(records) => records,
            DocumentShape::SubDocuments(documents) => documents
                .into_iter()
                .map(|doc| {
                    let mut fields = doc.fields;
                    fields
                        .entry("id".to_string())
                        .or_insert_with(|| Value::String(doc.id));
                    Value::Object(fields)
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Fields;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_layout_parse_and_display() {
        assert_eq!(
            "embedded".parse::<StorageLayout>().unwrap(),
            StorageLayout::Embedded
        );
        assert_eq!(
            "SubDocuments".parse::<StorageLayout>().unwrap(),
            StorageLayout::SubDocuments
        );
        assert!("flat".parse::<StorageLayout>().is_err());
        assert_eq!(StorageLayout::SubDocuments.to_string(), "subdocuments");
        assert_eq!(StorageLayout::default(), StorageLayout::Embedded);
    }

    #[test]
    fn test_layout_spellings_agree_with_serde() {
        for spelling in ["embedded", "subdocuments", "sub-documents"] {
            let parsed: StorageLayout = spelling.parse().unwrap();
            let decoded: StorageLayout =
                serde_json::from_value(Value::String(spelling.to_string())).unwrap();
            assert_eq!(parsed, decoded, "{}", spelling);
        }
        assert_eq!(
            serde_json::to_value(StorageLayout::SubDocuments).unwrap(),
            json!("subdocuments")
        );
    }

    #[test]
    fn test_shape_from_snapshot() {
        assert_eq!(
            DocumentShape::from_snapshot(Snapshot::missing()),
            DocumentShape::Absent
        );
        assert_eq!(
            DocumentShape::from_snapshot(Snapshot::found(fields(json!({"name": "x"})))),
            DocumentShape::Empty
        );
        assert_eq!(
            DocumentShape::from_snapshot(Snapshot::found(fields(json!({"quotes": []})))),
            DocumentShape::Empty
        );
        assert_eq!(
            DocumentShape::from_snapshot(Snapshot::found(fields(json!({"quotes": {"id": 1}})))),
            DocumentShape::Empty
        );
        assert_eq!(
            DocumentShape::from_snapshot(Snapshot::found(fields(json!({"quotes": [1]})))),
            DocumentShape::LegacyArray(vec![json!(1)])
        );
    }

    #[test]
    fn test_shape_from_listing() {
        assert_eq!(DocumentShape::from_listing(Vec::new()), DocumentShape::Empty);

        let shape = DocumentShape::from_listing(vec![StoredDocument {
            id: "7".to_string(),
            fields: fields(json!({"text": "A", "author": "X"})),
        }]);
        assert_eq!(
            shape.into_records(),
            vec![json!({"id": "7", "text": "A", "author": "X"})]
        );
    }

    #[test]
    fn test_sub_document_keeps_own_id() {
        let shape = DocumentShape::SubDocuments(vec![StoredDocument {
            id: "key".to_string(),
            fields: fields(json!({"id": 7})),
        }]);
        assert_eq!(shape.into_records(), vec![json!({"id": 7})]);
    }
}
