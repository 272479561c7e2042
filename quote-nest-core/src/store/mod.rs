//! Document store adapter.
//!
//! The sync engine talks to its backing store only through the
//! [`DocumentStore`] trait, which mirrors what a hosted document database
//! offers:
//!
//! - read a whole document (`get_document`)
//! - replace or create a whole document (`set_document`)
//! - mutate one array field by value (`update_field` with [`FieldMutation`])
//! - delete a document and list a collection (used by the sub-document layout)
//!
//! There is deliberately no "find element by id and replace" primitive.
//!
//! # Implementations
//!
//! - [`MemoryStore`]: in-process, with call counters and failure injection
//! - [`FileStore`]: one JSON file per document under a data directory
//! - [`crate::remote::HttpStore`]: REST client for `quotenest-server`

mod file;
mod memory;
mod mutation;
mod path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io;
use std::path::PathBuf;

pub use file::FileStore;
pub use memory::{MemoryStore, StoreOp};
pub use mutation::{apply_mutation, FieldMutation};
pub use path::{DocumentPath, QUOTES_COLLECTION, USERS_COLLECTION};

/// Top-level fields of a document.
pub type Fields = Map<String, Value>;

/// Result of reading a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub exists: bool,
    #[serde(default)]
    pub fields: Fields,
}

impl Snapshot {
    pub fn missing() -> Self {
        Self::default()
    }

    pub fn found(fields: Fields) -> Self {
        Self {
            exists: true,
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// A document returned from a collection listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    /// Document id within the collection
    pub id: String,
    pub fields: Fields,
}

/// Operations offered by a per-user document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads a document. A missing document is `Ok` with `exists == false`.
    async fn get_document(&self, path: &DocumentPath) -> Result<Snapshot, StoreError>;

    /// Creates or fully replaces a document.
    async fn set_document(&self, path: &DocumentPath, fields: Fields) -> Result<(), StoreError>;

    /// Mutates one array field of an existing document.
    ///
    /// Fails with [`StoreError::NotFound`] if the document does not exist.
    async fn update_field(
        &self,
        path: &DocumentPath,
        field: &str,
        mutation: FieldMutation,
    ) -> Result<(), StoreError>;

    /// Deletes a document. Deleting a missing document succeeds.
    async fn delete_document(&self, path: &DocumentPath) -> Result<(), StoreError>;

    /// Lists the documents directly inside a collection.
    async fn list_documents(
        &self,
        collection: &DocumentPath,
    ) -> Result<Vec<StoredDocument>, StoreError>;
}

/// Errors that can occur during document store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Transport or server failure
    Unavailable(String),
    /// Field update on a document that does not exist
    NotFound(String),
    /// Path segment that is empty or could escape the store root
    InvalidPath(String),
    /// Store refused access to the path
    PermissionDenied(String),
    /// I/O error reading or writing a document file
    IoError(PathBuf, io::Error),
    /// Document file that is not a JSON object
    Corrupt(PathBuf, String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Unavailable(e) => write!(f, "Store unavailable: {}", e),
            StoreError::NotFound(path) => write!(f, "Document not found: {}", path),
            StoreError::InvalidPath(segment) => write!(f, "Invalid document path: {}", segment),
            StoreError::PermissionDenied(path) => write!(f, "Permission denied: {}", path),
            StoreError::IoError(path, e) => {
                write!(f, "I/O error for {}: {}", path.display(), e)
            }
            StoreError::Corrupt(path, e) => {
                write!(f, "Corrupt document {}: {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::IoError(_, e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot_wire_format() {
        let snapshot = Snapshot::found(json!({"quotes": []}).as_object().cloned().unwrap());
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json, json!({"exists": true, "fields": {"quotes": []}}));

        let missing: Snapshot = serde_json::from_value(json!({"exists": false})).unwrap();
        assert_eq!(missing, Snapshot::missing());
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::NotFound("users/u1".to_string());
        assert_eq!(err.to_string(), "Document not found: users/u1");

        let err = StoreError::Unavailable("connection reset".to_string());
        assert!(err.to_string().contains("connection reset"));
    }
}
