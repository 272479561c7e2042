//! File-backed document store.
//!
//! Each document is a JSON object on disk, laid out by path:
//!
//! ```text
//! <DATA_DIR>/
//!   users/
//!     <uid>.json              # users/<uid>
//!     <uid>/
//!       quotes/
//!         <quote-id>.json     # users/<uid>/quotes/<quote-id>
//! ```
//!
//! Writes go to a temporary file that is renamed into place, so readers
//! never see a partial document. Mutations are serialised by a store-wide
//! lock, which makes each single-document update atomic.

use async_trait::async_trait;
use serde_json::Value;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

use super::{
    apply_mutation, DocumentPath, DocumentStore, FieldMutation, Fields, Snapshot, StoreError,
    StoredDocument,
};

const EXTENSION: &str = "json";

#[derive(Debug)]
pub struct FileStore {
    data_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Returns the file holding a document.
    pub fn file_path(&self, path: &DocumentPath) -> PathBuf {
        let dir = match path.parent() {
            Some(parent) => self.collection_dir(&parent),
            None => self.data_dir.clone(),
        };
        dir.join(format!("{}.{}", path.id(), EXTENSION))
    }

    fn collection_dir(&self, path: &DocumentPath) -> PathBuf {
        path.segments()
            .iter()
            .fold(self.data_dir.clone(), |dir, segment| dir.join(segment))
    }

    async fn read(&self, file: &Path) -> Result<Option<Fields>, StoreError> {
        match fs::read(file).await {
            Ok(bytes) => parse_fields(file, &bytes).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::IoError(file.to_path_buf(), e)),
        }
    }

    async fn write(&self, file: &Path, fields: &Fields) -> Result<(), StoreError> {
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::IoError(parent.to_path_buf(), e))?;
        }

        let bytes = serde_json::to_vec_pretty(fields)
            .map_err(|e| StoreError::Corrupt(file.to_path_buf(), e.to_string()))?;

        // Dot-prefixed temp name can never collide with a valid segment
        let tmp = file.with_file_name(format!(
            ".{}.tmp",
            file.file_name().and_then(|n| n.to_str()).unwrap_or("doc")
        ));
        fs::write(&tmp, bytes)
            .await
            .map_err(|e| StoreError::IoError(tmp.clone(), e))?;
        fs::rename(&tmp, file)
            .await
            .map_err(|e| StoreError::IoError(file.to_path_buf(), e))?;

        Ok(())
    }
}

fn parse_fields(file: &Path, bytes: &[u8]) -> Result<Fields, StoreError> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(StoreError::Corrupt(
            file.to_path_buf(),
            "document is not a JSON object".to_string(),
        )),
        Err(e) => Err(StoreError::Corrupt(file.to_path_buf(), e.to_string())),
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn get_document(&self, path: &DocumentPath) -> Result<Snapshot, StoreError> {
        let file = self.file_path(path);
        Ok(match self.read(&file).await? {
            Some(fields) => Snapshot::found(fields),
            None => Snapshot::missing(),
        })
    }

    async fn set_document(&self, path: &DocumentPath, fields: Fields) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.write(&self.file_path(path), &fields).await
    }

    async fn update_field(
        &self,
        path: &DocumentPath,
        field: &str,
        mutation: FieldMutation,
    ) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let file = self.file_path(path);
        let mut fields = self
            .read(&file)
            .await?
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;

        if apply_mutation(&mut fields, field, &mutation) {
            self.write(&file, &fields).await?;
        }
        Ok(())
    }

    async fn delete_document(&self, path: &DocumentPath) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let file = self.file_path(path);
        match fs::remove_file(&file).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::IoError(file, e)),
        }
    }

    async fn list_documents(
        &self,
        collection: &DocumentPath,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let dir = self.collection_dir(collection);

        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::IoError(dir, e)),
        };

        let mut documents = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::IoError(dir.clone(), e))?
        {
            let file = entry.path();
            if file.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(id) = file.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if id.starts_with('.') {
                continue;
            }

            // A document removed between listing and reading is skipped
            if let Some(fields) = self.read(&file).await? {
                documents.push(StoredDocument {
                    id: id.to_string(),
                    fields,
                });
            }
        }

        documents.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn test_store() -> (FileStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().join("docs"));
        (store, temp_dir)
    }

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_file_path_layout() {
        let (store, _temp) = test_store();
        let path = DocumentPath::parse("users/u1").unwrap();
        assert!(store.file_path(&path).ends_with("docs/users/u1.json"));

        let path = DocumentPath::parse("users/u1/quotes/42").unwrap();
        assert!(store
            .file_path(&path)
            .ends_with("docs/users/u1/quotes/42.json"));
    }

    #[tokio::test]
    async fn test_get_missing_returns_not_exists() {
        let (store, _temp) = test_store();
        let snapshot = store
            .get_document(&DocumentPath::user("u1").unwrap())
            .await
            .unwrap();
        assert!(!snapshot.exists);
    }

    #[tokio::test]
    async fn test_set_and_get_roundtrip() {
        let (store, _temp) = test_store();
        let path = DocumentPath::user("u1").unwrap();

        store
            .set_document(&path, fields(json!({"quotes": [{"id": "1"}]})))
            .await
            .unwrap();

        let snapshot = store.get_document(&path).await.unwrap();
        assert!(snapshot.exists);
        assert_eq!(snapshot.field("quotes"), Some(&json!([{"id": "1"}])));
    }

    #[tokio::test]
    async fn test_update_field_persists() {
        let (store, _temp) = test_store();
        let path = DocumentPath::user("u1").unwrap();
        store.set_document(&path, Fields::new()).await.unwrap();

        store
            .update_field(&path, "quotes", FieldMutation::AppendIfAbsent(json!("a")))
            .await
            .unwrap();
        store
            .update_field(&path, "quotes", FieldMutation::AppendIfAbsent(json!("b")))
            .await
            .unwrap();
        store
            .update_field(&path, "quotes", FieldMutation::RemoveExact(json!("a")))
            .await
            .unwrap();

        // Reopen to make sure it hit disk
        let reopened = FileStore::new(store.data_dir().to_path_buf());
        let snapshot = reopened.get_document(&path).await.unwrap();
        assert_eq!(snapshot.field("quotes"), Some(&json!(["b"])));
    }

    #[tokio::test]
    async fn test_update_missing_document_fails() {
        let (store, _temp) = test_store();
        let result = store
            .update_field(
                &DocumentPath::user("u1").unwrap(),
                "quotes",
                FieldMutation::AppendIfAbsent(json!(1)),
            )
            .await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_corrupt_document() {
        let (store, _temp) = test_store();
        let path = DocumentPath::user("u1").unwrap();
        let file = store.file_path(&path);
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(&file, b"[1, 2, 3]").unwrap();

        let result = store.get_document(&path).await;
        assert!(matches!(result, Err(StoreError::Corrupt(_, _))));
    }

    #[tokio::test]
    async fn test_list_and_delete_sub_documents() {
        let (store, _temp) = test_store();
        let quotes = DocumentPath::user_quotes("u1").unwrap();

        for id in ["b", "a"] {
            store
                .set_document(&quotes.child(id).unwrap(), fields(json!({"id": id})))
                .await
                .unwrap();
        }
        // The parent document must not show up in its own sub-collection
        store
            .set_document(&DocumentPath::user("u1").unwrap(), Fields::new())
            .await
            .unwrap();

        let listed = store.list_documents(&quotes).await.unwrap();
        let ids: Vec<&str> = listed.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        store
            .delete_document(&quotes.child("a").unwrap())
            .await
            .unwrap();
        store
            .delete_document(&quotes.child("a").unwrap())
            .await
            .unwrap();

        let listed = store.list_documents(&quotes).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "b");
    }

    #[tokio::test]
    async fn test_list_missing_collection_is_empty() {
        let (store, _temp) = test_store();
        let listed = store
            .list_documents(&DocumentPath::user_quotes("nobody").unwrap())
            .await
            .unwrap();
        assert!(listed.is_empty());
    }
}
