//! In-process document store.
//!
//! Counts every call per operation and can be told to fail a specific call,
//! which makes it the test double for the sync engine.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};

use super::{
    apply_mutation, DocumentPath, DocumentStore, FieldMutation, Fields, Snapshot, StoreError,
    StoredDocument,
};

/// Store operations, for call counting and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Get,
    Set,
    Update,
    Delete,
    List,
}

impl StoreOp {
    const ALL: [StoreOp; 5] = [
        StoreOp::Get,
        StoreOp::Set,
        StoreOp::Update,
        StoreOp::Delete,
        StoreOp::List,
    ];

    fn index(self) -> usize {
        match self {
            StoreOp::Get => 0,
            StoreOp::Set => 1,
            StoreOp::Update => 2,
            StoreOp::Delete => 3,
            StoreOp::List => 4,
        }
    }
}

/// A scheduled failure: the `nth` call (0-based) of `op` fails.
#[derive(Debug, Clone, Copy)]
struct PlannedFailure {
    op: StoreOp,
    nth: usize,
}

/// Thread-safe in-memory document store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<BTreeMap<DocumentPath, Fields>>,
    calls: [AtomicUsize; 5],
    failures: Mutex<Vec<PlannedFailure>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a document without counting a call.
    pub fn insert(&self, path: DocumentPath, fields: Fields) {
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path, fields);
    }

    /// Reads a document without counting a call.
    pub fn document(&self, path: &DocumentPath) -> Option<Fields> {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
    }

    /// Number of calls made to `op` so far, failed ones included.
    pub fn calls(&self, op: StoreOp) -> usize {
        self.calls[op.index()].load(Ordering::SeqCst)
    }

    /// Number of calls made to any operation.
    pub fn total_calls(&self) -> usize {
        StoreOp::ALL.iter().map(|op| self.calls(*op)).sum()
    }

    /// Makes the `nth` call (0-based, counted from store creation) of `op`
    /// fail with [`StoreError::Unavailable`].
    pub fn fail_on(&self, op: StoreOp, nth: usize) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(PlannedFailure { op, nth });
    }

    /// Counts the call and returns the injected failure, if one is due.
    fn record(&self, op: StoreOp) -> Result<(), StoreError> {
        let nth = self.calls[op.index()].fetch_add(1, Ordering::SeqCst);

        let mut failures = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pos) = failures.iter().position(|f| f.op == op && f.nth == nth) {
            failures.remove(pos);
            return Err(StoreError::Unavailable(format!(
                "injected failure on {:?} call {}",
                op, nth
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_document(&self, path: &DocumentPath) -> Result<Snapshot, StoreError> {
        self.record(StoreOp::Get)?;
        Ok(match self.document(path) {
            Some(fields) => Snapshot::found(fields),
            None => Snapshot::missing(),
        })
    }

    async fn set_document(&self, path: &DocumentPath, fields: Fields) -> Result<(), StoreError> {
        self.record(StoreOp::Set)?;
        self.insert(path.clone(), fields);
        Ok(())
    }

    async fn update_field(
        &self,
        path: &DocumentPath,
        field: &str,
        mutation: FieldMutation,
    ) -> Result<(), StoreError> {
        self.record(StoreOp::Update)?;

        let mut documents = self
            .documents
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let fields = documents
            .get_mut(path)
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        apply_mutation(fields, field, &mutation);
        Ok(())
    }

    async fn delete_document(&self, path: &DocumentPath) -> Result<(), StoreError> {
        self.record(StoreOp::Delete)?;
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(path);
        Ok(())
    }

    async fn list_documents(
        &self,
        collection: &DocumentPath,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        self.record(StoreOp::List)?;

        let documents = self
            .documents
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(documents
            .iter()
            .filter(|(path, _)| path.parent().as_ref() == Some(collection))
            .map(|(path, fields)| StoredDocument {
                id: path.id().to_string(),
                fields: fields.clone(),
            })
            .collect())
    }
}
