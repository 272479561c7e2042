//! Quote sync engine.
//!
//! Keeps a user's saved quotes in the document store. The engine holds no
//! copy of the collection: every operation re-reads the store, decodes what
//! it finds into a [`DocumentShape`], and issues the writes that shape
//! calls for.
//!
//! # Replacing a quote in the embedded array
//!
//! The store can only append a value if absent and remove a value by deep
//! equality. Updating a quote is therefore:
//!
//! 1. read the user document
//! 2. find the stored literal(s) with the same id
//! 3. remove each literal exactly as stored
//! 4. append the new record
//!
//! Step 3 always precedes step 4; appending first could leave both
//! versions in the array. If the append fails after the remove succeeded,
//! the quote is missing until the caller retries the save.

use serde_json::Value;
use std::sync::Arc;

use super::error::SyncError;
use super::layout::{DocumentShape, StorageLayout, QUOTES_FIELD};
use crate::models::{Quote, QuoteError, QuoteId};
use crate::policy;
use crate::session::{Principal, SessionGate};
use crate::store::{DocumentPath, DocumentStore, FieldMutation, Fields};

/// Saves, fetches and deletes a signed-in user's quotes.
pub struct QuoteSync {
    gate: Arc<dyn SessionGate>,
    store: Arc<dyn DocumentStore>,
    layout: StorageLayout,
}

impl QuoteSync {
    /// Creates an engine using the embedded-array layout.
    pub fn new(gate: Arc<dyn SessionGate>, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            gate,
            store,
            layout: StorageLayout::Embedded,
        }
    }

    pub fn with_layout(mut self, layout: StorageLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn layout(&self) -> StorageLayout {
        self.layout
    }

    /// Saves a quote, replacing any saved quote with the same id.
    pub async fn save_quote(&self, quote: &Quote) -> Result<(), SyncError> {
        let principal = self.principal()?;
        quote.validate()?;

        let record = quote.to_record();
        if self.layout == StorageLayout::SubDocuments {
            let path = quote_path(&principal, &quote.id)?;
            return self.put_sub_document(&principal, &path, record).await;
        }

        match self.load_shape(&principal).await? {
            DocumentShape::Absent => self.create_user_document(&principal, record).await,
            DocumentShape::LegacyArray(records) => {
                self.replace_in_array(&principal, &quote.id, &records, record)
                    .await
            }
            DocumentShape::Empty | DocumentShape::SubDocuments(_) => {
                self.append(&principal, record).await
            }
        }
    }

    /// Fetches every saved quote.
    ///
    /// A user with nothing saved gets an empty list. Stored records missing
    /// `id`, `text` or `author` are skipped. Order is whatever the store
    /// returns.
    pub async fn fetch_saved_quotes(&self) -> Result<Vec<Quote>, SyncError> {
        let principal = self.principal()?;

        let records = self.load_shape(&principal).await?.into_records();
        let total = records.len();

        let quotes: Vec<Quote> = records
            .iter()
            .filter_map(|record| {
                let quote = Quote::from_record(record);
                if quote.is_none() {
                    tracing::debug!(uid = %principal.uid, record = %record, "skipping malformed quote record");
                }
                quote
            })
            .collect();

        if quotes.len() < total {
            tracing::warn!(
                uid = %principal.uid,
                skipped = total - quotes.len(),
                "some saved quotes could not be decoded"
            );
        }

        Ok(quotes)
    }

    /// Deletes the saved quote with the given id.
    ///
    /// Returns false if no such quote was saved.
    pub async fn delete_quote(&self, id: &QuoteId) -> Result<bool, SyncError> {
        let principal = self.principal()?;

        if self.layout == StorageLayout::SubDocuments {
            let path = quote_path(&principal, id)?;
            if !self.store.get_document(&path).await?.exists {
                return Ok(false);
            }
            self.store.delete_document(&path).await?;
            tracing::info!(uid = %principal.uid, quote_id = %id, "deleted quote");
            return Ok(true);
        }

        match self.load_shape(&principal).await? {
            DocumentShape::Absent | DocumentShape::Empty => Ok(false),
            DocumentShape::LegacyArray(records) => {
                let stale = policy::find_stored(&records, id);
                if stale.is_empty() {
                    return Ok(false);
                }
                let path = DocumentPath::user(&principal.uid)?;
                for literal in stale {
                    self.store
                        .update_field(&path, QUOTES_FIELD, FieldMutation::RemoveExact(literal.clone()))
                        .await?;
                }
                tracing::info!(uid = %principal.uid, quote_id = %id, "deleted quote");
                Ok(true)
            }
            DocumentShape::SubDocuments(_) => Ok(false),
        }
    }

    /// Looks up one saved quote by id.
    pub async fn find_saved_quote(&self, id: &QuoteId) -> Result<Option<Quote>, SyncError> {
        let quotes = self.fetch_saved_quotes().await?;
        Ok(quotes.into_iter().find(|q| &q.id == id))
    }

    /// Saves the quote with new notes and returns the saved copy.
    pub async fn update_notes(
        &self,
        quote: &Quote,
        notes: impl Into<String>,
    ) -> Result<Quote, SyncError> {
        let updated = quote.clone().with_notes(notes);
        self.save_quote(&updated).await?;
        Ok(updated)
    }

    fn principal(&self) -> Result<Principal, SyncError> {
        self.gate.current_principal().ok_or_else(|| {
            tracing::debug!("no principal, refusing sync operation");
            SyncError::Unauthenticated
        })
    }

    async fn load_shape(&self, principal: &Principal) -> Result<DocumentShape, SyncError> {
        match self.layout {
            StorageLayout::Embedded => {
                let path = DocumentPath::user(&principal.uid)?;
                let snapshot = self.store.get_document(&path).await?;
                Ok(DocumentShape::from_snapshot(snapshot))
            }
            StorageLayout::SubDocuments => {
                let collection = DocumentPath::user_quotes(&principal.uid)?;
                let documents = self.store.list_documents(&collection).await?;
                Ok(DocumentShape::from_listing(documents))
            }
        }
    }

    async fn create_user_document(
        &self,
        principal: &Principal,
        record: Value,
    ) -> Result<(), SyncError> {
        let path = DocumentPath::user(&principal.uid)?;
        let mut fields = Fields::new();
        fields.insert(QUOTES_FIELD.to_string(), Value::Array(vec![record]));

        self.store.set_document(&path, fields).await?;
        tracing::info!(uid = %principal.uid, "created user document with first quote");
        Ok(())
    }

    async fn append(&self, principal: &Principal, record: Value) -> Result<(), SyncError> {
        let path = DocumentPath::user(&principal.uid)?;
        self.store
            .update_field(&path, QUOTES_FIELD, FieldMutation::AppendIfAbsent(record))
            .await?;
        tracing::debug!(uid = %principal.uid, "appended quote");
        Ok(())
    }

    async fn replace_in_array(
        &self,
        principal: &Principal,
        id: &QuoteId,
        records: &[Value],
        record: Value,
    ) -> Result<(), SyncError> {
        let stale = policy::find_stored(records, id);

        if let [only] = stale.as_slice() {
            if **only == record {
                tracing::debug!(uid = %principal.uid, quote_id = %id, "quote unchanged, skipping write");
                return Ok(());
            }
        }

        let path = DocumentPath::user(&principal.uid)?;
        for literal in &stale {
            self.store
                .update_field(
                    &path,
                    QUOTES_FIELD,
                    FieldMutation::RemoveExact((*literal).clone()),
                )
                .await?;
        }

        self.append(principal, record).await.inspect_err(|e| {
            if !stale.is_empty() {
                tracing::warn!(
                    uid = %principal.uid,
                    quote_id = %id,
                    err = %e,
                    "old quote removed but new one not added; retry the save"
                );
            }
        })?;

        if !stale.is_empty() {
            tracing::info!(uid = %principal.uid, quote_id = %id, replaced = stale.len(), "updated quote");
        }
        Ok(())
    }

    /// Writes one quote document unless it already holds exactly `record`.
    async fn put_sub_document(
        &self,
        principal: &Principal,
        path: &DocumentPath,
        record: Value,
    ) -> Result<(), SyncError> {
        let Value::Object(fields) = record else {
            return Ok(());
        };

        let snapshot = self.store.get_document(path).await?;
        if snapshot.exists && snapshot.fields == fields {
            tracing::debug!(uid = %principal.uid, quote_id = %path.id(), "quote unchanged, skipping write");
            return Ok(());
        }

        self.store.set_document(path, fields).await?;
        tracing::debug!(uid = %principal.uid, quote_id = %path.id(), "wrote quote document");
        Ok(())
    }
}

/// Path of one quote document. Ids that cannot be a path segment (such as
/// `a/b` or `.x`) are rejected as invalid quotes before any store call.
fn quote_path(principal: &Principal, id: &QuoteId) -> Result<DocumentPath, SyncError> {
    DocumentPath::user_quotes(&principal.uid)?
        .child(id.as_str())
        .map_err(|_| SyncError::InvalidQuote(QuoteError::UnusableId(id.to_string())))
}
