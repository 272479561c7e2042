//! QuoteNest Core Library
//!
//! Quote model, document store adapters and the sync engine that keeps a
//! user's saved quotes in a hosted document store.

pub mod models;
pub mod policy;
pub mod remote;
pub mod session;
pub mod store;
pub mod sync;

pub use models::{Quote, QuoteError, QuoteFilter, QuoteId, QuoteWire};
pub use remote::{HttpAuth, HttpStore, QuoteApi, QuoteApiError, RandomQuery};
pub use session::{AuthError, AuthService, Principal, Session, SessionGate};
pub use store::{
    DocumentPath, DocumentStore, FieldMutation, Fields, FileStore, MemoryStore, Snapshot,
    StoreError, StoredDocument,
};
pub use sync::{QuoteSync, StorageLayout, SyncError};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
