//! Quote persistence and synchronization.
//!
//! [`QuoteSync`] reconciles in-memory quotes with a user's documents in a
//! [`DocumentStore`](crate::store::DocumentStore). Two layouts are
//! supported, chosen when the engine is built:
//!
//! - `Embedded`: `users/{uid}` holds an array field `quotes`
//! - `SubDocuments`: each quote is its own document at `users/{uid}/quotes/{id}`
//!
//! Existing data in one layout is not migrated to the other.

mod engine;
mod error;
mod layout;

pub use engine::QuoteSync;
pub use error::SyncError;
pub use layout::{DocumentShape, StorageLayout, QUOTES_FIELD};
