//! Identity and equality of quote records.
//!
//! Two quotes are the same quote when their ids match; text, author, tags and
//! notes play no part. The store's array primitives compare whole values, so
//! whenever a stored record has to be superseded or removed the engine looks
//! up the literal value as it sits in the store with [`find_stored`] and
//! hands that literal back to the store.

use serde_json::Value;

use crate::models::{Quote, QuoteId};

/// Returns true if both quotes have the same identity.
pub fn same_quote(a: &Quote, b: &Quote) -> bool {
    a.id == b.id
}

/// Reads the identity of a stored record.
///
/// Records whose `id` is neither a string nor an integer have no identity
/// and never match.
pub fn record_id(record: &Value) -> Option<QuoteId> {
    record.get("id").and_then(QuoteId::from_value)
}

/// Returns true if the stored record has the given identity.
pub fn is_record_of(record: &Value, id: &QuoteId) -> bool {
    record_id(record).as_ref() == Some(id)
}

/// Finds every stored literal carrying the given identity.
///
/// More than one literal can match if an earlier save raced with another
/// write; callers remove all of them.
pub fn find_stored<'a>(records: &'a [Value], id: &QuoteId) -> Vec<&'a Value> {
    records.iter().filter(|r| is_record_of(r, id)).collect()
}
