use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Fields;

/// Field-level array mutation.
///
/// Both variants compare elements by deep equality of the whole value;
/// there is no way to address an element by one of its fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum FieldMutation {
    /// Add the value unless a deep-equal element is already present.
    AppendIfAbsent(Value),
    /// Remove every deep-equal element.
    RemoveExact(Value),
}

/// Applies a mutation to a document's fields.
///
/// A missing or non-array field becomes `[value]` on append and is left
/// alone on remove. Returns true if the fields changed.
pub fn apply_mutation(fields: &mut Fields, field: &str, mutation: &FieldMutation) -> bool {
    match mutation {
        FieldMutation::AppendIfAbsent(value) => match fields.get_mut(field) {
            Some(Value::Array(items)) => {
                if items.contains(value) {
                    false
                } else {
                    items.push(value.clone());
                    true
                }
            }
            _ => {
                fields.insert(field.to_string(), Value::Array(vec![value.clone()]));
                true
            }
        },
        FieldMutation::RemoveExact(value) => match fields.get_mut(field) {
            Some(Value::Array(items)) => {
                let before = items.len();
                items.retain(|item| item != value);
                items.len() != before
            }
            _ => false,
        },
    }
}
