// segbase-core/src/merge.rs
// Recursive partial-update merge for documents

use serde_json::{Map, Value};

use crate::document::Document;

/// Merge `patch` into `target`, key by key.
///
/// An object value merges recursively into the existing value at that key;
/// a non-object target slot (or an absent one) is coerced to an empty
/// object first. Scalars, arrays and null replace the target value
/// wholesale - arrays are never merged element-wise. Keys of `target` that
/// are absent from `patch` are left untouched.
pub fn merge_into(target: &mut Document, patch: &Document) {
    for (key, incoming) in patch {
        match incoming {
            Value::Object(child) => {
                let slot = target
                    .entry(key.clone())
                    .or_insert_with(|| Value::Object(Map::new()));
                if !slot.is_object() {
                    *slot = Value::Object(Map::new());
                }
                if let Value::Object(existing) = slot {
                    merge_into(existing, child);
                }
            }
            _ => {
                target.insert(key.clone(), incoming.clone());
            }
        }
    }
}
