// segbase-core/src/document.rs

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Result, SegBaseError};

/// Field name of the store-assigned identifier. Present in every stored
/// document, redundantly with the record-map key.
pub const ID_FIELD: &str = "id";

/// A document: a JSON object. `serde_json` is built with `preserve_order`,
/// so field order survives a read/write round trip.
pub type Document = Map<String, Value>;

/// The content of one segment file: id -> document object, in insertion
/// order.
pub type RecordMap = Map<String, Value>;

/// The store-assigned id of a document, if present.
pub fn document_id(doc: &Document) -> Option<&str> {
    doc.get(ID_FIELD).and_then(Value::as_str)
}

/// Convert any serializable value into a [`Document`].
///
/// Fails when the value does not serialize to a JSON object.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(SegBaseError::InvalidDocument(format!(
            "expected a JSON object, got {}",
            type_name(&other)
        ))),
    }
}

/// Deserialize a [`Document`] into a typed value.
pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct User {
        name: String,
        age: u32,
    }

    #[test]
    fn test_document_id_present() {
        let doc = json!({"id": "0_abc", "name": "Alice"});
        let doc = doc.as_object().unwrap();
        assert_eq!(document_id(doc), Some("0_abc"));
    }

    #[test]
    fn test_document_id_missing_or_non_string() {
        let doc = json!({"name": "Alice"});
        assert_eq!(document_id(doc.as_object().unwrap()), None);

        let doc = json!({"id": 42});
        assert_eq!(document_id(doc.as_object().unwrap()), None);
    }

    #[test]
    fn test_to_document_from_struct() {
        let user = User {
            name: "Bob".to_string(),
            age: 30,
        };
        let doc = to_document(&user).unwrap();
        assert_eq!(doc.get("name").unwrap(), &json!("Bob"));
        assert_eq!(doc.get("age").unwrap(), &json!(30));
    }

    #[test]
    fn test_to_document_rejects_non_object() {
        let err = to_document(&42).unwrap_err();
        assert!(matches!(err, SegBaseError::InvalidDocument(_)));
    }

    #[test]
    fn test_from_document_roundtrip() {
        let user = User {
            name: "Carol".to_string(),
            age: 27,
        };
        let doc = to_document(&user).unwrap();
        let restored: User = from_document(doc).unwrap();
        assert_eq!(restored, user);
    }
}
