//! FILENAME: ingest/src/json_reader.rs
//! PURPOSE: Reads a JSON array of objects into pass-through or product
//! tables.
//! CONTEXT: Each object becomes one record in document key order. Scalars
//! map onto record values directly; nested arrays and objects have no
//! scalar form and keep their JSON text.

use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::Path;

use indexmap::IndexMap;

use engine::{dicts_to_table, Record, RecordSource, TableError, Value};

use crate::error::IngestError;

/// Parses `reader` as a JSON array of objects and builds a table from
/// them. See [`engine::records_to_table`] for how `primary` picks the
/// table kind.
///
/// An array element that is not an object fails with
/// [`TableError::TypeMismatch`].
pub fn json_reader_to_table<R: io::Read>(
    reader: R,
    primary: Option<&str>,
    common: Record,
    names: &HashMap<String, String>,
) -> Result<Box<dyn RecordSource>, IngestError> {
    let elements: Vec<serde_json::Value> = serde_json::from_reader(reader)?;

    let mut dicts = Vec::with_capacity(elements.len());
    for element in elements {
        match element {
            serde_json::Value::Object(object) => dicts.push(object_to_dict(object)),
            other => {
                return Err(IngestError::Table(TableError::TypeMismatch {
                    expected: "object",
                    found: json_type_name(&other).to_string(),
                }))
            }
        }
    }

    Ok(dicts_to_table(dicts, primary, common, names)?)
}

/// Reads a JSON file and builds a table from its array of objects.
pub fn json_to_table(
    path: impl AsRef<Path>,
    primary: Option<&str>,
    common: Record,
    names: &HashMap<String, String>,
) -> Result<Box<dyn RecordSource>, IngestError> {
    let file = File::open(path)?;
    json_reader_to_table(file, primary, common, names)
}

fn object_to_dict(object: serde_json::Map<String, serde_json::Value>) -> IndexMap<String, Value> {
    object
        .into_iter()
        .map(|(key, value)| (key, json_to_value(value)))
        .collect()
}

fn json_to_value(value: serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::Text(s),
        other => Value::Text(other.to_string()),
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_objects_become_records_in_key_order() {
        let json = r#"[
            {"username": "Marry", "password": "1234"},
            {"username": "Bella", "password": "abc123"}
        ]"#;
        let table =
            json_reader_to_table(json.as_bytes(), None, Record::new(), &HashMap::new()).unwrap();

        let records: Vec<Record> = table.records().unwrap().collect();
        assert_eq!(records.len(), 2);
        let keys: Vec<&String> = records[0].keys().collect();
        assert_eq!(keys, ["username", "password"]);
        assert_eq!(records[1].get_item("username"), Some(&Value::from("Bella")));
    }

    #[test]
    fn test_scalars_map_directly() {
        let json = r#"[{"name": "a", "count": 3, "active": true, "note": null}]"#;
        let table =
            json_reader_to_table(json.as_bytes(), None, Record::new(), &HashMap::new()).unwrap();

        let record = table.records().unwrap().next().unwrap();
        assert_eq!(record.get_item("count"), Some(&Value::Number(3.0)));
        assert_eq!(record.get_item("active"), Some(&Value::Bool(true)));
        assert_eq!(record.get_item("note"), Some(&Value::Null));
    }

    #[test]
    fn test_nested_values_keep_their_json_text() {
        let json = r#"[{"name": "a", "tags": [1, 2], "extra": {"k": "v"}}]"#;
        let table =
            json_reader_to_table(json.as_bytes(), None, Record::new(), &HashMap::new()).unwrap();

        let record = table.records().unwrap().next().unwrap();
        assert_eq!(record.get_item("tags"), Some(&Value::from("[1,2]")));
        assert_eq!(record.get_item("extra"), Some(&Value::from("{\"k\":\"v\"}")));
    }

    #[test]
    fn test_non_object_element_fails() {
        let json = r#"[{"a": 1}, 2]"#;
        let result = json_reader_to_table(json.as_bytes(), None, Record::new(), &HashMap::new());

        match result {
            Err(IngestError::Table(TableError::TypeMismatch { expected, found })) => {
                assert_eq!(expected, "object");
                assert_eq!(found, "number");
            }
            other => panic!("expected a type mismatch, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_non_array_document_fails() {
        let json = r#"{"a": 1}"#;
        let result = json_reader_to_table(json.as_bytes(), None, Record::new(), &HashMap::new());
        assert!(matches!(result, Err(IngestError::Json(_))));
    }

    #[test]
    fn test_with_primary_builds_product_table() {
        let json = r#"[
            {"user": "a", "pass": "1"},
            {"user": "a", "pass": "2"},
            {"user": "b", "pass": "1"},
            {"user": "b", "pass": "2"}
        ]"#;
        let table =
            json_reader_to_table(json.as_bytes(), Some("user"), Record::new(), &HashMap::new())
                .unwrap();

        let records: Vec<Record> = table.records().unwrap().collect();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].get_item("user"), Some(&Value::from("a")));
    }
}
