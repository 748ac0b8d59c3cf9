//! FILENAME: engine/src/convert.rs
//! Record <-> field <-> table conversion logic.
//!
//! Handles turning pre-built records back into fields and tables, and the
//! plain-mapping form records take at serialization boundaries.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::error::TableError;
use crate::field::Field;
use crate::record::Record;
use crate::table::{RecordSource, RecordsTable, Table};
use crate::value::Value;

/// Wraps plain mappings into records, keeping element order and each
/// mapping's key order.
pub fn dicts_to_records<I>(dicts: I) -> Vec<Record>
where
    I: IntoIterator<Item = IndexMap<String, Value>>,
{
    dicts
        .into_iter()
        .map(|dict| dict.into_iter().collect())
        .collect()
}

/// Unwraps records into plain mappings, keeping element order and each
/// record's key order.
pub fn records_to_dicts<I>(records: I) -> Vec<IndexMap<String, Value>>
where
    I: IntoIterator<Item = Record>,
{
    records
        .into_iter()
        .map(|record| record.into_iter().collect())
        .collect()
}

/// Collects the values seen under each item name across `records`.
///
/// Keys appear in first-seen order. With `unique`, a value already
/// collected under a name is skipped, keeping first occurrences.
pub fn records_to_items_map<'a, I>(records: I, unique: bool) -> IndexMap<String, Vec<Value>>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut map: IndexMap<String, Vec<Value>> = IndexMap::new();
    for record in records {
        for (name, value) in record.iter() {
            let values = map.entry(name.clone()).or_default();
            if unique && values.contains(value) {
                continue;
            }
            values.push(value.clone());
        }
    }
    map
}

/// Rebuilds fields from records: one field per item name, in first-seen
/// order.
///
/// Item names present in `common` produce no field. `names` maps an item
/// name to the field name to use; unmapped item names name their field
/// directly. With `unique`, duplicate values under a name are dropped.
pub fn records_to_fields(
    records: &[Record],
    common: &Record,
    names: &HashMap<String, String>,
    unique: bool,
) -> Vec<Field> {
    records_to_items_map(records, unique)
        .into_iter()
        .filter(|(item_name, _)| !common.contains_key(item_name))
        .map(|(item_name, values)| {
            let name = names
                .get(&item_name)
                .cloned()
                .unwrap_or_else(|| item_name.clone());
            Field::new(name, values).with_item_name(item_name)
        })
        .collect()
}

/// Builds a table back from records.
///
/// Without a primary name the records pass through untouched: the result
/// is a [`RecordsTable`] replaying them as supplied. With a primary name,
/// fields are re-derived from the records (deduplicated, `common` keys
/// excluded) and crossed as a regular [`Table`] with that field primary.
/// Re-derivation is a rebuild, not a replay: when the input was not
/// itself a clean product, the record multiplicity of the result differs
/// from the input.
///
/// Errors with [`TableError::FieldNotFound`] when `primary` names none of
/// the derived fields.
pub fn records_to_table(
    records: Vec<Record>,
    primary: Option<&str>,
    common: Record,
    names: &HashMap<String, String>,
) -> Result<Box<dyn RecordSource>, TableError> {
    match primary {
        None => {
            let mut table = RecordsTable::new(records);
            table.set_common_record(common);
            Ok(Box::new(table))
        }
        Some(primary_name) => {
            let fields = records_to_fields(&records, &common, names, true);
            let mut table = Table::with_fields(fields);
            table.set_primary_field(primary_name)?;
            table.set_common_record(common);
            Ok(Box::new(table))
        }
    }
}

/// Builds a table from plain mappings. See [`records_to_table`].
pub fn dicts_to_table(
    dicts: Vec<IndexMap<String, Value>>,
    primary: Option<&str>,
    common: Record,
    names: &HashMap<String, String>,
) -> Result<Box<dyn RecordSource>, TableError> {
    records_to_table(dicts_to_records(dicts), primary, common, names)
}

/// The primary item a record carries, looked up under the primary field's
/// item name. `None` when the record has no such item.
pub fn record_primary_item<'a>(record: &'a Record, primary_field: &Field) -> Option<&'a Value> {
    record.get_item(primary_field.item_name())
}

/// Whether the record's primary item is one of `items`. A record without
/// a primary item is not included.
pub fn record_primary_included(record: &Record, primary_field: &Field, items: &[Value]) -> bool {
    match record_primary_item(record, primary_field) {
        Some(value) => items.contains(value),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_records() -> Vec<Record> {
        vec![
            Record::from_items([("user", "Marry"), ("password", "a"), ("submit", "login")]),
            Record::from_items([("user", "Marry"), ("password", "b"), ("submit", "login")]),
            Record::from_items([("user", "Bella"), ("password", "a"), ("submit", "login")]),
            Record::from_items([("user", "Bella"), ("password", "b"), ("submit", "login")]),
        ]
    }

    #[test]
    fn test_dicts_round_trip() {
        let dicts: Vec<IndexMap<String, Value>> = vec![
            IndexMap::from([("a".to_string(), Value::from(1))]),
            IndexMap::from([("a".to_string(), Value::from(2))]),
        ];
        let records = dicts_to_records(dicts.clone());
        assert_eq!(records.len(), 2);
        assert_eq!(records_to_dicts(records), dicts);
    }

    #[test]
    fn test_items_map_first_seen_order() {
        let records = sample_records();
        let map = records_to_items_map(&records, false);

        let keys: Vec<&String> = map.keys().collect();
        assert_eq!(keys, ["user", "password", "submit"]);
        assert_eq!(map["user"].len(), 4);
    }

    #[test]
    fn test_items_map_unique_keeps_first_occurrences() {
        let records = sample_records();
        let map = records_to_items_map(&records, true);

        assert_eq!(map["user"], vec![Value::from("Marry"), Value::from("Bella")]);
        assert_eq!(map["password"], vec![Value::from("a"), Value::from("b")]);
        assert_eq!(map["submit"], vec![Value::from("login")]);
    }

    #[test]
    fn test_records_to_fields_skips_common_keys() {
        let records = sample_records();
        let common = Record::from_items([("submit", "login")]);
        let fields = records_to_fields(&records, &common, &HashMap::new(), true);

        let names: Vec<&str> = fields.iter().map(|f| f.name()).collect();
        assert_eq!(names, ["user", "password"]);
    }

    #[test]
    fn test_records_to_fields_applies_name_overrides() {
        let records = sample_records();
        let names = HashMap::from([("user".to_string(), "users".to_string())]);
        let fields = records_to_fields(&records, &Record::new(), &names, true);

        let user_field = fields.iter().find(|f| f.item_name() == "user").unwrap();
        assert_eq!(user_field.name(), "users");
    }

    #[test]
    fn test_records_to_table_pass_through() {
        let records = sample_records();
        let table = records_to_table(records.clone(), None, Record::new(), &HashMap::new())
            .unwrap();

        let replayed: Vec<Record> = table.records().unwrap().collect();
        assert_eq!(replayed, records);
    }

    #[test]
    fn test_records_to_table_rebuilds_product() {
        let records = sample_records();
        let common = Record::from_items([("submit", "login")]);
        let table = records_to_table(records.clone(), Some("user"), common, &HashMap::new())
            .unwrap();

        let rebuilt: Vec<Record> = table.records().unwrap().collect();
        assert_eq!(rebuilt, records);
    }

    #[test]
    fn test_records_to_table_rederivation_changes_multiplicity() {
        // Not a clean product: (2, 1) is missing from the input, but field
        // re-derivation brings it back.
        let records = vec![
            Record::from_items([("a", 1), ("b", 1)]),
            Record::from_items([("a", 1), ("b", 2)]),
            Record::from_items([("a", 2), ("b", 2)]),
        ];
        let table = records_to_table(records, Some("a"), Record::new(), &HashMap::new()).unwrap();
        assert_eq!(table.records().unwrap().count(), 4);
    }

    #[test]
    fn test_records_to_table_unknown_primary() {
        let records = sample_records();
        let result = records_to_table(records, Some("missing"), Record::new(), &HashMap::new());
        assert!(matches!(result, Err(TableError::FieldNotFound(_))));
    }

    #[test]
    fn test_record_primary_helpers() {
        let field = Field::new("users", ["Marry"]).with_item_name("user");
        let record = Record::from_items([("user", "Marry")]);

        assert_eq!(
            record_primary_item(&record, &field),
            Some(&Value::from("Marry"))
        );
        assert!(record_primary_included(
            &record,
            &field,
            &[Value::from("Marry"), Value::from("Bella")]
        ));
        assert!(!record_primary_included(&record, &field, &[Value::from("Bella")]));

        let other = Record::from_items([("password", "x")]);
        assert_eq!(record_primary_item(&other, &field), None);
        assert!(!record_primary_included(&other, &field, &[Value::from("Marry")]));
    }
}
