//! FILENAME: engine/src/table.rs
//! Table - crosses named fields into a stream of records.
//!
//! This module takes a set of fields and produces every combination of
//! their values as records, optionally grouped by a primary field.
//!
//! Algorithm:
//! 1. Order the fields so the primary field comes first
//! 2. Capture each field's item name and collect its items
//! 3. Walk the n-ary cartesian product of the collected item lists
//! 4. For each combination, seed a record from the common record and
//!    write one item per field over it
//!
//! Because the primary field is first and the product varies the first
//! sequence slowest, the output arrives in primary-major order: every
//! record for one primary value before any record of the next.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use itertools::Itertools;

use crate::error::TableError;
use crate::field::{Field, ValueIter};
use crate::record::Record;
use crate::value::Value;

// ============================================================================
// RECORD STREAMS
// ============================================================================

/// A lazy stream of generated records.
pub struct Records {
    inner: Box<dyn Iterator<Item = Record>>,
}

impl Records {
    pub(crate) fn new(inner: impl Iterator<Item = Record> + 'static) -> Self {
        Records {
            inner: Box::new(inner),
        }
    }

    /// A stream that yields nothing.
    pub fn empty() -> Self {
        Records {
            inner: Box::new(std::iter::empty()),
        }
    }
}

impl Iterator for Records {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        self.inner.next()
    }
}

impl fmt::Debug for Records {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Records(..)")
    }
}

/// A lazy stream of record groups, one [`Records`] per primary value.
pub struct RecordGroups {
    inner: Box<dyn Iterator<Item = Records>>,
}

impl RecordGroups {
    pub(crate) fn new(inner: impl Iterator<Item = Records> + 'static) -> Self {
        RecordGroups {
            inner: Box::new(inner),
        }
    }

    /// Concatenates the groups back into one record stream, keeping group
    /// order and within-group order.
    pub fn flatten(self) -> Records {
        Records {
            inner: Box::new(self.inner.flatten()),
        }
    }
}

impl Iterator for RecordGroups {
    type Item = Records;

    fn next(&mut self) -> Option<Records> {
        self.inner.next()
    }
}

impl fmt::Debug for RecordGroups {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RecordGroups(..)")
    }
}

/// Anything that can produce a record stream from its current state.
///
/// All three table variants implement this, so callers that only consume
/// records can hold a `Box<dyn RecordSource>` and stay unaware of how the
/// records come to be.
pub trait RecordSource {
    fn records(&self) -> Result<Records, TableError>;
}

// ============================================================================
// RECORD GENERATION
// ============================================================================

/// Crosses `fields` into records: one record per combination of item
/// values, each seeded from `common` first.
///
/// The first field named by `primary` is moved to the front so the
/// output is primary-major; the remaining fields keep their supplied
/// order, later fields sharing the primary name included. Each field's
/// items are collected up front: every field's reader is opened before
/// any is drained, then each is drained fully in field order.
/// Fields sharing one live underlying source contend for it during that
/// drain (see the hazard note on [`Field`]).
///
/// On a key collision the field's value replaces the common record's
/// value. With no fields, or with any field whose items are empty, the
/// stream is empty.
pub fn product_records<'a, I>(fields: I, primary: Option<&str>, common: &Record) -> Records
where
    I: IntoIterator<Item = &'a Field>,
{
    // Step 1: primary field first, remaining fields in supplied order.
    // The move is positional so a second field under the primary name
    // still enters the product.
    let supplied: Vec<&Field> = fields.into_iter().collect();
    if supplied.is_empty() {
        return Records::empty();
    }
    let primary_index = primary.and_then(|name| supplied.iter().position(|f| f.name() == name));
    let mut ordered: Vec<&Field> = Vec::with_capacity(supplied.len());
    if let Some(index) = primary_index {
        ordered.push(supplied[index]);
    }
    for (index, field) in supplied.iter().enumerate() {
        if Some(index) != primary_index {
            ordered.push(field);
        }
    }

    // Step 2: capture item names and collect items. All readers open
    // before any drains, then drain in field order.
    let item_names: Vec<String> = ordered.iter().map(|f| f.item_name().to_string()).collect();
    let readers: Vec<ValueIter> = ordered.iter().map(|f| f.items()).collect();
    let columns: Vec<Vec<Value>> = readers.into_iter().map(Iterator::collect).collect();
    if columns.iter().any(|column| column.is_empty()) {
        return Records::empty();
    }

    // Steps 3 and 4: lazy product, common record seeded under field items.
    let common = common.clone();
    let records = columns
        .into_iter()
        .multi_cartesian_product()
        .map(move |combination| {
            let mut record = common.clone();
            for (item_name, value) in item_names.iter().zip(combination) {
                record.add_item(item_name.clone(), value);
            }
            record
        });

    Records::new(records)
}

/// Builds a singleton copy of `template` holding exactly one item.
fn singleton_field(template: &Field, item: Value) -> Field {
    let mut field = Field::new(template.name(), [item]);
    field.set_item_name(template.item_name());
    field.set_primary();
    field
}

/// Crosses `fields` into records grouped by the field named
/// `primary_name`: one group per primary item, in primary item order.
///
/// The first field named `primary_name` keys the groups and its items
/// are read once, up front. Every other field, later fields sharing the
/// primary name included, is re-read per group, so producer-backed
/// fields must restart cleanly across groups.
///
/// Errors with [`TableError::FieldNotFound`] when `primary_name` names no
/// supplied field. A table whose only field is the primary yields its
/// whole product as a single group.
pub fn grouped_records<'a, I>(
    fields: I,
    primary_name: &str,
    common: &Record,
) -> Result<RecordGroups, TableError>
where
    I: IntoIterator<Item = &'a Field>,
{
    let supplied: Vec<&Field> = fields.into_iter().collect();
    let primary_index = supplied
        .iter()
        .position(|f| f.name() == primary_name)
        .ok_or_else(|| TableError::FieldNotFound(primary_name.to_string()))?;

    if supplied.len() == 1 {
        let group = product_records(supplied.iter().copied(), Some(primary_name), common);
        return Ok(RecordGroups::new(std::iter::once(group)));
    }

    let primary = supplied[primary_index].clone();
    let others: Vec<Field> = supplied
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != primary_index)
        .map(|(_, f)| (*f).clone())
        .collect();
    let common = common.clone();
    let primary_items = primary.read_items();

    let groups = primary_items.into_iter().map(move |item| {
        let mut group_fields = Vec::with_capacity(others.len() + 1);
        group_fields.push(singleton_field(&primary, item));
        group_fields.extend(others.iter().cloned());
        product_records(group_fields.iter(), Some(primary.name()), &common)
    });

    Ok(RecordGroups::new(groups))
}

// ============================================================================
// TABLE
// ============================================================================

/// A registry of fields crossed into records on demand.
///
/// Fields are keyed by name and keep their insertion order; a parallel
/// index maps item names back to field names for item-name lookups. At
/// most one field is the primary; generation orders it first and grouping
/// keys on it. The common record's items seed every generated record, and
/// a field value replaces a common value on a key collision.
///
/// `records()` recomputes from current state on every call; nothing is
/// cached across mutations.
#[derive(Debug, Clone, Default)]
pub struct Table {
    fields: IndexMap<String, Field>,
    /// Item name -> field name. With duplicate item names the first
    /// field in insertion order wins.
    items_index: HashMap<String, String>,
    primary: Option<String>,
    common: Record,
}

impl Table {
    /// Creates an empty table with a fresh, empty common record.
    pub fn new() -> Self {
        Table {
            fields: IndexMap::new(),
            items_index: HashMap::new(),
            primary: None,
            common: Record::new(),
        }
    }

    /// Creates a table holding the given fields.
    pub fn with_fields(fields: impl IntoIterator<Item = Field>) -> Self {
        let mut table = Table::new();
        table.add_fields(fields);
        table
    }

    /// Adds a field, keyed by its name. A field that reports itself
    /// primary becomes the table primary. Adding a field under an existing
    /// name replaces that field in place; replacing the field under the
    /// current primary name keeps that name primary.
    pub fn add_field(&mut self, field: Field) {
        let name = field.name().to_string();
        let primary = field.is_primary() || self.primary.as_deref() == Some(name.as_str());
        self.fields.insert(name.clone(), field);
        self.reindex_item_names();
        if primary {
            self.promote(&name);
        }
    }

    pub fn add_fields(&mut self, fields: impl IntoIterator<Item = Field>) {
        for field in fields {
            self.add_field(field);
        }
    }

    /// Adds a field and makes it the table primary regardless of its flag.
    pub fn add_primary_field(&mut self, mut field: Field) {
        field.set_primary();
        self.add_field(field);
    }

    /// Makes the field named `name` the table primary.
    /// Errors when no such field is registered.
    pub fn set_primary_field(&mut self, name: &str) -> Result<(), TableError> {
        if !self.fields.contains_key(name) {
            return Err(TableError::FieldNotFound(name.to_string()));
        }
        self.promote(name);
        Ok(())
    }

    /// Points the table primary at `name` and keeps the field flags in
    /// step: exactly the primary field carries the primary flag.
    fn promote(&mut self, name: &str) {
        for (field_name, field) in self.fields.iter_mut() {
            if field_name == name {
                field.set_primary();
            } else {
                field.unset_primary();
            }
        }
        self.primary = Some(name.to_string());
    }

    /// Rebuilds the item-name index after a registry change.
    fn reindex_item_names(&mut self) {
        self.items_index.clear();
        for (name, field) in &self.fields {
            self.items_index
                .entry(field.item_name().to_string())
                .or_insert_with(|| name.clone());
        }
    }

    pub fn has_primary_field(&self) -> bool {
        self.primary.is_some()
    }

    pub fn primary_field(&self) -> Option<&Field> {
        self.primary.as_ref().and_then(|name| self.fields.get(name))
    }

    pub fn primary_field_name(&self) -> Option<&str> {
        self.primary.as_deref()
    }

    /// The fields in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.values()
    }

    /// Every field except the primary, in insertion order.
    pub fn other_fields(&self) -> impl Iterator<Item = &Field> {
        let primary = self.primary.clone();
        self.fields
            .values()
            .filter(move |field| Some(field.name()) != primary.as_deref())
    }

    /// Exact, case-sensitive lookup by field name.
    pub fn field_by_name(&self, name: &str) -> Result<&Field, TableError> {
        self.fields
            .get(name)
            .ok_or_else(|| TableError::FieldNotFound(name.to_string()))
    }

    /// Exact, case-sensitive lookup through the item-name index. With
    /// duplicate item names the first field in insertion order wins.
    pub fn field_by_item_name(&self, item_name: &str) -> Result<&Field, TableError> {
        self.items_index
            .get(item_name)
            .and_then(|name| self.fields.get(name))
            .ok_or_else(|| TableError::FieldNotFound(item_name.to_string()))
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    pub fn item_names(&self) -> Vec<String> {
        self.fields
            .values()
            .map(|field| field.item_name().to_string())
            .collect()
    }

    /// Collects every field's items, one full read per field, keyed by
    /// item name.
    pub fn fields_items(&self) -> IndexMap<String, Vec<Value>> {
        self.fields
            .values()
            .map(|field| (field.item_name().to_string(), field.read_items()))
            .collect()
    }

    /// One full read of the primary field's items, if a primary is set.
    pub fn primary_items(&self) -> Option<Vec<Value>> {
        self.primary_field().map(|field| field.read_items())
    }

    pub fn set_common_record(&mut self, common: Record) {
        self.common = common;
    }

    pub fn common_record(&self) -> &Record {
        &self.common
    }

    /// Generates the full record stream from current state. See
    /// [`product_records`] for ordering and collision rules.
    pub fn records(&self) -> Records {
        product_records(self.fields.values(), self.primary.as_deref(), &self.common)
    }

    /// Generates the record stream grouped by the primary field. Errors
    /// with [`TableError::PrimaryFieldNotFound`] when no primary is set.
    pub fn records_by_primary(&self) -> Result<RecordGroups, TableError> {
        let primary = self
            .primary
            .as_deref()
            .ok_or(TableError::PrimaryFieldNotFound)?;
        grouped_records(self.fields.values(), primary, &self.common)
    }
}

impl RecordSource for Table {
    fn records(&self) -> Result<Records, TableError> {
        Ok(Table::records(self))
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = Record;
    type IntoIter = Records;

    fn into_iter(self) -> Records {
        self.records()
    }
}

// ============================================================================
// PRIMARY TABLE
// ============================================================================

/// The callback deciding which fields to cross for one primary item.
pub type FieldsCallback = Arc<dyn Fn(&Value) -> Vec<Field>>;

/// A table whose non-primary fields are chosen per primary item.
///
/// For each item of the primary field the callback is invoked with that
/// item and returns the fields to cross for its group. A returned field
/// whose name matches the primary is discarded; a singleton primary field
/// holding the current item is crossed in instead, so every record still
/// carries exactly one primary item.
#[derive(Clone)]
pub struct PrimaryTable {
    table: Table,
    fields_fn: FieldsCallback,
}

impl PrimaryTable {
    pub fn new(primary: Field, fields_fn: impl Fn(&Value) -> Vec<Field> + 'static) -> Self {
        let mut table = Table::new();
        table.add_primary_field(primary);
        PrimaryTable {
            table,
            fields_fn: Arc::new(fields_fn),
        }
    }

    pub fn primary_field(&self) -> Option<&Field> {
        self.table.primary_field()
    }

    pub fn set_common_record(&mut self, common: Record) {
        self.table.set_common_record(common);
    }

    pub fn common_record(&self) -> &Record {
        self.table.common_record()
    }

    /// One group per primary item, in primary item order. The callback
    /// runs lazily, when its group is reached.
    pub fn records_by_primary(&self) -> Result<RecordGroups, TableError> {
        let primary = self
            .table
            .primary_field()
            .ok_or(TableError::PrimaryFieldNotFound)?
            .clone();
        let fields_fn = Arc::clone(&self.fields_fn);
        let common = self.table.common_record().clone();
        let primary_items = primary.read_items();

        let groups = primary_items.into_iter().map(move |item| {
            let produced = fields_fn(&item);
            let mut group_fields = Vec::with_capacity(produced.len() + 1);
            group_fields.push(singleton_field(&primary, item));
            group_fields.extend(
                produced
                    .into_iter()
                    .filter(|field| field.name() != primary.name()),
            );
            product_records(group_fields.iter(), Some(primary.name()), &common)
        });

        Ok(RecordGroups::new(groups))
    }
}

impl RecordSource for PrimaryTable {
    /// The grouped stream flattened: group order, then within-group order.
    fn records(&self) -> Result<Records, TableError> {
        Ok(self.records_by_primary()?.flatten())
    }
}

impl fmt::Debug for PrimaryTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrimaryTable")
            .field("table", &self.table)
            .field("fields_fn", &"<fn>")
            .finish()
    }
}

// ============================================================================
// RECORDS TABLE
// ============================================================================

/// A pass-through table over pre-built records. No product is taken.
///
/// The supplied records are materialized once so every `records()` call
/// replays them. Each read merges the current common record over a copy
/// of each stored record, so on a key collision the common value replaces
/// the stored one. Note this is the opposite direction from product
/// generation, where field values replace common values.
#[derive(Debug, Clone, Default)]
pub struct RecordsTable {
    records: Vec<Record>,
    common: Record,
}

impl RecordsTable {
    pub fn new(records: impl IntoIterator<Item = Record>) -> Self {
        RecordsTable {
            records: records.into_iter().collect(),
            common: Record::new(),
        }
    }

    pub fn set_records(&mut self, records: impl IntoIterator<Item = Record>) {
        self.records = records.into_iter().collect();
    }

    pub fn push_record(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn set_common_record(&mut self, common: Record) {
        self.common = common;
    }

    pub fn common_record(&self) -> &Record {
        &self.common
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Replays the stored records with the common record merged over each.
    pub fn records(&self) -> Records {
        let common = self.common.clone();
        let stored = self.records.clone();
        Records::new(stored.into_iter().map(move |mut record| {
            record.add_items(&common);
            record
        }))
    }
}

impl RecordSource for RecordsTable {
    fn records(&self) -> Result<Records, TableError> {
        Ok(RecordsTable::records(self))
    }
}

impl<'a> IntoIterator for &'a RecordsTable {
    type Item = Record;
    type IntoIter = Records;

    fn into_iter(self) -> Records {
        self.records()
    }
}
