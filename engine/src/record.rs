//! FILENAME: engine/src/record.rs
//! PURPOSE: Defines the `Record` type, one generated row of a table.
//! CONTEXT: A record maps item names to values. Keys are unique and keep
//! their insertion order, so the items of a record read back in the order
//! they were produced. Millions of records may be generated per table, so
//! the type stays a thin wrapper over its map.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// One row of generated data: an insertion-ordered mapping from item
/// names to values.
///
/// Equality is mapping equality (key order does not matter). Serializes
/// as a plain JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    items: IndexMap<String, Value>,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Record {
            items: IndexMap::new(),
        }
    }

    /// Creates a record from name/value pairs.
    pub fn from_items<K, V, I>(items: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Record {
            items: items
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }

    /// Inserts a single item. An existing item with the same name is
    /// replaced, keeping its position.
    pub fn add_item(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.items.insert(name.into(), value.into());
    }

    /// Merges all items of `other` into this record. On a name collision
    /// the incoming value replaces the existing one.
    pub fn add_items(&mut self, other: &Record) {
        for (name, value) in &other.items {
            self.items.insert(name.clone(), value.clone());
        }
    }

    /// Clears this record and replaces its contents with `other`.
    pub fn set_items(&mut self, other: &Record) {
        self.items.clear();
        self.add_items(other);
    }

    /// Looks up an item by name. Returns `None` for a missing name;
    /// lookups never fail hard.
    pub fn get_item(&self, name: &str) -> Option<&Value> {
        self.items.get(name)
    }

    /// Returns a snapshot copy of all items in insertion order.
    pub fn items(&self) -> IndexMap<String, Value> {
        self.items.clone()
    }

    /// Iterates the items in insertion order without copying.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.items.iter()
    }

    /// Iterates the item names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.items.keys()
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.items.contains_key(name)
    }

    /// Removes an item by name, returning its value if it was present.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.items.shift_remove(name)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Extend<(String, Value)> for Record {
    fn extend<I: IntoIterator<Item = (String, Value)>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Record {
            items: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
