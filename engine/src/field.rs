//! FILENAME: engine/src/field.rs
//! PURPOSE: Defines the `Field` type, a named sequence of values.
//! CONTEXT: Fields are the columns a table crosses into records. A field
//! either holds its values in memory or holds a producer callable that is
//! invoked afresh for every read. Producers let a field stream values from
//! sources too large to hold, at the cost of re-reading them per pass.

use std::fmt;
use std::sync::Arc;

use crate::value::Value;

/// A boxed stream of values, as returned by [`Field::items`].
pub type ValueIter = Box<dyn Iterator<Item = Value>>;

/// A zero-argument callable producing a fresh value stream per invocation.
pub type Producer = Arc<dyn Fn() -> ValueIter>;

/// Where a field's values come from.
#[derive(Clone)]
pub enum FieldSource {
    /// A fixed in-memory sequence.
    Items(Vec<Value>),
    /// A producer invoked on every read. The field buffers nothing.
    Producer(Producer),
}

impl fmt::Debug for FieldSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldSource::Items(items) => f.debug_tuple("Items").field(items).finish(),
            FieldSource::Producer(_) => f.debug_tuple("Producer").field(&"<fn>").finish(),
        }
    }
}

/// A named sequence of values, e.g. `usernames` or `passwords`.
///
/// The field name identifies the field on its table; the item name is the
/// key its values take inside generated records and defaults to the field
/// name.
///
/// Cloning a field shares its producer: two live iterators over the same
/// producer-backed field observe one underlying source, and a source that
/// cannot restart yields fewer items on the second pass. Call
/// [`Field::materialize`] (or construct with
/// [`Field::from_producer_eager`]) when repeated passes must agree.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    item_name: Option<String>,
    source: FieldSource,
    primary: bool,
}

impl Field {
    /// Creates a field holding the given values in memory.
    pub fn new<I, V>(name: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Field {
            name: name.into(),
            item_name: None,
            source: FieldSource::Items(items.into_iter().map(Into::into).collect()),
            primary: false,
        }
    }

    /// Creates a lazy field. `producer` is invoked once per read to obtain
    /// a fresh value stream.
    pub fn from_producer(
        name: impl Into<String>,
        producer: impl Fn() -> ValueIter + 'static,
    ) -> Self {
        Field {
            name: name.into(),
            item_name: None,
            source: FieldSource::Producer(Arc::new(producer)),
            primary: false,
        }
    }

    /// Creates an eager field from a producer: the producer is drained
    /// once, right now, and the collected values become the field's items.
    /// The producer is not retained.
    pub fn from_producer_eager(
        name: impl Into<String>,
        producer: impl Fn() -> ValueIter,
    ) -> Self {
        Field {
            name: name.into(),
            item_name: None,
            source: FieldSource::Items(producer().collect()),
            primary: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// The key this field's values take inside records. Falls back to the
    /// field name until one is set explicitly.
    pub fn item_name(&self) -> &str {
        self.item_name.as_deref().unwrap_or(&self.name)
    }

    pub fn set_item_name(&mut self, item_name: impl Into<String>) {
        self.item_name = Some(item_name.into());
    }

    /// Builder form of [`Field::set_item_name`].
    pub fn with_item_name(mut self, item_name: impl Into<String>) -> Self {
        self.set_item_name(item_name);
        self
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    /// Marks this field as the one record groups are keyed on.
    pub fn set_primary(&mut self) {
        self.primary = true;
    }

    pub fn unset_primary(&mut self) {
        self.primary = false;
    }

    /// Builder form of [`Field::set_primary`].
    pub fn with_primary(mut self) -> Self {
        self.set_primary();
        self
    }

    pub fn source(&self) -> &FieldSource {
        &self.source
    }

    /// Returns a fresh iterator over this field's values. For an in-memory
    /// field the values are cloned; for a producer-backed field the
    /// producer is invoked.
    pub fn items(&self) -> ValueIter {
        match &self.source {
            FieldSource::Items(items) => Box::new(items.clone().into_iter()),
            FieldSource::Producer(producer) => producer(),
        }
    }

    /// Forces one full evaluation and returns the values. A producer-backed
    /// field performs its side effects (file reads, rewinds) here.
    pub fn read_items(&self) -> Vec<Value> {
        self.items().collect()
    }

    /// Converts a producer-backed field into an in-memory one by draining
    /// the producer once. In-memory fields are unchanged.
    pub fn materialize(&mut self) {
        if let FieldSource::Producer(producer) = &self.source {
            self.source = FieldSource::Items(producer().collect());
        }
    }
}

impl<'a> IntoIterator for &'a Field {
    type Item = Value;
    type IntoIter = ValueIter;

    fn into_iter(self) -> Self::IntoIter {
        self.items()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[test]
    fn test_items_from_memory() {
        let field = Field::new("usernames", ["Marry", "Bella", "Michael"]);
        let items: Vec<Value> = field.items().collect();
        assert_eq!(
            items,
            vec![
                Value::from("Marry"),
                Value::from("Bella"),
                Value::from("Michael")
            ]
        );
    }

    #[test]
    fn test_item_name_defaults_to_name() {
        let field = Field::new("passwords", ["1234"]);
        assert_eq!(field.item_name(), "passwords");

        let field = field.with_item_name("password");
        assert_eq!(field.item_name(), "password");
        assert_eq!(field.name(), "passwords");
    }

    #[test]
    fn test_producer_invoked_per_read() {
        let calls = Rc::new(Cell::new(0));
        let counted = Rc::clone(&calls);
        let field = Field::from_producer("numbers", move || {
            counted.set(counted.get() + 1);
            Box::new((0..3).map(Value::from))
        });

        assert_eq!(field.read_items().len(), 3);
        assert_eq!(field.read_items().len(), 3);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_from_producer_eager_drains_once() {
        let calls = Rc::new(Cell::new(0));
        let counted = Rc::clone(&calls);
        let field = Field::from_producer_eager("numbers", move || {
            counted.set(counted.get() + 1);
            Box::new((0..3).map(Value::from))
        });

        assert_eq!(field.read_items().len(), 3);
        assert_eq!(field.read_items().len(), 3);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_materialize_pins_producer_output() {
        let calls = Rc::new(Cell::new(0));
        let counted = Rc::clone(&calls);
        let mut field = Field::from_producer("numbers", move || {
            counted.set(counted.get() + 1);
            Box::new((0..2).map(Value::from))
        });

        field.materialize();
        assert_eq!(calls.get(), 1);

        field.read_items();
        field.read_items();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_clone_shares_producer_state() {
        // A one-shot source: each pull takes from the same shared pool, so
        // a clone's iterator competes with the original's.
        let pool = Rc::new(RefCell::new(vec![
            Value::from("a"),
            Value::from("b"),
            Value::from("c"),
        ]));
        let shared = Rc::clone(&pool);
        let field = Field::from_producer("letters", move || {
            let source = Rc::clone(&shared);
            Box::new(std::iter::from_fn(move || {
                let mut pool = source.borrow_mut();
                if pool.is_empty() {
                    None
                } else {
                    Some(pool.remove(0))
                }
            }))
        });

        let copy = field.clone();
        let mut first = field.items();
        let mut second = copy.items();

        assert_eq!(first.next(), Some(Value::from("a")));
        assert_eq!(second.next(), Some(Value::from("b")));
        assert_eq!(first.next(), Some(Value::from("c")));
        assert_eq!(second.next(), None);
    }

    #[test]
    fn test_primary_flag() {
        let mut field = Field::new("usernames", ["Marry"]);
        assert!(!field.is_primary());
        field.set_primary();
        assert!(field.is_primary());
        field.unset_primary();
        assert!(!field.is_primary());
    }
}
