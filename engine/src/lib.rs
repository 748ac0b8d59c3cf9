//! FILENAME: engine/src/lib.rs
//! PURPOSE: Main library entry point for the record generation engine.
//! CONTEXT: Re-exports public types and modules for use by other crates.
//!
//! Layers:
//! - `value` / `record`: the data a table produces
//! - `field`: the named value sequences a table crosses
//! - `table`: product generation, primary grouping, table variants
//! - `convert`: records back to fields and tables
//! - `error`: the failure taxonomy shared by all of the above

pub mod convert;
pub mod error;
pub mod field;
pub mod record;
pub mod table;
pub mod value;

// Re-export commonly used types at the crate root
pub use convert::{
    dicts_to_records, dicts_to_table, record_primary_included, record_primary_item,
    records_to_dicts, records_to_fields, records_to_items_map, records_to_table,
};
pub use error::TableError;
pub use field::{Field, FieldSource, Producer, ValueIter};
pub use record::Record;
pub use table::{
    grouped_records, product_records, FieldsCallback, PrimaryTable, RecordGroups, RecordSource,
    Records, RecordsTable, Table,
};
pub use value::Value;
