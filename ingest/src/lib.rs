//! FILENAME: ingest/src/lib.rs
//! Rowmill Ingest Module
//!
//! Brings external data into the engine: wordlist files as streaming
//! fields, CSV and JSON documents as tables. Parsing is eager; the
//! returned tables replay their records on every read.

mod csv_reader;
mod error;
mod json_reader;
mod lines;

pub use csv_reader::{csv_reader_to_table, csv_to_table, read_csv_records, CsvOptions};
pub use error::IngestError;
pub use json_reader::{json_reader_to_table, json_to_table};
pub use lines::{file_field, file_field_eager, LineFile, LineIter};
