//! FILENAME: ingest/src/csv_reader.rs
//! PURPOSE: Reads CSV data into pass-through or product tables.
//! CONTEXT: Every row becomes one record keyed by the header names, every
//! cell a text value. The options mirror a dictionary-style CSV reader:
//! supplied headers for headerless files, a filler for short rows and a
//! catch-all key for long ones.

use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use engine::{records_to_table, Record, RecordSource, Value};

use crate::error::IngestError;

/// Options controlling CSV parsing and row-to-record mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    /// Cell separator.
    pub delimiter: u8,

    /// Quoting character.
    pub quote: u8,

    /// Escape character inside quoted cells. `None` means quotes escape
    /// themselves when `double_quote` is on.
    pub escape: Option<u8>,

    /// Whether `""` inside a quoted cell reads as one quote.
    pub double_quote: bool,

    /// Record terminator. `None` accepts `\r`, `\n` and `\r\n`.
    pub terminator: Option<u8>,

    /// Column names for a file without a header row. When set, every row
    /// of the file is data; when unset, the first row names the columns.
    pub headers: Option<Vec<String>>,

    /// Text filling the missing cells of a short row. `None` fills with
    /// null values instead.
    pub fill_missing: Option<String>,

    /// Key collecting the extra cells of a long row, joined with the
    /// delimiter. `None` drops them.
    pub rest_key: Option<String>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            escape: None,
            double_quote: true,
            terminator: None,
            headers: None,
            fill_missing: None,
            rest_key: None,
        }
    }
}

impl CsvOptions {
    fn build_reader<R: io::Read>(&self, reader: R) -> csv::Reader<R> {
        let mut builder = csv::ReaderBuilder::new();
        builder
            .delimiter(self.delimiter)
            .quote(self.quote)
            .double_quote(self.double_quote)
            .has_headers(self.headers.is_none())
            .flexible(true);
        if self.escape.is_some() {
            builder.escape(self.escape);
        }
        if let Some(terminator) = self.terminator {
            builder.terminator(csv::Terminator::Any(terminator));
        }
        builder.from_reader(reader)
    }
}

/// Parses CSV from `reader` into records, one per data row, keyed by the
/// header names in column order.
pub fn read_csv_records<R: io::Read>(
    reader: R,
    options: &CsvOptions,
) -> Result<Vec<Record>, IngestError> {
    let mut csv_reader = options.build_reader(reader);

    let headers: Vec<String> = match &options.headers {
        Some(names) => names.clone(),
        None => csv_reader.headers()?.iter().map(str::to_string).collect(),
    };

    let mut records = Vec::new();
    for row in csv_reader.records() {
        records.push(row_to_record(&headers, &row?, options));
    }
    Ok(records)
}

/// Maps one CSV row onto the headers. Short rows are padded per
/// `fill_missing`; extra cells land under `rest_key` or are dropped.
fn row_to_record(headers: &[String], row: &csv::StringRecord, options: &CsvOptions) -> Record {
    let mut record = Record::new();
    for (index, header) in headers.iter().enumerate() {
        let value = match row.get(index) {
            Some(cell) => Value::Text(cell.to_string()),
            None => match &options.fill_missing {
                Some(filler) => Value::Text(filler.clone()),
                None => Value::Null,
            },
        };
        record.add_item(header.clone(), value);
    }

    if row.len() > headers.len() {
        if let Some(rest_key) = &options.rest_key {
            let separator = (options.delimiter as char).to_string();
            let extras: Vec<&str> = (headers.len()..row.len())
                .filter_map(|index| row.get(index))
                .collect();
            record.add_item(rest_key.clone(), Value::Text(extras.join(&separator)));
        }
    }
    record
}

/// Reads CSV from any byte stream and builds a table from its rows. See
/// [`engine::records_to_table`] for how `primary` picks the table kind.
pub fn csv_reader_to_table<R: io::Read>(
    reader: R,
    primary: Option<&str>,
    common: Record,
    names: &HashMap<String, String>,
    options: &CsvOptions,
) -> Result<Box<dyn RecordSource>, IngestError> {
    let records = read_csv_records(reader, options)?;
    Ok(records_to_table(records, primary, common, names)?)
}

/// Reads a CSV file and builds a table from its rows.
pub fn csv_to_table(
    path: impl AsRef<Path>,
    primary: Option<&str>,
    common: Record,
    names: &HashMap<String, String>,
    options: &CsvOptions,
) -> Result<Box<dyn RecordSource>, IngestError> {
    let file = File::open(path)?;
    csv_reader_to_table(file, primary, common, names, options)
}
