//! FILENAME: ingest/src/lines.rs
//! PURPOSE: Line-oriented file sources for fields (wordlists).
//! CONTEXT: A wordlist is one value per line, usually far larger than the
//! rest of the table. These fields stream it from disk instead of holding
//! it, re-reading the file on every pass.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use engine::{Field, Value};

use crate::error::IngestError;

/// A line reader over one open file with a single shared cursor.
///
/// Clones share the cursor: interleaved reads through two clones consume
/// the same underlying position, and [`LineFile::lines`] rewinds it for
/// everyone.
#[derive(Clone)]
pub struct LineFile {
    reader: Arc<Mutex<BufReader<File>>>,
}

impl LineFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IngestError> {
        let file = File::open(path)?;
        Ok(LineFile {
            reader: Arc::new(Mutex::new(BufReader::new(file))),
        })
    }

    /// Seeks the shared cursor back to the start of the file.
    pub fn rewind(&self) -> io::Result<()> {
        self.lock().seek(SeekFrom::Start(0)).map(|_| ())
    }

    /// Reads the next non-empty line from the shared cursor, with the
    /// trailing newline stripped. `Ok(None)` at end of file.
    pub fn try_next_line(&self) -> io::Result<Option<String>> {
        let mut reader = self.lock();
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            let stripped = strip_newline(&line);
            if !stripped.is_empty() {
                return Ok(Some(stripped.to_string()));
            }
        }
    }

    /// Rewinds the shared cursor and returns an iterator over the file's
    /// non-empty lines. A read error mid-stream ends the iterator after a
    /// warning; use [`LineFile::try_next_line`] when errors must surface.
    pub fn lines(&self) -> LineIter {
        if let Err(err) = self.rewind() {
            log::warn!("line source rewind failed: {}", err);
        }
        LineIter { file: self.clone() }
    }

    fn next_line(&self) -> Option<String> {
        match self.try_next_line() {
            Ok(line) => line,
            Err(err) => {
                log::warn!("line source read failed: {}", err);
                None
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, BufReader<File>> {
        // Poisoning needs a panicked holder; recover the guard either way.
        self.reader.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Iterator over the non-empty lines of a [`LineFile`], sharing its
/// cursor.
pub struct LineIter {
    file: LineFile,
}

impl Iterator for LineIter {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.file.next_line()
    }
}

/// Strips one trailing newline, tolerating CRLF.
fn strip_newline(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Builds a lazy field streaming the non-empty lines of `path` as text.
///
/// Every read of the field rewinds the shared cursor and streams from the
/// start of the file. Iterators alive at the same time share that cursor:
/// starting one restarts the other, and interleaving them yields fewer
/// combinations than independent passes would. Use [`file_field_eager`]
/// when concurrent passes must see the whole file each.
pub fn file_field(name: impl Into<String>, path: impl AsRef<Path>) -> Result<Field, IngestError> {
    let file = LineFile::open(path)?;
    Ok(Field::from_producer(name, move || {
        Box::new(file.lines().map(Value::Text))
    }))
}

/// Builds an in-memory field by draining all non-empty lines of `path`
/// right now. The file handle is released before this returns, and read
/// errors surface here instead of mid-stream.
pub fn file_field_eager(
    name: impl Into<String>,
    path: impl AsRef<Path>,
) -> Result<Field, IngestError> {
    let file = LineFile::open(path)?;
    let mut items = Vec::new();
    while let Some(line) = file.try_next_line()? {
        items.push(Value::Text(line));
    }
    Ok(Field::new(name, items))
}
