//! NDJSON (newline-delimited JSON) sink for batch path resolution.
//!
//! Each row is serialized directly to the writer without an intermediate
//! `String`.
//!
//! ```ignore
//! let mut sink = JsonStreamSink::stdout();
//! sink.write_rows(&rows)?;
//! let n = sink.finish()?;
//! ```

use nestkit_core::{deep_get, Lookup};
use serde::Serialize;
use serde_json::Value;
use std::io::{self, BufWriter, Write};

/// One row per requested path.
///
/// `found` is false for both the `Nothing` marker and an empty path; `value`
/// is `null` in either case.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionRow<'a> {
    pub path: &'a str,
    pub found: bool,
    pub value: Option<&'a Value>,
}

impl<'a> ResolutionRow<'a> {
    pub fn resolve(doc: &'a Value, path: &'a str) -> Self {
        let value = match deep_get(doc, path) {
            Some(Lookup::Found(v)) => Some(v),
            Some(Lookup::Nothing) | None => None,
        };
        Self {
            path,
            found: value.is_some(),
            value,
        }
    }
}

/// Buffered NDJSON writer over any `Write`.
pub struct JsonStreamSink<W: Write> {
    writer: BufWriter<W>,
    rows_written: usize,
}

impl JsonStreamSink<io::Stdout> {
    /// Write NDJSON to stdout.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> JsonStreamSink<W> {
    /// Create a sink wrapping any writer (file, Vec<u8>, etc.).
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(64 * 1024, writer),
            rows_written: 0,
        }
    }

    pub fn write_row<T: Serialize>(&mut self, row: &T) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, row).map_err(io::Error::other)?;
        self.writer.write_all(b"\n")?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn write_rows<T: Serialize>(&mut self, rows: &[T]) -> io::Result<()> {
        for row in rows {
            self.write_row(row)?;
        }
        Ok(())
    }

    /// Flush and return how many rows were written.
    pub fn finish(mut self) -> io::Result<usize> {
        self.writer.flush()?;
        Ok(self.rows_written)
    }
}
