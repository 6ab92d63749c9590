//! FlatFileItemReader - delimited line reader

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use contracts::{BatchError, Item, ItemReader};
use tracing::debug;

/// Reads items from a delimited flat file, one record per line.
///
/// Field 0 of each line parses to an [`Item`]; remaining fields are
/// ignored. Blank lines are skipped. Any IO or parse failure is a
/// [`BatchError::SourceRead`] carrying the 1-based line number.
#[derive(Debug)]
pub struct FlatFileItemReader<R: BufRead> {
    reader: R,
    delimiter: char,
    line: u64,
}

impl FlatFileItemReader<BufReader<File>> {
    /// Open a reader over a file path
    pub fn open(path: &Path, delimiter: char) -> Result<Self, BatchError> {
        let file = File::open(path).map_err(|e| {
            BatchError::source_read(0, format!("cannot open {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), "opened input file");
        Ok(Self::new(BufReader::new(file), delimiter))
    }
}

impl<R: BufRead> FlatFileItemReader<R> {
    /// Wrap an arbitrary buffered reader
    pub fn new(reader: R, delimiter: char) -> Self {
        Self {
            reader,
            delimiter,
            line: 0,
        }
    }

    fn parse_line(&self, raw: &str) -> Result<Item, BatchError> {
        let field = raw
            .split(self.delimiter)
            .next()
            .unwrap_or(raw)
            .trim();
        field.parse::<Item>().map_err(|e| {
            BatchError::source_read(self.line, format!("invalid item {field:?}: {e}"))
        })
    }
}

impl<R: BufRead + Send> ItemReader for FlatFileItemReader<R> {
    fn read(&mut self) -> Result<Option<Item>, BatchError> {
        let mut raw = String::new();
        loop {
            raw.clear();
            self.line += 1;
            let bytes = self
                .reader
                .read_line(&mut raw)
                .map_err(|e| BatchError::source_read(self.line, e.to_string()))?;
            if bytes == 0 {
                return Ok(None);
            }
            if raw.trim().is_empty() {
                continue;
            }
            return self.parse_line(&raw).map(Some);
        }
    }
}
