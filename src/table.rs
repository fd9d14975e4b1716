//! Loading delimited text files into rows of cells.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::ReaderBuilder;
use log::debug;

use crate::error::ReportError;

/// One line of the source table. Every cell is kept as text.
pub type Row = Vec<String>;

/// How body rows whose length differs from the header row are treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RowPolicy {
    /// Short rows render blank trailing cells and surplus cells are ignored.
    #[default]
    Pad,
    /// Rows with a different length than the header are rejected while loading.
    Strict,
}

/// Parsing options for [`Table::load`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableOptions {
    delimiter: u8,
    row_policy: RowPolicy,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            row_policy: RowPolicy::Pad,
        }
    }
}

impl TableOptions {
    /// Creates comma-delimited options with the default row policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Picks the delimiter from the file extension: tab for `.tsv`, comma otherwise.
    pub fn for_path(path: impl AsRef<Path>) -> Self {
        let is_tsv = path
            .as_ref()
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("tsv"))
            .unwrap_or(false);
        let delimiter = if is_tsv { b'\t' } else { b',' };
        Self::default().with_delimiter(delimiter)
    }

    /// Returns the field delimiter.
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Returns the row policy.
    pub fn row_policy(&self) -> RowPolicy {
        self.row_policy
    }

    /// Sets the field delimiter and returns the updated options.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets the row policy and returns the updated options.
    pub fn with_row_policy(mut self, row_policy: RowPolicy) -> Self {
        self.row_policy = row_policy;
        self
    }
}

/// The full ordered sequence of rows read from a delimited source.
///
/// The first row is the header row. It provides both the column labels and the authoritative
/// column count used for layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Table {
    rows: Vec<Row>,
}

impl Table {
    /// Builds a table from rows that are already in memory.
    ///
    /// Returns `None` when `rows` is empty since a table needs at least a header row.
    pub fn from_rows(rows: Vec<Row>) -> Option<Self> {
        if rows.is_empty() {
            None
        } else {
            Some(Self { rows })
        }
    }

    /// Reads the delimited file at `path`.
    pub fn load(path: impl AsRef<Path>, options: &TableOptions) -> Result<Self, ReportError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| ReportError::from_io(path, err))?;
        let table = Self::from_reader(BufReader::new(file), path, options)?;
        debug!(
            "Loaded {} rows with {} columns from {}",
            table.rows.len(),
            table.column_count(),
            path.display()
        );
        Ok(table)
    }

    /// Parses delimited rows from `reader`; `origin` is only used for error messages.
    pub fn from_reader<R: Read>(
        reader: R,
        origin: impl AsRef<Path>,
        options: &TableOptions,
    ) -> Result<Self, ReportError> {
        let origin = origin.as_ref();
        let mut csv_reader = ReaderBuilder::new()
            .delimiter(options.delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut rows: Vec<Row> = Vec::new();
        for result in csv_reader.records() {
            let record = result.map_err(|err| csv_error(origin, err))?;
            if options.row_policy == RowPolicy::Strict {
                if let Some(header) = rows.first() {
                    if record.len() != header.len() {
                        return Err(ReportError::malformed(
                            origin,
                            record.position().map(|position| position.line()),
                            format!("expected {} fields, found {}", header.len(), record.len()),
                        ));
                    }
                }
            }
            rows.push(record.iter().map(str::to_owned).collect());
        }

        Self::from_rows(rows).ok_or_else(|| ReportError::malformed(origin, None, "no header row"))
    }

    /// Returns every row, header included, in file order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Returns the header row.
    pub fn header(&self) -> &[String] {
        &self.rows[0]
    }

    /// Returns the body rows that follow the header.
    pub fn body(&self) -> &[Row] {
        &self.rows[1..]
    }

    /// Number of columns, which is the length of the header row.
    pub fn column_count(&self) -> usize {
        self.header().len()
    }
}

fn csv_error(origin: &Path, err: csv::Error) -> ReportError {
    let line = err.position().map(|position| position.line());
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(io_err) => ReportError::from_io(origin, io_err),
        _ => ReportError::malformed(origin, line, message),
    }
}
