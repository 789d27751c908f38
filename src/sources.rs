use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod delimited;
pub mod mapping;
pub mod workbook;

/// A single spreadsheet cell. Numeric cells stay numeric so month indices and
/// serial dates can be told apart from text.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

static EMPTY_CELL: Cell = Cell::Empty;

impl Cell {
    pub fn text(value: &str) -> Cell {
        let value = value.trim();
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Trimmed text of the cell; integral numbers print without a fraction
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(value) => value.trim().to_string(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
        }
    }
}

/// Rows read from one sheet or file, with the header row split off when the
/// source has one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl SourceTable {
    /// Sheet row number of `rows[0]`; the header occupies row 1 when present
    pub fn first_row_number(&self) -> u64 {
        if self.headers.is_empty() { 1 } else { 2 }
    }

    /// Non-blank rows paired with their 1-based sheet row numbers. Blank
    /// rows are skipped but still count towards the numbering.
    pub fn numbered_rows(&self) -> impl Iterator<Item = (u64, RawRow<'_>)> {
        let first = self.first_row_number();
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, cells)| !cells.iter().all(Cell::is_empty))
            .map(move |(index, cells)| {
                (
                    first + index as u64,
                    RawRow {
                        headers: &self.headers,
                        cells,
                    },
                )
            })
    }
}

/// One source row with access by position or header name
#[derive(Debug, Clone, Copy)]
pub struct RawRow<'a> {
    headers: &'a [String],
    cells: &'a [Cell],
}

impl<'a> RawRow<'a> {
    pub fn new(headers: &'a [String], cells: &'a [Cell]) -> Self {
        Self { headers, cells }
    }

    pub fn at(&self, index: usize) -> &'a Cell {
        self.cells.get(index).unwrap_or(&EMPTY_CELL)
    }

    /// Header lookup ignores surrounding whitespace
    pub fn named(&self, header: &str) -> &'a Cell {
        self.headers
            .iter()
            .position(|candidate| candidate.trim() == header.trim())
            .map(|index| self.at(index))
            .unwrap_or(&EMPTY_CELL)
    }
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to read '{path}': {source}")]
    DelimitedFailed {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to read workbook '{path}': {source}")]
    WorkbookFailed {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("Workbook '{0}' does not contain any worksheets")]
    EmptyWorkbook(PathBuf),

    #[error("Unsupported source file '{0}' (expected .csv, .tsv, .xlsx, .xls or .ods)")]
    UnsupportedFormat(PathBuf),
}

/// Reads a CSV/TSV export or the first sheet of a workbook, picked by file
/// extension.
pub fn read_table(path: &Path, has_headers: bool) -> Result<SourceTable, SourceError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "csv" | "txt" => delimited::read_delimited(path, b',', has_headers),
        "tsv" => delimited::read_delimited(path, b'\t', has_headers),
        "xlsx" | "xlsm" | "xls" | "ods" => workbook::read_workbook(path, has_headers),
        _ => Err(SourceError::UnsupportedFormat(path.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_text_rendering() {
        assert_eq!(Cell::Number(3.0).as_text(), "3");
        assert_eq!(Cell::Number(3.5).as_text(), "3.5");
        assert_eq!(Cell::text("  Online ").as_text(), "Online");
        assert_eq!(Cell::text("   "), Cell::Empty);
    }

    #[test]
    fn test_row_lookup_by_index_and_header() {
        let headers = vec![String::from("Title"), String::from(" Link ")];
        let cells = vec![Cell::text("Truman"), Cell::text("https://truman.gov")];
        let row = RawRow::new(&headers, &cells);

        assert_eq!(row.at(0), &Cell::text("Truman"));
        assert_eq!(row.at(7), &Cell::Empty);
        assert_eq!(row.named("Link"), &Cell::text("https://truman.gov"));
        assert_eq!(row.named("Missing"), &Cell::Empty);
    }

    #[test]
    fn test_numbered_rows_account_for_header() {
        let table = SourceTable {
            headers: vec![String::from("Title")],
            rows: vec![
                vec![Cell::text("A")],
                vec![Cell::Empty, Cell::Empty],
                vec![Cell::text("B")],
            ],
        };
        let numbers: Vec<u64> = table.numbered_rows().map(|(n, _)| n).collect();
        assert_eq!(numbers, vec![2, 4]);

        let headerless = SourceTable {
            headers: vec![],
            rows: vec![vec![Cell::text("A")]],
        };
        assert_eq!(headerless.first_row_number(), 1);
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let result = read_table(Path::new("awards.pdf"), true);
        assert!(matches!(result, Err(SourceError::UnsupportedFormat(_))));
    }
}
