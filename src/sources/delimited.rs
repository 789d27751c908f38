use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};

use crate::sources::{Cell, SourceError, SourceTable};

pub fn read_delimited(
    path: &Path,
    delimiter: u8,
    has_headers: bool,
) -> Result<SourceTable, SourceError> {
    let file = std::fs::File::open(path).map_err(|e| SourceError::DelimitedFailed {
        path: path.to_path_buf(),
        source: csv::Error::from(e),
    })?;

    parse_delimited(file, delimiter, has_headers).map_err(|e| SourceError::DelimitedFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Parses delimited text with quoted fields and ragged rows. Rows made of
/// empty fields are kept so row numbers match the source sheet.
pub fn parse_delimited<R: Read>(
    reader: R,
    delimiter: u8,
    has_headers: bool,
) -> Result<SourceTable, csv::Error> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(has_headers)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = if has_headers {
        reader.headers()?.iter().map(str::to_string).collect()
    } else {
        vec![]
    };

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(Cell::text).collect());
    }

    Ok(SourceTable { headers, rows })
}
