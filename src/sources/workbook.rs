use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};

use crate::sources::{Cell, SourceError, SourceTable};

/// Reads the first worksheet. Numeric and date cells are kept as numbers.
pub fn read_workbook(path: &Path, has_headers: bool) -> Result<SourceTable, SourceError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| SourceError::WorkbookFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| SourceError::EmptyWorkbook(path.to_path_buf()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| SourceError::WorkbookFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    let mut rows_iter = range.rows();
    let headers = if has_headers {
        rows_iter
            .next()
            .map(|row| row.iter().map(|data| to_cell(data).as_text()).collect())
            .unwrap_or_default()
    } else {
        vec![]
    };

    let rows = rows_iter
        .map(|row| row.iter().map(to_cell).collect::<Vec<_>>())
        .collect();

    Ok(SourceTable { headers, rows })
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(value) | Data::DateTimeIso(value) | Data::DurationIso(value) => {
            Cell::text(value)
        }
        Data::Float(value) => Cell::Number(*value),
        Data::Int(value) => Cell::Number(*value as f64),
        Data::Bool(value) => Cell::Text(value.to_string()),
        Data::DateTime(value) => Cell::Number(value.as_f64()),
    }
}
