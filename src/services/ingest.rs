//! Incremental ingestion of form-response rows.
//!
//! Rows are handled one at a time. A row that cannot be built is logged and
//! the batch moves on; a row is only counted as processed once its record is
//! saved (or it is known to be a duplicate or a failure), so the cursor never
//! runs ahead of the awards file.

use jiff::Zoned;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
    models::award::AwardRecord,
    services::awards::{BuildError, BuildOutcome, build_award},
    sources::{SourceTable, mapping::ColumnMapping},
    storage::{
        Storage, StorageError,
        cursor::{CursorFile, IngestState},
    },
};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Stopped at row {row}; rows up to {last_durable_row} are saved: {source}")]
    Interrupted {
        row: u64,
        last_durable_row: u64,
        #[source]
        source: StorageError,
    },
}

/// A row that was skipped because no record could be built from it
#[derive(Debug, Clone, PartialEq)]
pub struct RowFailure {
    pub row: u64,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct IngestReport {
    pub added: Vec<AwardRecord>,
    pub duplicates: usize,
    pub failures: Vec<RowFailure>,
    pub last_processed_row: u64,
}

impl IngestReport {
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.duplicates == 0 && self.failures.is_empty()
    }
}

/// Appends every new row of `table` to the stored collection and advances
/// the cursor past them.
pub fn ingest_rows(
    table: &SourceTable,
    mapping: &ColumnMapping,
    storage: &impl Storage,
    cursor: &CursorFile,
    now: &Zoned,
) -> Result<IngestReport, IngestError> {
    let state = cursor.load()?;
    let mut collection = storage.load()?;
    let mut report = IngestReport {
        last_processed_row: state.last_processed_row,
        ..IngestReport::default()
    };

    let pending = table
        .numbered_rows()
        .filter(|(row_number, _)| *row_number > state.last_processed_row);

    for (row_number, row) in pending {
        match build_award(mapping.extract(&row), &collection, now) {
            Ok(BuildOutcome::Created(award)) => {
                collection.append(award.clone(), now.timestamp());
                if let Err(e) = storage.save(&collection) {
                    error!(row = row_number, error = %e, "could not save awards file");
                    cursor.save(IngestState {
                        last_processed_row: report.last_processed_row,
                    })?;
                    return Err(IngestError::Interrupted {
                        row: row_number,
                        last_durable_row: report.last_processed_row,
                        source: e,
                    });
                }
                info!(row = row_number, id = %award.id, title = %award.title, outcome = "added");
                report.added.push(award);
            }
            Ok(BuildOutcome::Duplicate { title, existing_id }) => {
                info!(row = row_number, %title, %existing_id, outcome = "duplicate");
                report.duplicates += 1;
            }
            Err(e) => {
                match &e {
                    BuildError::MissingRequiredField(_) => {
                        warn!(row = row_number, error = %e, "skipping row")
                    }
                    BuildError::InvalidDate(_) => {
                        error!(row = row_number, error = %e, "skipping row")
                    }
                }
                report.failures.push(RowFailure {
                    row: row_number,
                    message: e.to_string(),
                });
            }
        }
        report.last_processed_row = row_number;
    }

    cursor.save(IngestState {
        last_processed_row: report.last_processed_row,
    })?;

    Ok(report)
}
