use std::path::Path;

use jiff::Zoned;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    models::collection::AwardCollection,
    services::{
        awards::{BuildOutcome, build_award},
        ingest::RowFailure,
    },
    sources::{SourceError, SourceTable, mapping::ColumnMapping, read_table},
    storage::{Storage, StorageError, cursor::INITIAL_ROW},
};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug)]
pub struct ConvertReport {
    pub collection: AwardCollection,
    pub duplicates: usize,
    pub skipped: Vec<RowFailure>,
}

/// Builds a fresh collection from every row of `table`. Rows repeating an
/// earlier row's title and link are dropped. Headerless sources keep their
/// header in sheet row 1, which is skipped.
pub fn convert_table(table: &SourceTable, mapping: &ColumnMapping, now: &Zoned) -> ConvertReport {
    let mut report = ConvertReport {
        collection: AwardCollection {
            last_updated: now.timestamp(),
            ..AwardCollection::default()
        },
        duplicates: 0,
        skipped: vec![],
    };

    let rows = table
        .numbered_rows()
        .filter(|(row_number, _)| mapping.has_headers || *row_number > INITIAL_ROW);

    for (row_number, row) in rows {
        match build_award(mapping.extract(&row), &report.collection, now) {
            Ok(BuildOutcome::Created(award)) => {
                report.collection.append(award, now.timestamp());
            }
            Ok(BuildOutcome::Duplicate { title, .. }) => {
                info!(row = row_number, %title, outcome = "duplicate");
                report.duplicates += 1;
            }
            Err(e) => {
                warn!(row = row_number, error = %e, "skipping row");
                report.skipped.push(RowFailure {
                    row: row_number,
                    message: e.to_string(),
                });
            }
        }
    }

    report
}

/// Reads a CSV or workbook export and replaces the stored collection with it
pub fn convert_file(
    source: &Path,
    mapping: &ColumnMapping,
    storage: &impl Storage,
    now: &Zoned,
) -> Result<ConvertReport, ExportError> {
    let table = read_table(source, mapping.has_headers)?;
    let report = convert_table(&table, mapping, now);
    storage.save(&report.collection)?;

    info!(
        source = %source.display(),
        awards = report.collection.len(),
        skipped = report.skipped.len(),
        "converted source"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::{
        sources::delimited::parse_delimited,
        storage::json::JsonFileStorage,
    };

    const EXPORT: &str = "\
Official Title of the Award,Final Submission Due Date,Award Level,Eligible Applicant Group(s),Type of Award,Link to the Official Award Application/Information Page
Sloan Fellowship,9/15/2027,National; International,Faculty (tenure-track),Fellowship,https://sloan.org
Sloan Fellowship,9/15/2027,National,Faculty,Fellowship,https://sloan.org
Untimed Award,,Local,Staff,Service,https://untimed.org
Marshall Scholarship,10/1/2027,International,Seniors,Scholarship,https://marshall.org
";

    fn now() -> Zoned {
        "2026-10-19T09:00:00[UTC]".parse().unwrap()
    }

    #[test]
    fn test_convert_table() {
        let table = parse_delimited(EXPORT.as_bytes(), b',', true).unwrap();

        let report = convert_table(&table, &ColumnMapping::eed_csv(), &now());

        let awards = &report.collection.awards;
        assert_eq!(awards.len(), 2);
        assert_eq!(awards[0].title, "Sloan Fellowship");
        assert_eq!(awards[0].deadline_date, "2027-09-15");
        assert_eq!(awards[0].deadline_month, "September");
        assert_eq!(awards[0].level, "National, International");
        assert_eq!(awards[0].award_for, "Faculty");
        assert_eq!(awards[1].title, "Marshall Scholarship");
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].row, 4);
        assert_eq!(report.collection.last_updated, now().timestamp());
    }

    #[test]
    fn test_headerless_source_skips_header_row() {
        let form_export = "\
Timestamp,Title,Month,Day,Level,Mode,For,Type,Internal,Requirements,Previous,Link
10/1/2026,Goldwater Scholarship,March,15,National,Online,Undergrad,Scholarship,,,,https://goldwater.gov
";
        let table = parse_delimited(form_export.as_bytes(), b',', false).unwrap();

        let report = convert_table(&table, &ColumnMapping::form_response(), &now());

        let titles: Vec<&str> = report
            .collection
            .awards
            .iter()
            .map(|award| award.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Goldwater Scholarship"]);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_convert_file_writes_collection() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("export.csv");
        fs::write(&source, EXPORT).unwrap();
        let storage = JsonFileStorage::new(dir.path().join("data").join("awards.json"));

        let report = convert_file(&source, &ColumnMapping::eed_csv(), &storage, &now()).unwrap();

        assert_eq!(storage.load().unwrap(), report.collection);
    }

    #[test]
    fn test_convert_file_unsupported_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("export.pdf");
        fs::write(&source, "%PDF").unwrap();
        let storage = JsonFileStorage::new(dir.path().join("awards.json"));

        let result = convert_file(&source, &ColumnMapping::eed_csv(), &storage, &now());
        assert!(matches!(
            result,
            Err(ExportError::Source(SourceError::UnsupportedFormat(_)))
        ));
    }
}
