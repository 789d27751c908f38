//! Column mappings from source sheets to award fields.
//!
//! Each ingestion source lays its columns out differently. A `ColumnMapping`
//! names which column feeds which award field; `extract` turns a raw row into
//! the positioned `AwardFields` bundle the builder consumes.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::normalize::date::{DeadlineInput, MonthValue};
use crate::sources::{Cell, RawRow};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Column {
    Index(usize),
    Header(String),
}

impl Column {
    fn header(name: &str) -> Column {
        Column::Header(name.to_string())
    }

    fn read<'a>(&self, row: &RawRow<'a>) -> &'a Cell {
        match self {
            Column::Index(index) => row.at(*index),
            Column::Header(name) => row.named(name),
        }
    }
}

/// Where the final deadline comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DeadlineColumns {
    /// Separate month and day columns, no year
    MonthDay { month: Column, day: Column },
    /// A single `M/D/YYYY` (or spreadsheet date) column
    FullDate { column: Column },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMapping {
    pub has_headers: bool,
    pub title: Column,
    pub deadline: DeadlineColumns,
    #[serde(default)]
    pub level: Option<Column>,
    #[serde(default)]
    pub application_mode: Option<Column>,
    #[serde(default)]
    pub award_for: Option<Column>,
    #[serde(default, rename = "type")]
    pub award_type: Option<Column>,
    #[serde(default)]
    pub internal_deadline: Option<Column>,
    #[serde(default)]
    pub requirements: Option<Column>,
    #[serde(default)]
    pub previous_awardees: Option<Column>,
    pub link: Column,
    /// Separator of multi-valued cells in this source
    #[serde(default = "default_list_delimiter")]
    pub list_delimiter: char,
}

fn default_list_delimiter() -> char {
    ';'
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MappingPreset {
    /// Google Form responses: timestamp, title, month, day, level, mode,
    /// award for, type, internal deadline, requirements, previous awardees, link
    Form,
    /// Department CSV export with an `M/D/YYYY` final due date column
    EedCsv,
    /// Recognition workbook with month and day columns
    Workbook,
}

impl MappingPreset {
    pub fn mapping(self) -> ColumnMapping {
        match self {
            MappingPreset::Form => ColumnMapping::form_response(),
            MappingPreset::EedCsv => ColumnMapping::eed_csv(),
            MappingPreset::Workbook => ColumnMapping::workbook(),
        }
    }
}

impl ColumnMapping {
    /// Positional form-response layout; column 0 is the submission timestamp
    pub fn form_response() -> Self {
        Self {
            has_headers: false,
            title: Column::Index(1),
            deadline: DeadlineColumns::MonthDay {
                month: Column::Index(2),
                day: Column::Index(3),
            },
            level: Some(Column::Index(4)),
            application_mode: Some(Column::Index(5)),
            award_for: Some(Column::Index(6)),
            award_type: Some(Column::Index(7)),
            internal_deadline: Some(Column::Index(8)),
            requirements: Some(Column::Index(9)),
            previous_awardees: Some(Column::Index(10)),
            link: Column::Index(11),
            list_delimiter: ';',
        }
    }

    pub fn eed_csv() -> Self {
        Self {
            has_headers: true,
            title: Column::header("Official Title of the Award"),
            deadline: DeadlineColumns::FullDate {
                column: Column::header("Final Submission Due Date"),
            },
            level: Some(Column::header("Award Level")),
            application_mode: Some(Column::header("Application Mode")),
            award_for: Some(Column::header("Eligible Applicant Group(s)")),
            award_type: Some(Column::header("Type of Award")),
            internal_deadline: Some(Column::header(
                "Internal Due Date for Review/Approval (If applicable)",
            )),
            requirements: Some(Column::header("Key Requirements and Eligibility Criteria")),
            previous_awardees: Some(Column::header(
                "List of Previous Awardees from the Department (If known)",
            )),
            link: Column::header("Link to the Official Award Application/Information Page"),
            list_delimiter: ';',
        }
    }

    pub fn workbook() -> Self {
        Self {
            has_headers: true,
            title: Column::header("Title of Award"),
            deadline: DeadlineColumns::MonthDay {
                month: Column::header("Final Due Date - Month"),
                day: Column::header("Final Due Date - Day"),
            },
            level: Some(Column::header("Level")),
            application_mode: Some(Column::header("Mode of Application")),
            award_for: Some(Column::header("Award for")),
            award_type: Some(Column::header("Type of Award")),
            internal_deadline: Some(Column::header("Internal Due Date")),
            requirements: Some(Column::header("Requirements")),
            previous_awardees: Some(Column::header("Previous Awardees")),
            link: Column::header("Link to Award"),
            list_delimiter: ';',
        }
    }

    pub fn extract(&self, row: &RawRow<'_>) -> AwardFields {
        let text = |column: &Option<Column>| {
            column
                .as_ref()
                .map(|column| column.read(row).as_text())
                .unwrap_or_default()
        };

        let deadline = match &self.deadline {
            DeadlineColumns::MonthDay { month, day } => Some(DeadlineInput::MonthDay {
                month: month_value(month.read(row)),
                day: day_value(day.read(row)),
            }),
            DeadlineColumns::FullDate { column } => date_input(column.read(row)),
        };

        AwardFields {
            title: self.title.read(row).as_text(),
            deadline,
            level: text(&self.level),
            application_mode: text(&self.application_mode),
            award_for: text(&self.award_for),
            award_type: text(&self.award_type),
            internal_deadline: self
                .internal_deadline
                .as_ref()
                .and_then(|column| date_input(column.read(row))),
            requirements: text(&self.requirements),
            previous_awardees: text(&self.previous_awardees),
            link: self.link.read(row).as_text(),
            list_delimiter: self.list_delimiter,
        }
    }
}

/// Award fields pulled out of one source row, before normalization
#[derive(Debug, Clone, PartialEq)]
pub struct AwardFields {
    pub title: String,
    /// `None` when the source has no final deadline for the row
    pub deadline: Option<DeadlineInput>,
    pub level: String,
    pub application_mode: String,
    pub award_for: String,
    pub award_type: String,
    pub internal_deadline: Option<DeadlineInput>,
    pub requirements: String,
    pub previous_awardees: String,
    pub link: String,
    pub list_delimiter: char,
}

impl Default for AwardFields {
    fn default() -> Self {
        Self {
            title: String::new(),
            deadline: None,
            level: String::new(),
            application_mode: String::new(),
            award_for: String::new(),
            award_type: String::new(),
            internal_deadline: None,
            requirements: String::new(),
            previous_awardees: String::new(),
            link: String::new(),
            list_delimiter: default_list_delimiter(),
        }
    }
}

fn month_value(cell: &Cell) -> MonthValue {
    match cell {
        Cell::Empty => MonthValue::Missing,
        Cell::Text(name) => MonthValue::Name(name.clone()),
        Cell::Number(n) => MonthValue::Index(n.floor() as i64),
    }
}

/// Leading integer of the cell, like a lenient `parseInt`
fn day_value(cell: &Cell) -> Option<i64> {
    match cell {
        Cell::Empty => None,
        Cell::Number(n) => Some(n.trunc() as i64),
        Cell::Text(text) => leading_integer(text),
    }
}

fn leading_integer(text: &str) -> Option<i64> {
    let text = text.trim();
    let digits_start = usize::from(text.starts_with(['-', '+']));
    let digits_end = text[digits_start..]
        .find(|c: char| !c.is_ascii_digit())
        .map(|offset| digits_start + offset)
        .unwrap_or(text.len());

    text[..digits_end].parse().ok()
}

/// Date cells: numbers are spreadsheet serials, text is `M/D/YYYY`
fn date_input(cell: &Cell) -> Option<DeadlineInput> {
    match cell {
        Cell::Empty => None,
        Cell::Number(serial) => Some(DeadlineInput::Serial(*serial)),
        Cell::Text(text) => Some(DeadlineInput::FullDate(text.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::SourceTable;

    fn row_of(values: &[&str]) -> Vec<Cell> {
        values.iter().map(|value| Cell::text(value)).collect()
    }

    #[test]
    fn test_form_response_positions() {
        let cells = row_of(&[
            "",
            "Goldwater Scholarship",
            "3",
            "15",
            "National",
            "Online",
            "Undergrad",
            "Scholarship",
            "",
            "GPA 3.5+",
            "",
            "https://goldwater.gov",
        ]);
        let fields = ColumnMapping::form_response().extract(&RawRow::new(&[], &cells));

        assert_eq!(fields.title, "Goldwater Scholarship");
        assert_eq!(
            fields.deadline,
            Some(DeadlineInput::MonthDay {
                month: MonthValue::Name("3".into()),
                day: Some(15),
            })
        );
        assert_eq!(fields.level, "National");
        assert_eq!(fields.award_type, "Scholarship");
        assert_eq!(fields.internal_deadline, None);
        assert_eq!(fields.requirements, "GPA 3.5+");
        assert_eq!(fields.link, "https://goldwater.gov");
    }

    #[test]
    fn test_eed_csv_headers() {
        let mapping = ColumnMapping::eed_csv();
        let table = SourceTable {
            headers: vec![
                "Official Title of the Award".into(),
                "Award Level".into(),
                "Final Submission Due Date".into(),
                "Link to the Official Award Application/Information Page".into(),
            ],
            rows: vec![row_of(&[
                "Teaching Excellence",
                "University; College (internal)",
                "4/1/2027",
                "https://teach.edu",
            ])],
        };
        let (number, row) = table.numbered_rows().next().unwrap();
        let fields = mapping.extract(&row);

        assert_eq!(number, 2);
        assert_eq!(fields.title, "Teaching Excellence");
        assert_eq!(fields.level, "University; College (internal)");
        assert_eq!(fields.deadline, Some(DeadlineInput::FullDate("4/1/2027".into())));
        assert_eq!(fields.award_for, "");
        assert_eq!(fields.link, "https://teach.edu");
    }

    #[test]
    fn test_workbook_numeric_cells() {
        let headers: Vec<String> = vec![
            "Title of Award".into(),
            "Final Due Date - Month".into(),
            "Final Due Date - Day".into(),
            "Internal Due Date".into(),
            "Link to Award".into(),
        ];
        let cells = vec![
            Cell::text("Sloan Fellowship"),
            Cell::Number(9.0),
            Cell::Number(15.0),
            Cell::Number(45366.0),
            Cell::text("https://sloan.org"),
        ];
        let fields = ColumnMapping::workbook().extract(&RawRow::new(&headers, &cells));

        assert_eq!(
            fields.deadline,
            Some(DeadlineInput::MonthDay {
                month: MonthValue::Index(9),
                day: Some(15),
            })
        );
        assert_eq!(fields.internal_deadline, Some(DeadlineInput::Serial(45366.0)));
    }

    #[test]
    fn test_missing_full_date_gives_no_deadline() {
        let mapping = ColumnMapping::eed_csv();
        let headers = vec![String::from("Official Title of the Award")];
        let cells = row_of(&["No Date Award"]);
        assert_eq!(mapping.extract(&RawRow::new(&headers, &cells)).deadline, None);
    }

    #[test]
    fn test_leading_integer() {
        assert_eq!(leading_integer("15"), Some(15));
        assert_eq!(leading_integer(" 15th "), Some(15));
        assert_eq!(leading_integer("-3"), Some(-3));
        assert_eq!(leading_integer("mid-March"), None);
        assert_eq!(leading_integer(""), None);
    }

    #[test]
    fn test_mapping_deserializes_from_json() {
        let json = r#"{
            "hasHeaders": false,
            "title": 0,
            "deadline": { "kind": "fullDate", "column": "Due" },
            "type": 3,
            "link": 1
        }"#;
        let mapping: ColumnMapping = serde_json::from_str(json).unwrap();

        assert_eq!(mapping.title, Column::Index(0));
        assert_eq!(
            mapping.deadline,
            DeadlineColumns::FullDate {
                column: Column::Header("Due".into())
            }
        );
        assert_eq!(mapping.award_type, Some(Column::Index(3)));
        assert_eq!(mapping.level, None);
        assert_eq!(mapping.list_delimiter, ';');
    }
}
