use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    models::{award::AwardRecord, collection::AwardCollection},
    normalize::date::{is_iso_date_layout, parse_iso_date},
};

/// Titles shorter than this get a warning
pub const MIN_TITLE_CHARS: usize = 3;

/// Structured result of a validation run, also written as the report file
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub valid: bool,
    pub total_awards: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// Report for a collection file that could not be read at all
    pub fn unreadable(message: String) -> Self {
        Self {
            valid: false,
            total_awards: 0,
            errors: vec![message],
            warnings: vec![],
        }
    }
}

/// Checks a collection against the schema invariants. Never modifies it.
pub fn validate(collection: &AwardCollection) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut seen_ids: HashSet<&str> = HashSet::new();
    let mut seen_titles: HashSet<String> = HashSet::new();
    let mut duplicate_titles = Vec::new();

    for (index, award) in collection.awards.iter().enumerate() {
        let award_number = index + 1;
        let label = format!(
            "Award #{} ({})",
            award_number,
            if award.title.trim().is_empty() { "Unknown" } else { award.title.as_str() }
        );

        for field in missing_required_fields(award) {
            errors.push(format!("{}: Missing required field \"{}\"", label, field));
        }

        let title = award.title.trim();
        if !title.is_empty() && title.chars().count() < MIN_TITLE_CHARS {
            warnings.push(format!("Award #{}: Title is too short ({})", award_number, award.title));
        }

        if !award.link.trim().is_empty() && Url::parse(award.link.trim()).is_err() {
            errors.push(format!("{}: Invalid URL format for link", label));
        }

        let deadline_date = award.deadline_date.trim();
        if !deadline_date.is_empty() {
            if !is_iso_date_layout(deadline_date) {
                errors.push(format!(
                    "{}: Invalid date format for deadlineDate (expected YYYY-MM-DD)",
                    label
                ));
            } else if parse_iso_date(deadline_date).is_none() {
                errors.push(format!("{}: Invalid deadline date", label));
            }
        }

        if award.deadline_day != 0 && !(1..=31).contains(&award.deadline_day) {
            errors.push(format!("{}: Invalid deadline day (must be 1-31)", label));
        }

        if !award.id.trim().is_empty() && !seen_ids.insert(award.id.as_str()) {
            errors.push(format!("{}: Duplicate ID found", label));
        }

        let lowered = award.title.to_lowercase();
        if !seen_titles.insert(lowered.clone()) {
            duplicate_titles.push(format!("Potential duplicate title: \"{}\"", lowered));
        }
    }

    // Duplicate titles are listed after every per-record warning
    warnings.extend(duplicate_titles);

    ValidationReport {
        valid: errors.is_empty(),
        total_awards: collection.awards.len(),
        errors,
        warnings,
    }
}

/// Required fields that are empty after trimming (a zero day counts as empty)
fn missing_required_fields(award: &AwardRecord) -> Vec<&'static str> {
    let mut missing = Vec::new();
    let blank = |value: &str| value.trim().is_empty();

    if blank(&award.id) {
        missing.push("id");
    }
    if blank(&award.title) {
        missing.push("title");
    }
    if blank(&award.deadline_month) {
        missing.push("deadlineMonth");
    }
    if award.deadline_day == 0 {
        missing.push("deadlineDay");
    }
    if blank(&award.deadline_date) {
        missing.push("deadlineDate");
    }
    if blank(&award.link) {
        missing.push("link");
    }

    missing
}
