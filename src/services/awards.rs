use jiff::Zoned;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::{
    models::{
        award::{AwardRecord, Status},
        collection::AwardCollection,
    },
    normalize::{
        date::{DeadlineInput, NormalizeError, normalize, parse_iso_date},
        list::normalize_list,
    },
    sources::mapping::AwardFields,
};

#[derive(Debug, Error, PartialEq)]
pub enum BuildError {
    #[error("Missing required field: {0}")]
    MissingRequiredField(&'static str),

    #[error(transparent)]
    InvalidDate(#[from] NormalizeError),
}

/// Result of building a record from one source row
#[derive(Debug, Clone, PartialEq)]
pub enum BuildOutcome {
    Created(AwardRecord),
    /// Same title (any case) and link as an existing record; nothing to append
    Duplicate { title: String, existing_id: String },
}

/// Builds a normalized award record from an extracted field bundle.
///
/// Does not touch `existing`; appending the created record is up to the
/// caller.
pub fn build_award(
    fields: AwardFields,
    existing: &AwardCollection,
    now: &Zoned,
) -> Result<BuildOutcome, BuildError> {
    // 1. Required fields
    let title = fields.title.trim().to_string();
    if title.is_empty() {
        return Err(BuildError::MissingRequiredField("title"));
    }
    let link = fields.link.trim().to_string();
    if link.is_empty() {
        return Err(BuildError::MissingRequiredField("link"));
    }
    let Some(deadline_input) = fields.deadline else {
        return Err(BuildError::MissingRequiredField("deadline"));
    };

    // 2. Duplicate check on (lowercased title, link)
    if let Some(duplicate) = existing.find_duplicate(&title, &link) {
        return Ok(BuildOutcome::Duplicate {
            title,
            existing_id: duplicate.id.clone(),
        });
    }

    // 3. Dates
    let deadline = normalize(&deadline_input, now.datetime())?;
    let internal_deadline = fields
        .internal_deadline
        .map(|input| internal_deadline(&input, now, &title))
        .unwrap_or_default();

    // 4. Mount the record
    let delimiter = fields.list_delimiter;
    Ok(BuildOutcome::Created(AwardRecord {
        id: Uuid::new_v4().to_string(),
        deadline_month: deadline.month_name.clone(),
        deadline_day: deadline.day as i64,
        deadline_date: deadline.iso_date(),
        level: normalize_list(&fields.level, delimiter),
        application_mode: fields.application_mode.trim().to_string(),
        award_for: normalize_list(&fields.award_for, delimiter),
        award_type: normalize_list(&fields.award_type, delimiter),
        internal_deadline,
        requirements: fields.requirements.trim().to_string(),
        previous_awardees: fields.previous_awardees.trim().to_string(),
        title,
        link,
        date_added: Some(now.timestamp()),
        status: Status::Active,
        is_recurring: true,
    }))
}

/// ISO form of the internal deadline. Already-ISO text is kept; anything that
/// cannot be read as a date is dropped with a warning.
fn internal_deadline(input: &DeadlineInput, now: &Zoned, title: &str) -> String {
    if let DeadlineInput::FullDate(text) = input
        && parse_iso_date(text.trim()).is_some()
    {
        return text.trim().to_string();
    }

    match normalize(input, now.datetime()) {
        Ok(deadline) => deadline.iso_date(),
        Err(e) => {
            warn!(award = %title, error = %e, "ignoring unreadable internal deadline");
            String::new()
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum FindAwardError {
    #[error("Award '{0}' not found")]
    AwardNotFound(String),

    #[error("Award name is ambiguous. Multiple awards found: {}", .0.join(", "))]
    AmbiguousAwardName(Vec<String>),
}

/// Finds an award by exact id, falling back to a case-insensitive title match
pub fn find_award<'a>(
    collection: &'a AwardCollection,
    id_or_fuzzy_title: &str,
) -> Result<&'a AwardRecord, FindAwardError> {
    if let Some(award) = collection.get_award(id_or_fuzzy_title) {
        return Ok(award);
    }

    let needle = id_or_fuzzy_title.to_lowercase();
    let matching_awards: Vec<_> = collection
        .awards
        .iter()
        .filter(|a| a.title.to_lowercase().contains(&needle))
        .collect();

    match matching_awards.len() {
        0 => Err(FindAwardError::AwardNotFound(id_or_fuzzy_title.to_string())),
        1 => Ok(matching_awards[0]),
        _ => {
            // An exact title wins over partial matches
            if let Some(exact) = matching_awards
                .iter()
                .find(|a| a.title.to_lowercase() == needle)
            {
                return Ok(*exact);
            }
            let titles: Vec<String> = matching_awards.iter().map(|a| a.title.clone()).collect();
            Err(FindAwardError::AmbiguousAwardName(titles))
        }
    }
}
