use std::collections::BTreeSet;

use jiff::civil::Date;
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    models::award::AwardRecord,
    normalize::list::{compare_levels, split_values},
};

/// The listing's filter configuration. Empty fields impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterSpec {
    /// Case-insensitive substring over title, requirements, previous
    /// awardees, award-for and level
    pub search: String,
    /// Exact match against one of the award's levels
    pub level: String,
    /// Matches when any selected value is among the award's values
    pub award_for: Vec<String>,
    #[serde(rename = "type")]
    pub award_type: Vec<String>,
    /// Horizon in days; given as a number or numeric string
    #[serde(deserialize_with = "deserialize_horizon")]
    pub deadline: Option<i64>,
}

fn deserialize_horizon<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Horizon {
        Days(i64),
        Text(String),
    }

    Ok(match Option::<Horizon>::deserialize(deserializer)? {
        Some(Horizon::Days(days)) => Some(days),
        Some(Horizon::Text(text)) => parse_horizon(&text),
        None => None,
    })
}

/// Reads a horizon value; blank or non-numeric input means "no horizon"
pub fn parse_horizon(value: &str) -> Option<i64> {
    value.trim().parse().ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Passed,
    Urgent,
    Upcoming,
    PlentyOfTime,
}

impl Urgency {
    pub fn classify(days_until: i64) -> Self {
        match days_until {
            d if d < 0 => Urgency::Passed,
            0..=30 => Urgency::Urgent,
            31..=60 => Urgency::Upcoming,
            _ => Urgency::PlentyOfTime,
        }
    }
}

/// Whole days from `today` to the award's deadline, negative once passed.
/// `None` when the stored deadline is not a valid date.
pub fn days_until(award: &AwardRecord, today: Date) -> Option<i64> {
    let deadline = award.deadline()?;
    deadline
        .since(today)
        .ok()
        .map(|span| span.get_days() as i64)
}

/// Urgency of an award relative to `today`; always computed, never stored
pub fn urgency(award: &AwardRecord, today: Date) -> Option<(Urgency, i64)> {
    days_until(award, today).map(|days| (Urgency::classify(days), days))
}

/// Awards matching every active constraint, ordered by deadline.
/// Awards sharing a deadline keep their collection order.
pub fn filter_awards<'a>(
    awards: &'a [AwardRecord],
    spec: &FilterSpec,
    today: Date,
) -> Vec<&'a AwardRecord> {
    let search = spec.search.to_lowercase();

    let mut matching: Vec<&AwardRecord> = awards
        .iter()
        .filter(|award| search.is_empty() || searchable_text(award).contains(&search))
        .filter(|award| spec.level.is_empty() || award.levels().contains(&spec.level.as_str()))
        .filter(|award| any_selected(&spec.award_for, &award.award_for_values()))
        .filter(|award| any_selected(&spec.award_type, &award.type_values()))
        .filter(|award| match spec.deadline {
            None => true,
            Some(horizon) => {
                matches!(days_until(award, today), Some(days) if (0..=horizon).contains(&days))
            }
        })
        .collect();

    matching.sort_by(|a, b| a.deadline_date.cmp(&b.deadline_date));
    matching
}

fn searchable_text(award: &AwardRecord) -> String {
    [
        award.title.as_str(),
        award.requirements.as_str(),
        award.previous_awardees.as_str(),
        award.award_for.as_str(),
        award.level.as_str(),
    ]
    .join(" ")
    .to_lowercase()
}

fn any_selected(selected: &[String], values: &[&str]) -> bool {
    selected.is_empty() || selected.iter().any(|choice| values.contains(&choice.as_str()))
}

/// Distinct values offered by the listing's filter controls
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Facets {
    /// Broadest level first, unknown levels alphabetically after
    pub levels: Vec<String>,
    pub award_for: Vec<String>,
    #[serde(rename = "type")]
    pub award_type: Vec<String>,
}

pub fn collect_facets(awards: &[AwardRecord]) -> Facets {
    let mut levels = distinct_values(awards.iter().map(|award| award.level.as_str()));
    levels.sort_by(|a, b| compare_levels(a, b));

    Facets {
        levels,
        award_for: distinct_values(awards.iter().map(|award| award.award_for.as_str())),
        award_type: distinct_values(awards.iter().map(|award| award.award_type.as_str())),
    }
}

/// Sorted distinct values across comma-joined fields
fn distinct_values<'a>(fields: impl Iterator<Item = &'a str>) -> Vec<String> {
    fields
        .flat_map(split_values)
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
