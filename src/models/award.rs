use jiff::Timestamp;
use jiff::civil::Date;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::normalize::{date::parse_iso_date, list::split_values};

/// One award or opportunity with an annual deadline.
///
/// Fields default to empty values when absent from the persisted file, and
/// wrongly typed values in hand-edited records are read leniently, so a
/// single bad record still loads and is reported by the validator instead
/// of failing the whole collection.
#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AwardRecord {
    /// Opaque unique identifier, generated once at creation
    #[serde(deserialize_with = "lenient_text")]
    pub id: String,
    /// Official title of the award
    #[serde(deserialize_with = "lenient_text")]
    pub title: String,
    /// Full English month name of the final deadline
    #[serde(deserialize_with = "lenient_text")]
    pub deadline_month: String,
    /// Day of month of the final deadline; `-1` when the stored value is not
    /// a number
    #[serde(deserialize_with = "lenient_day")]
    pub deadline_day: i64,
    /// Final deadline as `YYYY-MM-DD`
    #[serde(deserialize_with = "lenient_text")]
    pub deadline_date: String,
    /// Comma-joined award levels, e.g. "International, National"
    #[serde(deserialize_with = "lenient_text")]
    pub level: String,
    /// How the application is submitted
    #[serde(deserialize_with = "lenient_text")]
    pub application_mode: String,
    /// Comma-joined eligible applicant groups
    #[serde(deserialize_with = "lenient_text")]
    pub award_for: String,
    /// Comma-joined award types
    #[serde(rename = "type", deserialize_with = "lenient_text")]
    pub award_type: String,
    /// Internal review deadline as `YYYY-MM-DD`, or empty
    #[serde(deserialize_with = "lenient_text")]
    pub internal_deadline: String,
    #[serde(deserialize_with = "lenient_text")]
    pub requirements: String,
    #[serde(deserialize_with = "lenient_text")]
    pub previous_awardees: String,
    /// Official award page
    #[serde(deserialize_with = "lenient_text")]
    pub link: String,
    /// When the record was created; `None` when missing or unreadable
    #[serde(
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub date_added: Option<Timestamp>,
    pub status: Status,
    /// Expected to repeat every year
    pub is_recurring: bool,
}

#[derive(Serialize, Deserialize, Default, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Active,
}

/// Day value that can never pass the 1-31 check
const UNREADABLE_DAY: i64 = -1;

/// `null` reads as empty; numbers and booleans keep their JSON text
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(text) => text,
        other => other.to_string(),
    })
}

/// Accepts a number or numeric string; `null` counts as missing
fn lenient_day<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => 0,
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|day| day.trunc() as i64))
            .unwrap_or(UNREADABLE_DAY),
        Value::String(text) if text.trim().is_empty() => 0,
        Value::String(text) => text.trim().parse().unwrap_or(UNREADABLE_DAY),
        _ => UNREADABLE_DAY,
    })
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    })
}

impl AwardRecord {
    /// Parsed final deadline, `None` when `deadline_date` is not a real ISO date
    pub fn deadline(&self) -> Option<Date> {
        parse_iso_date(&self.deadline_date)
    }

    pub fn levels(&self) -> Vec<&str> {
        split_values(&self.level)
    }

    pub fn award_for_values(&self) -> Vec<&str> {
        split_values(&self.award_for)
    }

    pub fn type_values(&self) -> Vec<&str> {
        split_values(&self.award_type)
    }

    /// Whether this record and `(title, link)` share the duplicate key:
    /// case-insensitive title, exact link.
    pub fn has_duplicate_key(&self, title: &str, link: &str) -> bool {
        self.title.to_lowercase() == title.to_lowercase() && self.link == link
    }

    /// "Month Day" as shown next to the deadline badge
    pub fn deadline_label(&self) -> String {
        format!("{} {}", self.deadline_month, self.deadline_day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_uses_camel_case_and_type_key() {
        let json = r#"{
            "id": "a1",
            "title": "Fulbright",
            "deadlineMonth": "October",
            "deadlineDay": 8,
            "deadlineDate": "2026-10-08",
            "level": "International, National",
            "applicationMode": "Online",
            "awardFor": "Faculty, Staff",
            "type": "Fellowship",
            "internalDeadline": "",
            "requirements": "",
            "previousAwardees": "",
            "link": "https://x.org",
            "dateAdded": "2025-01-10T15:00:00.000Z",
            "status": "active",
            "isRecurring": true
        }"#;

        let award: AwardRecord = serde_json::from_str(json).unwrap();

        assert_eq!(award.award_type, "Fellowship");
        assert_eq!(award.deadline_day, 8);
        assert_eq!(award.levels(), vec!["International", "National"]);
        assert_eq!(award.deadline(), Some(jiff::civil::date(2026, 10, 8)));
        assert_eq!(award.status, Status::Active);
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let award: AwardRecord = serde_json::from_str(r#"{"title": "Only a title"}"#).unwrap();

        assert_eq!(award.title, "Only a title");
        assert!(award.id.is_empty());
        assert_eq!(award.deadline_day, 0);
        assert_eq!(award.deadline(), None);
    }

    #[test]
    fn test_wrongly_typed_values_are_read_leniently() {
        let json = r#"{
            "id": 17,
            "title": "Truman",
            "deadlineDay": "15",
            "link": null,
            "type": null,
            "dateAdded": ""
        }"#;

        let award: AwardRecord = serde_json::from_str(json).unwrap();

        assert_eq!(award.id, "17");
        assert_eq!(award.deadline_day, 15);
        assert_eq!(award.link, "");
        assert_eq!(award.award_type, "");
        assert_eq!(award.date_added, None);
        assert!(!serde_json::to_string(&award).unwrap().contains("dateAdded"));
    }

    #[test]
    fn test_unreadable_day_is_out_of_range() {
        for raw in [r#""fifteenth""#, "[15]", "true"] {
            let json = format!(r#"{{"deadlineDay": {}}}"#, raw);
            let award: AwardRecord = serde_json::from_str(&json).unwrap();
            assert_eq!(award.deadline_day, UNREADABLE_DAY, "input {raw}");
        }

        let award: AwardRecord = serde_json::from_str(r#"{"deadlineDay": null}"#).unwrap();
        assert_eq!(award.deadline_day, 0);
    }

    #[test]
    fn test_duplicate_key_ignores_title_case_only() {
        let award = AwardRecord {
            title: String::from("Fulbright"),
            link: String::from("https://x.org"),
            ..AwardRecord::default()
        };

        assert!(award.has_duplicate_key("FULBRIGHT", "https://x.org"));
        assert!(!award.has_duplicate_key("Fulbright", "https://x.org/apply"));
        assert!(!award.has_duplicate_key("Fulbright Scholar", "https://x.org"));
    }
}
