//! All-day calendar events for award deadlines.
//!
//! An event starts on the deadline and ends the following day (`DTEND` is
//! exclusive for `VALUE=DATE` events), so calendar apps show it on the
//! deadline day only.

use std::{
    fs,
    path::{Path, PathBuf},
};

use jiff::Timestamp;
use jiff::civil::Date;
use slug::slugify;
use thiserror::Error;

use crate::models::award::AwardRecord;

const LINE_LIMIT: usize = 75;

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("Award '{title}' has an invalid deadline date '{value}'")]
    InvalidDeadline { title: String, value: String },

    #[error("Failed to write calendar file '{path}': {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    pub uid: String,
    pub summary: String,
    pub description: String,
    pub url: String,
    pub start: Date,
    pub end: Date,
}

impl CalendarEvent {
    pub fn for_award(award: &AwardRecord) -> Result<Self, CalendarError> {
        let invalid = || CalendarError::InvalidDeadline {
            title: award.title.clone(),
            value: award.deadline_date.clone(),
        };
        let start = award.deadline().ok_or_else(invalid)?;
        let end = start.tomorrow().map_err(|_| invalid())?;

        Ok(Self {
            uid: format!("{}@awards", award.id),
            summary: format!("Award Deadline: {}", award.title),
            description: describe(award),
            url: award.link.clone(),
            start,
            end,
        })
    }

    /// Renders a one-event iCalendar document with CRLF line endings
    pub fn to_ics(&self, stamp: Timestamp) -> String {
        let lines = [
            String::from("BEGIN:VCALENDAR"),
            String::from("VERSION:2.0"),
            String::from("PRODID:-//awards//deadline export//EN"),
            String::from("CALSCALE:GREGORIAN"),
            String::from("BEGIN:VEVENT"),
            format!("UID:{}", escape_text(&self.uid)),
            format!("DTSTAMP:{}", stamp.strftime("%Y%m%dT%H%M%SZ")),
            format!("DTSTART;VALUE=DATE:{}", self.start.strftime("%Y%m%d")),
            format!("DTEND;VALUE=DATE:{}", self.end.strftime("%Y%m%d")),
            format!("SUMMARY:{}", escape_text(&self.summary)),
            format!("DESCRIPTION:{}", escape_text(&self.description)),
            format!("URL:{}", self.url),
            String::from("END:VEVENT"),
            String::from("END:VCALENDAR"),
        ];

        lines
            .iter()
            .map(|line| fold_line(line))
            .collect::<Vec<_>>()
            .join("\r\n")
            + "\r\n"
    }
}

fn describe(award: &AwardRecord) -> String {
    let mut description = String::new();
    if !award.requirements.is_empty() {
        description.push_str(&format!("Requirements: {}\n\n", award.requirements));
    }
    if !award.level.is_empty() {
        description.push_str(&format!("Level: {}\n", award.level));
    }
    if !award.award_for.is_empty() {
        description.push_str(&format!("For: {}\n", award.award_for));
    }
    description.push_str(&format!("\nApply here: {}", award.link));
    description
}

/// Download file name, e.g. `award-goldwater-scholarship.ics`
pub fn file_name(award: &AwardRecord) -> String {
    format!("award-{}.ics", slugify(&award.title))
}

/// Writes the award's event to `out_dir` and returns the file path
pub fn write_event(
    award: &AwardRecord,
    out_dir: &Path,
    stamp: Timestamp,
) -> Result<PathBuf, CalendarError> {
    let event = CalendarEvent::for_award(award)?;
    let path = out_dir.join(file_name(award));

    fs::create_dir_all(out_dir)
        .and_then(|_| fs::write(&path, event.to_ics(stamp)))
        .map_err(|e| CalendarError::WriteFailed {
            path: path.clone(),
            source: e,
        })?;

    Ok(path)
}

fn escape_text(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace("\r\n", "\\n")
        .replace('\n', "\\n")
}

/// Folds a content line at 75 octets without splitting a UTF-8 character
fn fold_line(line: &str) -> String {
    let mut folded = String::with_capacity(line.len() + line.len() / LINE_LIMIT * 3);
    let mut width = 0;

    for ch in line.chars() {
        let len = ch.len_utf8();
        if width + len > LINE_LIMIT {
            folded.push_str("\r\n ");
            width = 1;
        }
        folded.push(ch);
        width += len;
    }

    folded
}
