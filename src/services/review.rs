//! Review summaries for newly ingested awards, one markdown file per record.

use std::{
    fs,
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::models::award::AwardRecord;

pub const REVIEW_LABELS: [&str; 2] = ["new-award", "needs-review"];

const CHECKLIST: [&str; 5] = [
    "Award information is accurate",
    "No duplicate entries",
    "Deadlines are correct",
    "Link is valid and accessible",
    "Requirements are complete",
];

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("Failed to write review summary '{path}': {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub fn review_title(award: &AwardRecord) -> String {
    format!("New Award: {}", award.title)
}

/// Branch a reviewer would push corrections to, keyed on the id prefix
pub fn branch_name(award: &AwardRecord) -> String {
    format!("submissions/award-{}", short_id(award))
}

fn short_id(award: &AwardRecord) -> &str {
    award
        .id
        .char_indices()
        .nth(8)
        .map(|(end, _)| &award.id[..end])
        .unwrap_or(&award.id)
}

fn or_na(value: &str) -> &str {
    if value.trim().is_empty() { "N/A" } else { value }
}

pub fn review_body(award: &AwardRecord) -> String {
    let mut lines = vec![
        format!("## {}", review_title(award)),
        String::new(),
        format!("**Title:** {}", award.title),
        format!("**Level:** {}", or_na(&award.level)),
        format!("**Final Deadline:** {}", award.deadline_label()),
    ];
    if !award.internal_deadline.is_empty() {
        lines.push(format!("**Internal Deadline:** {}", award.internal_deadline));
    }

    lines.extend([
        String::new(),
        String::from("### Details"),
        format!("- **Application Mode:** {}", or_na(&award.application_mode)),
        format!("- **Award For:** {}", or_na(&award.award_for)),
        format!("- **Type:** {}", or_na(&award.award_type)),
        format!("- **Link:** [View Award]({})", award.link),
        String::new(),
        String::from("### Requirements"),
        or_na(&award.requirements).to_string(),
        String::new(),
        String::from("### Previous Awardees"),
        or_na(&award.previous_awardees).to_string(),
        String::new(),
        String::from("### Review Checklist"),
    ]);
    lines.extend(CHECKLIST.iter().map(|item| format!("- [ ] {}", item)));

    lines.extend([
        String::new(),
        String::from("---"),
        format!("Labels: {}", REVIEW_LABELS.join(", ")),
        format!("Branch: `{}`", branch_name(award)),
        format!("Award ID: {}", award.id),
    ]);

    lines.join("\n") + "\n"
}

/// Writes `award-<id prefix>.md` into `dir`
pub fn write_review(dir: &Path, award: &AwardRecord) -> Result<PathBuf, ReviewError> {
    let path = dir.join(format!("award-{}.md", short_id(award)));

    fs::create_dir_all(dir)
        .and_then(|_| fs::write(&path, review_body(award)))
        .map_err(|e| ReviewError::WriteFailed {
            path: path.clone(),
            source: e,
        })?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission() -> AwardRecord {
        AwardRecord {
            id: String::from("3f2a9c4e-1b7d-4e55-9a0c-6d8e2f1b3a77"),
            title: String::from("Goldwater Scholarship"),
            deadline_month: String::from("March"),
            deadline_day: 15,
            deadline_date: String::from("2027-03-15"),
            level: String::from("National"),
            application_mode: String::from("Online"),
            award_for: String::from("Undergrad"),
            award_type: String::from("Scholarship"),
            link: String::from("https://goldwater.gov"),
            ..AwardRecord::default()
        }
    }

    #[test]
    fn test_title_and_branch() {
        let award = submission();
        assert_eq!(review_title(&award), "New Award: Goldwater Scholarship");
        assert_eq!(branch_name(&award), "submissions/award-3f2a9c4e");
    }

    #[test]
    fn test_short_ids_are_kept_whole() {
        let award = AwardRecord {
            id: String::from("abc"),
            ..submission()
        };
        assert_eq!(branch_name(&award), "submissions/award-abc");
    }

    #[test]
    fn test_body() {
        let body = review_body(&submission());

        assert!(body.starts_with("## New Award: Goldwater Scholarship\n"));
        assert!(body.contains("**Final Deadline:** March 15\n"));
        assert!(!body.contains("Internal Deadline"));
        assert!(body.contains("### Requirements\nN/A\n"));
        assert!(body.contains("- [ ] Deadlines are correct\n"));
        assert!(body.ends_with("Award ID: 3f2a9c4e-1b7d-4e55-9a0c-6d8e2f1b3a77\n"));
    }

    #[test]
    fn test_body_layout_with_internal_deadline() {
        let award = AwardRecord {
            internal_deadline: String::from("2027-02-15"),
            requirements: String::from("GPA 3.5+"),
            ..submission()
        };
        let body = review_body(&award);

        assert!(body.contains(
            "**Final Deadline:** March 15\n**Internal Deadline:** 2027-02-15\n\n### Details\n"
        ));
        assert!(body.contains("### Requirements\nGPA 3.5+\n\n### Previous Awardees\nN/A\n"));
        assert_eq!(body.matches("- [ ] ").count(), 5);
        assert!(!body.contains("\n\n\n"));
    }

    #[test]
    fn test_write_review() {
        let dir = tempfile::tempdir().unwrap();
        let reviews = dir.path().join("reviews");

        let path = write_review(&reviews, &submission()).unwrap();

        assert_eq!(path, reviews.join("award-3f2a9c4e.md"));
        assert_eq!(fs::read_to_string(path).unwrap(), review_body(&submission()));
    }
}
