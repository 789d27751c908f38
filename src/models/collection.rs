use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::models::award::AwardRecord;

/// Current schema version
pub const CURRENT_VERSION: &str = "2.0";

/// The persisted award collection (`awards.json`).
///
/// `awards` keeps append order; display order is decided by the filter view.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AwardCollection {
    pub awards: Vec<AwardRecord>,
    pub last_updated: Timestamp,
    pub version: String,
}

impl Default for AwardCollection {
    fn default() -> Self {
        Self {
            awards: vec![],
            last_updated: Timestamp::now(),
            version: CURRENT_VERSION.to_string(),
        }
    }
}

impl AwardCollection {
    /// First record sharing the `(title.lowercased, link)` duplicate key
    pub fn find_duplicate(&self, title: &str, link: &str) -> Option<&AwardRecord> {
        self.awards
            .iter()
            .find(|award| award.has_duplicate_key(title, link))
    }

    pub fn get_award(&self, id: &str) -> Option<&AwardRecord> {
        self.awards.iter().find(|award| award.id == id)
    }

    /// Appends a record and bumps `last_updated`
    pub fn append(&mut self, award: AwardRecord, now: Timestamp) {
        self.awards.push(award);
        self.last_updated = now;
    }

    pub fn len(&self) -> usize {
        self.awards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.awards.is_empty()
    }
}
