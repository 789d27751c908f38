use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::StorageError;

/// Sheet row number where a fresh ingestion starts (the header row)
pub const INITIAL_ROW: u64 = 1;

/// Durable ingestion progress, stored as `{ "lastProcessedRow": n }`
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IngestState {
    pub last_processed_row: u64,
}

impl Default for IngestState {
    fn default() -> Self {
        Self {
            last_processed_row: INITIAL_ROW,
        }
    }
}

pub struct CursorFile {
    path: PathBuf,
}

impl CursorFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing state file means nothing was processed yet
    pub fn load(&self) -> Result<IngestState, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                serde_json::from_str(&content).map_err(|e| StorageError::ParseFailed {
                    path: self.path.clone(),
                    source: e,
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(IngestState::default()),
            Err(e) => Err(StorageError::LoadFailed {
                path: self.path.clone(),
                source: e,
            }),
        }
    }

    pub fn save(&self, state: IngestState) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(&state)
            .map_err(|e| StorageError::SerializeFailed { source: e })?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| StorageError::SaveFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let temp_path = PathBuf::from(format!("{}.tmp.{}", self.path.display(), Uuid::new_v4()));
        fs::write(&temp_path, json).map_err(|e| StorageError::SaveFailed {
            path: temp_path.clone(),
            source: e,
        })?;
        fs::rename(&temp_path, &self.path).map_err(|e| StorageError::SaveFailed {
            path: self.path.clone(),
            source: e,
        })
    }
}
