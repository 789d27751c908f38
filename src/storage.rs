use std::path::PathBuf;

use thiserror::Error;

use crate::models::collection::AwardCollection;

pub mod cursor;
pub mod json;
pub mod migrations;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Awards file '{0}' does not exist")]
    NotFound(PathBuf),

    #[error("Failed to load '{path}': {source}")]
    LoadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON from '{path}': {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Missing or invalid \"awards\" array in '{0}'")]
    MissingAwards(PathBuf),

    #[error("Invalid \"version\" value {0} (expected a string such as \"2.0\")")]
    InvalidVersion(String),

    #[error("Failed to save '{path}': {source}")]
    SaveFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize to JSON: {source}")]
    SerializeFailed {
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to create backup at '{path}': {source}")]
    BackupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to cleanup old backups in '{dir}': {source}")]
    CleanupFailed {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Awards file was written by a newer schema (version {0}). Please upgrade to open this file."
    )]
    FutureVersion(String),

    #[error("Awards file has unsupported version {0}.")]
    UnsupportedVersion(String),
}

impl StorageError {
    /// The file exists but its content is not a usable award collection
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            StorageError::ParseFailed { .. }
                | StorageError::MissingAwards(_)
                | StorageError::InvalidVersion(_)
        )
    }
}

pub trait Storage {
    fn load(&self) -> Result<AwardCollection, StorageError>;
    fn save(&self, collection: &AwardCollection) -> Result<(), StorageError>;
}
