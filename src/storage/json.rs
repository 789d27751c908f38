use std::{
    fs::{self, OpenOptions, rename, write},
    path::{Path, PathBuf},
};

use fs2::FileExt;
use serde_json::to_string_pretty;
use tracing::debug;
use uuid::Uuid;

use crate::{
    models::collection::{AwardCollection, CURRENT_VERSION},
    storage::{
        Storage, StorageError,
        migrations::{apply_migrations, detect_version, major_version},
    },
};

/// Number of previous versions kept in `backups/`
const BACKUPS_KEPT: usize = 5;

pub struct JsonFileStorage {
    path: PathBuf,
    must_exist: bool,
}

impl JsonFileStorage {
    /// Storage where a missing file loads as an empty collection
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            must_exist: false,
        }
    }

    /// Storage for readers that need an existing collection file
    pub fn existing(path: PathBuf) -> Self {
        Self {
            path,
            must_exist: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn create_backup_dir(&self) -> Result<(), StorageError> {
        let backups_dir = self.get_backup_dir();
        fs::create_dir(&backups_dir).map_err(|e| StorageError::BackupFailed {
            path: backups_dir,
            source: e,
        })?;
        Ok(())
    }

    fn create_backup(&self) -> Result<u64, StorageError> {
        let file_exists = fs::exists(&self.path).map_err(|e| StorageError::BackupFailed {
            path: self.path.clone(),
            source: e,
        })?;
        if !file_exists {
            return Ok(0);
        }

        let backup_path = self.get_backup_path();
        let copy_result = fs::copy(&self.path, &backup_path);
        match copy_result {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.create_backup_dir()?;
                self.create_backup()
            }
            Err(e) => Err(StorageError::BackupFailed {
                path: backup_path,
                source: e,
            }),
            Ok(bytes) => {
                debug!(backup = %backup_path.display(), bytes, "created backup");
                Ok(bytes)
            }
        }
    }

    fn cleanup_old_backups(&self) -> Result<(), StorageError> {
        let backup_dir = self.get_backup_dir();
        let backup_dir_exists =
            fs::exists(&backup_dir).map_err(|e| StorageError::CleanupFailed {
                dir: backup_dir.clone(),
                source: e,
            })?;
        if !backup_dir_exists {
            return Ok(());
        }

        let prefix = format!("{}-", self.file_name());
        let mut file_entries = fs::read_dir(&backup_dir)
            .map_err(|e| StorageError::CleanupFailed {
                dir: backup_dir.clone(),
                source: e,
            })?
            .flatten()
            .filter(|entry| entry.metadata().map(|m| m.is_file()).unwrap_or(false))
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(&prefix))
            .map(|entry| entry.path())
            .collect::<Vec<_>>();

        file_entries.sort();

        let number_of_files_to_delete = file_entries.len().saturating_sub(BACKUPS_KEPT);
        if number_of_files_to_delete == 0 {
            return Ok(());
        }

        for file_path in &file_entries[0..number_of_files_to_delete] {
            fs::remove_file(file_path).map_err(|e| StorageError::CleanupFailed {
                dir: backup_dir.clone(),
                source: e,
            })?;
        }

        Ok(())
    }

    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| String::from("awards.json"))
    }

    fn get_backup_dir(&self) -> PathBuf {
        let parent_store_path = self.path.parent().unwrap_or(Path::new("."));
        parent_store_path.join("backups")
    }

    fn get_backup_path(&self) -> PathBuf {
        let backups_dir = self.get_backup_dir();

        // Nanoseconds since the epoch sort lexicographically for centuries
        let timestamp = jiff::Timestamp::now().as_nanosecond();
        let filename = format!("{}-{}", self.file_name(), timestamp);

        backups_dir.join(filename)
    }

    fn parse_failed(&self, source: serde_json::Error) -> StorageError {
        StorageError::ParseFailed {
            path: self.path.clone(),
            source,
        }
    }
}

impl Storage for JsonFileStorage {
    fn load(&self) -> Result<AwardCollection, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return if self.must_exist {
                    Err(StorageError::NotFound(self.path.clone()))
                } else {
                    Ok(AwardCollection::default())
                };
            }
            Err(e) => {
                return Err(StorageError::LoadFailed {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };

        let mut data: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| self.parse_failed(e))?;

        if !data.get("awards").is_some_and(|awards| awards.is_array()) {
            return Err(StorageError::MissingAwards(self.path.clone()));
        }

        let file_version = detect_version(&data)?;
        let file_major = major_version(&file_version)?;
        let current_major = major_version(CURRENT_VERSION)?;

        if file_major > current_major {
            return Err(StorageError::FutureVersion(file_version));
        }

        if file_major < current_major {
            debug!(from = %file_version, to = CURRENT_VERSION, "migrating awards file");
            data = apply_migrations(data, file_major, current_major)?;
        }

        if let Some(obj) = data.as_object_mut() {
            obj.insert("version".to_string(), serde_json::json!(CURRENT_VERSION));
            // Older files may lack the timestamp
            obj.entry("lastUpdated")
                .or_insert_with(|| serde_json::json!(jiff::Timestamp::now()));
        }

        serde_json::from_value(data).map_err(|e| self.parse_failed(e))
    }

    fn save(&self, collection: &AwardCollection) -> Result<(), StorageError> {
        let json = to_string_pretty(collection)
            .map_err(|e| StorageError::SerializeFailed { source: e })?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| StorageError::SaveFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let unique_temp = format!("{}.tmp.{}", self.path.display(), Uuid::new_v4());
        let temp_path = PathBuf::from(&unique_temp);
        write(&temp_path, json).map_err(|e| StorageError::SaveFailed {
            path: temp_path.clone(),
            source: e,
        })?;

        let lock_file_path = self.path.with_extension("lock");
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_file_path)
            .map_err(|e| StorageError::SaveFailed {
                path: lock_file_path.clone(),
                source: e,
            })?;
        lock_file
            .lock_exclusive()
            .map_err(|e| StorageError::SaveFailed {
                path: lock_file_path,
                source: e,
            })?;

        self.create_backup()?;
        self.cleanup_old_backups()?;

        rename(&temp_path, &self.path).map_err(|e| StorageError::SaveFailed {
            path: self.path.clone(),
            source: e,
        })?;

        lock_file.unlock().map_err(|e| StorageError::SaveFailed {
            path: self.path.clone(),
            source: e,
        })?;

        debug!(path = %self.path.display(), awards = collection.len(), "saved awards file");
        Ok(())
    }
}
