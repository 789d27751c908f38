use serde_json::Value;

use crate::{normalize::list::normalize_list, storage::StorageError};

type MigrationFn = fn(Value) -> Result<Value, StorageError>;

/// Migration `i` upgrades major version `i + 1` to `i + 2`
fn get_migrations() -> Vec<MigrationFn> {
    vec![migrate_v1_to_v2]
}

/// Returns "1.0" if the version field is missing (the first, workbook-era
/// schema)
pub fn detect_version(data: &Value) -> Result<String, StorageError> {
    match data.get("version") {
        Some(Value::String(version)) => Ok(version.clone()),
        Some(Value::Number(number)) => Ok(number.to_string()),
        Some(other) => Err(StorageError::InvalidVersion(other.to_string())),
        None => Ok(String::from("1.0")),
    }
}

/// Major component of a "major.minor" version
pub fn major_version(version: &str) -> Result<u32, StorageError> {
    version
        .split('.')
        .next()
        .and_then(|major| major.trim().parse().ok())
        .ok_or_else(|| StorageError::InvalidVersion(format!("\"{}\"", version)))
}

/// Migrations are applied sequentially: v1→v2→v3→...→target
pub fn apply_migrations(
    mut data: Value,
    from_version: u32,
    to_version: u32,
) -> Result<Value, StorageError> {
    if from_version == to_version {
        return Ok(data);
    }

    if from_version > to_version {
        return Err(StorageError::FutureVersion(from_version.to_string()));
    }

    let migrations = get_migrations();

    for version in from_version..to_version {
        let migration_idx = version.checked_sub(1).map(|idx| idx as usize);

        match migration_idx.and_then(|idx| migrations.get(idx)) {
            Some(migration) => data = migration(data)?,
            None => return Err(StorageError::UnsupportedVersion(version.to_string())),
        }
    }

    Ok(data)
}

/// v1 files kept the spreadsheet's semicolon-joined category cells verbatim.
/// v2 stores the canonical comma-joined form.
fn migrate_v1_to_v2(mut value: Value) -> Result<Value, StorageError> {
    if let Some(obj) = value.as_object_mut() {
        obj.insert("version".to_string(), Value::from("2.0"));

        if let Some(awards) = obj.get_mut("awards").and_then(|a| a.as_array_mut()) {
            for award in awards {
                let Some(award_obj) = award.as_object_mut() else {
                    continue;
                };
                for field in ["level", "awardFor", "type"] {
                    let canonical = match award_obj.get(field) {
                        Some(Value::String(raw)) => normalize_list(&raw.replace(';', ","), ','),
                        _ => continue,
                    };
                    award_obj.insert(field.to_string(), Value::from(canonical));
                }
            }
        }
    }

    Ok(value)
}
