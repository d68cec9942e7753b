use std::{fs, path::Path};

use serde::{de::DeserializeOwned, Serialize};

use crate::errors::EngineError;

/// Writes `value` as pretty JSON, staging through a temporary file before renaming.
pub fn save_json_to_file<T: Serialize>(value: &T, path: &Path) -> Result<(), EngineError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    let json = serde_json::to_string_pretty(value)?;
    fs::write(&tmp, json)?;
    fs::rename(tmp, path)?;
    Ok(())
}

/// Reads a JSON document from disk, returning structured errors on failure.
pub fn load_json_from_file<T: DeserializeOwned>(path: &Path) -> Result<T, EngineError> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}
