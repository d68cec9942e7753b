use std::path::{Path, PathBuf};

use crate::utils::persistence::{load_json_from_file, save_json_to_file};

use super::{RawSnapshot, Result, Snapshot, SnapshotSource};

/// Snapshot stored as a single JSON document:
/// `{ "incomes": [...], "expenses": [...], "investments": [...] }`.
#[derive(Debug, Clone)]
pub struct JsonSnapshotFile {
    path: PathBuf,
}

impl JsonSnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_raw(&self) -> Result<RawSnapshot> {
        load_json_from_file(&self.path)
    }

    pub fn save_raw(&self, snapshot: &RawSnapshot) -> Result<()> {
        save_json_to_file(snapshot, &self.path)
    }
}

impl SnapshotSource for JsonSnapshotFile {
    fn load(&self) -> Result<Snapshot> {
        let raw = self.load_raw()?;
        tracing::debug!(
            path = %self.path.display(),
            incomes = raw.incomes.len(),
            expenses = raw.expenses.len(),
            investments = raw.investments.len(),
            "loaded snapshot"
        );
        Ok(raw.into_snapshot())
    }
}
