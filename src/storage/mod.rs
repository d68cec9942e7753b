//! Boundary between stored records and the typed items the engine consumes.
//!
//! Records keep nested payloads as JSON text; they are decoded here once, so the
//! schedule and projection code never sees raw strings.

pub mod json_backend;
pub mod records;

use serde::{Deserialize, Serialize};

use crate::{
    domain::{FinancialItem, ItemKind},
    errors::EngineError,
};

pub use json_backend::JsonSnapshotFile;
pub use records::{RawFinancialItem, Stored};

pub type Result<T> = std::result::Result<T, EngineError>;

/// Anything that can hand the engine a full set of item definitions.
pub trait SnapshotSource: Send + Sync {
    fn load(&self) -> Result<Snapshot>;
}

/// Stored form of a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSnapshot {
    #[serde(deserialize_with = "records::lenient_list")]
    pub incomes: Vec<RawFinancialItem>,
    #[serde(deserialize_with = "records::lenient_list")]
    pub expenses: Vec<RawFinancialItem>,
    #[serde(deserialize_with = "records::lenient_list")]
    pub investments: Vec<RawFinancialItem>,
}

impl RawSnapshot {
    pub fn into_snapshot(self) -> Snapshot {
        let convert = |records: Vec<RawFinancialItem>, kind: ItemKind| -> Vec<FinancialItem> {
            records
                .into_iter()
                .map(|record| record.into_item(kind))
                .collect()
        };
        Snapshot {
            incomes: convert(self.incomes, ItemKind::Income),
            expenses: convert(self.expenses, ItemKind::Expense),
            investments: convert(self.investments, ItemKind::Investment),
        }
    }
}

/// Typed item definitions for one calculation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub incomes: Vec<FinancialItem>,
    pub expenses: Vec<FinancialItem>,
    pub investments: Vec<FinancialItem>,
}

impl Snapshot {
    pub fn items(&self) -> impl Iterator<Item = &FinancialItem> {
        self.incomes
            .iter()
            .chain(&self.expenses)
            .chain(&self.investments)
    }

    /// Items the boundary could not read cleanly.
    pub fn degraded(&self) -> impl Iterator<Item = &FinancialItem> {
        self.items().filter(|item| !item.defects.is_empty())
    }
}

impl SnapshotSource for Snapshot {
    fn load(&self) -> Result<Snapshot> {
        Ok(self.clone())
    }
}
