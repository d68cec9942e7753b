#![allow(dead_code)]

use std::path::PathBuf;

use cashflow_engine::domain::YearMonth;
use chrono::NaiveDate;
use serde_json::{json, Value};
use tempfile::TempDir;

pub fn ym(year: i32, month: u32) -> YearMonth {
    YearMonth::new(year, month).expect("valid month")
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

/// Writes `snapshot` into a fresh temporary directory. Keep the guard alive for
/// as long as the file is needed.
pub fn write_snapshot(snapshot: &Value) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("snapshot.json");
    std::fs::write(&path, serde_json::to_string_pretty(snapshot).expect("encode"))
        .expect("write snapshot");
    (dir, path)
}

/// A household as the CRUD layer stores it, including one corrupt record.
pub fn household_snapshot() -> Value {
    json!({
        "incomes": [
            {
                "id": "1",
                "name": "Salary",
                "category": "Employment",
                "amount": 6000,
                "frequency": "monthly",
                "startDate": "2023-01-01",
                "subjectToCpf": true,
                "employeeCpfContribution": 1200,
                "pastIncomeHistory": "[{\"period\":\"2024-12\",\"granularity\":\"monthly\",\"amount\":6500}]",
                "futureMilestones": "[{\"targetMonth\":\"2025-04\",\"amount\":7000}]",
                "accountForFutureChange": true
            },
            {
                "id": "2",
                "name": "Bonus",
                "amount": 9000,
                "frequency": "one-time",
                "startDate": "2025-03-20T00:00:00.000Z"
            }
        ],
        "expenses": [
            {"id": "10", "name": "Rent", "category": "Housing", "amount": 2500, "frequency": "Monthly"},
            {"id": "11", "name": "Insurance", "category": "Housing", "amount": 1800, "frequency": "yearly"},
            {
                "id": "12",
                "name": "Road tax",
                "category": "Transport",
                "amount": 600,
                "frequency": "custom",
                "customMonths": "[2, 8]"
            },
            {
                "id": "13",
                "name": "Corrupt",
                "amount": 999,
                "frequency": "custom",
                "customMonths": "[2, \"eight\""
            }
        ],
        "investments": [
            {
                "id": "20",
                "name": "Index fund",
                "amount": 500,
                "frequency": "monthly",
                "currentCapital": 10000,
                "projectedYield": 6
            }
        ]
    })
}
