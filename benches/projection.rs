use cashflow_engine::{
    core::services::SummaryService,
    domain::{
        CustomMonths, FinancialItem, Frequency, FutureMilestone, PastIncomeEntry, YearMonth,
    },
    projection::{project, ProjectionRequest},
    schedule::ResolutionContext,
    storage::{JsonSnapshotFile, RawSnapshot, Snapshot, SnapshotSource},
};
use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rust_decimal::Decimal;
use tempfile::tempdir;

const YEARLY_HISTORY: &str = r#"[{"period":"2024","granularity":"yearly","amount":60000}]"#;

const FREQUENCIES: [Frequency; 6] = [
    Frequency::Monthly,
    Frequency::Yearly,
    Frequency::Weekly,
    Frequency::BiWeekly,
    Frequency::Custom,
    Frequency::OneTime,
];

fn build_household(item_count: usize) -> Snapshot {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let anchor = YearMonth::new(2025, 1).unwrap();
    let mut snapshot = Snapshot::default();

    for idx in 0..item_count {
        let frequency = FREQUENCIES[idx % FREQUENCIES.len()];
        let amount = Decimal::new(50_000 + (idx as i64 % 100) * 1_000, 2);
        let months = CustomMonths::from_values([(idx % 11) as i64 + 1, 12]);

        let wage = amount * Decimal::TEN;
        let mut salary = FinancialItem::income(format!("Income {idx}"), wage, frequency)
            .with_start_date(start)
            .with_custom_months(months.clone());
        if idx % 4 == 0 {
            salary = salary
                .with_cpf(amount * Decimal::TWO)
                .with_history(vec![PastIncomeEntry::monthly(anchor.offset(-2), wage)])
                .with_milestones(vec![FutureMilestone::new(
                    anchor.offset(18),
                    wage + amount,
                )]);
        }
        snapshot.incomes.push(salary);

        snapshot.expenses.push(
            FinancialItem::expense(format!("Expense {idx}"), amount, frequency)
                .with_category(format!("Category {}", idx % 8))
                .with_start_date(start)
                .with_custom_months(months),
        );

        if idx % 5 == 0 {
            snapshot.investments.push(FinancialItem::investment(
                format!("Fund {idx}"),
                amount * Decimal::ONE_HUNDRED,
                Decimal::new(5, 0),
                amount,
                Frequency::Monthly,
            ));
        }
    }
    snapshot
}

fn bench_projection(c: &mut Criterion) {
    let snapshot = build_household(black_box(48));
    let today = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
    let request = ProjectionRequest::new(240, Decimal::new(1_000_000, 2));

    c.bench_function("project_240_months", |b| {
        b.iter(|| {
            let projection = project(
                &snapshot.incomes,
                &snapshot.expenses,
                Some(&snapshot.investments),
                &request,
                today,
            );
            black_box(projection);
        })
    });

    let ctx = ResolutionContext::new(today);
    let month = YearMonth::new(2025, 6).unwrap();
    c.bench_function("month_summary", |b| {
        b.iter(|| {
            let summary = SummaryService::month_summary(&snapshot, month, &ctx);
            black_box(summary);
        })
    });
}

fn bench_snapshot_load(c: &mut Criterion) {
    let dir = tempdir().expect("tempdir");
    let file = JsonSnapshotFile::new(dir.path().join("snapshot.json"));
    let raw: RawSnapshot = serde_json::from_value(serde_json::json!({
        "incomes": (0..200)
            .map(|idx| serde_json::json!({
                "id": idx.to_string(),
                "name": format!("Income {idx}"),
                "amount": 4200 + idx,
                "frequency": "monthly",
                "pastIncomeHistory": YEARLY_HISTORY
            }))
            .collect::<Vec<_>>(),
        "expenses": (0..200)
            .map(|idx| serde_json::json!({
                "name": format!("Expense {idx}"),
                "amount": 120 + idx,
                "frequency": "custom",
                "customMonths": "[1, 4, 7, 10]"
            }))
            .collect::<Vec<_>>(),
    }))
    .expect("raw snapshot");
    file.save_raw(&raw).expect("seed snapshot");

    c.bench_function("snapshot_load_400", |b| {
        b.iter(|| {
            let snapshot = file.load().expect("load snapshot");
            black_box(snapshot);
        })
    });
}

criterion_group!(benches, bench_projection, bench_snapshot_load);
criterion_main!(benches);
