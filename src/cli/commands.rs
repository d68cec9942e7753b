use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    config::EngineConfig,
    core::{
        services::{CategoryTotal, MonthComparison, MonthSummary, SummaryService},
        utils::default_snapshot_file,
    },
    domain::{RecordDefect, YearMonth},
    projection::{
        ChartMode, ChartPoint, IncomeBasis, MonthlyBalanceFrame, Projection, ProjectionRequest,
        ProjectionTotals, SpecialItemKind,
    },
    schedule::{
        overrides::ResolutionContext,
        time::{Clock, SystemClock},
    },
    storage::{JsonSnapshotFile, Snapshot, SnapshotSource},
    utils::build_info,
};

use super::{
    output,
    table::{Table, TableColumn},
    CliError, CpfArgs, MonthArgs, ProjectArgs, SnapshotArgs,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LowestPoint {
    month: YearMonth,
    balance: Decimal,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectionReport<'a> {
    request: &'a ProjectionRequest,
    final_balance: Option<Decimal>,
    lowest_point: Option<LowestPoint>,
    totals: ProjectionTotals,
    chart: Vec<ChartPoint>,
    frames: &'a [MonthlyBalanceFrame],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MonthReport {
    summary: MonthSummary,
    categories: Vec<CategoryTotal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comparison: Option<MonthComparison>,
}

pub(super) fn project(config: &EngineConfig, args: ProjectArgs) -> Result<(), CliError> {
    let snapshot = load_snapshot(&args.snapshot)?;
    let calculator = config.calculator()?;
    let ctx = ResolutionContext::new(reference_date(&args.snapshot))
        .with_cpf(&calculator)
        .with_age(config.age);

    let mut request = config.projection_request(args.starting_balance);
    if let Some(months) = args.months {
        request.months = months;
    }
    if let Some(start) = args.start {
        request = request.starting_at(start);
    }
    if args.no_investments {
        request.include_investments = false;
    }
    if args.gross {
        request.income_basis = IncomeBasis::Gross;
    }

    let projection = SummaryService::project(&snapshot, &request, &ctx)?;
    let mode = ChartMode::from(args.mode);
    if args.snapshot.json {
        let report = ProjectionReport {
            request: &request,
            final_balance: projection.final_balance(),
            lowest_point: projection.lowest_point().map(|frame| LowestPoint {
                month: frame.month,
                balance: frame.cumulative_balance,
            }),
            totals: projection.totals(),
            chart: projection.chart(mode),
            frames: &projection.frames,
        };
        output::json(&report)?;
        return Ok(());
    }

    render_projection(&projection, mode, &config.currency);
    Ok(())
}

pub(super) fn month(config: &EngineConfig, args: MonthArgs) -> Result<(), CliError> {
    let snapshot = load_snapshot(&args.snapshot)?;
    let calculator = config.calculator()?;
    let today = reference_date(&args.snapshot);
    let ctx = ResolutionContext::new(today)
        .with_cpf(&calculator)
        .with_age(config.age);
    let month = args.month.unwrap_or_else(|| YearMonth::from_date(today));

    let summary = SummaryService::month_summary(&snapshot, month, &ctx);
    let mut categories = SummaryService::category_totals(&snapshot.incomes, month, &ctx);
    categories.extend(SummaryService::category_totals(
        &snapshot.expenses,
        month,
        &ctx,
    ));
    let comparison = args
        .compare
        .then(|| SummaryService::compare_with_previous(&snapshot, month, &ctx));

    if args.snapshot.json {
        output::json(&MonthReport {
            summary,
            categories,
            comparison,
        })?;
        return Ok(());
    }

    render_month(&summary, &categories, &config.currency);
    if let Some(comparison) = comparison {
        render_comparison(&comparison);
    }
    Ok(())
}

pub(super) fn cpf(config: &EngineConfig, args: CpfArgs) -> Result<(), CliError> {
    let calculator = config.calculator()?;
    let breakdown = SummaryService::cpf_breakdown(&calculator, args.wage, args.age)?;
    if args.json {
        output::json(&breakdown)?;
        return Ok(());
    }

    output::section(format!("CPF breakdown (age {}, {})", args.age, config.currency));
    output::info(format!("Gross wage:          {}", output::money(breakdown.gross_wage)));
    output::info(format!(
        "Contributory wage:   {} (ceiling {})",
        output::money(breakdown.contributory_wage),
        output::money(calculator.ceiling())
    ));
    output::info(format!(
        "Employee ({}%):      {}",
        percent(breakdown.employee_rate),
        output::money(breakdown.employee_contribution)
    ));
    output::info(format!(
        "Employer ({}%):      {}",
        percent(breakdown.employer_rate),
        output::money(breakdown.employer_contribution)
    ));
    output::info(format!(
        "Total contribution:  {}",
        output::money(breakdown.total_contribution)
    ));
    output::success(format!(
        "Net take-home:       {}",
        output::money(breakdown.net_take_home)
    ));
    Ok(())
}

pub(super) fn version() -> Result<(), CliError> {
    output::info(build_info::current().summary());
    Ok(())
}

fn load_snapshot(args: &SnapshotArgs) -> Result<Snapshot, CliError> {
    let path = args.snapshot.clone().unwrap_or_else(default_snapshot_file);
    let snapshot = JsonSnapshotFile::new(path).load()?;
    if !args.json {
        for item in snapshot.degraded() {
            let defects: Vec<String> = item.defects.iter().map(describe_defect).collect();
            output::warning(format!("{} was only partly read: {}", item.name, defects.join(", ")));
        }
    }
    Ok(snapshot)
}

fn reference_date(args: &SnapshotArgs) -> NaiveDate {
    args.today.unwrap_or_else(|| SystemClock.today())
}

fn describe_defect(defect: &RecordDefect) -> String {
    match defect {
        RecordDefect::MalformedCustomMonths => "unreadable custom months".into(),
        RecordDefect::UnrecognizedFrequency(raw) => format!("unknown frequency `{raw}`"),
        RecordDefect::MalformedStartDate(raw) => format!("unreadable start date `{raw}`"),
        RecordDefect::MalformedEndDate(raw) => format!("unreadable end date `{raw}`"),
        RecordDefect::MalformedIncomeHistory => "unreadable income history".into(),
        RecordDefect::MalformedMilestones => "unreadable milestones".into(),
        RecordDefect::MalformedAmount { field, raw } => format!("unreadable {field} `{raw}`"),
        RecordDefect::MalformedField(field) => format!("unreadable {field}, default used"),
        RecordDefect::UnreadableRecord => "not a record".into(),
    }
}

fn percent(rate: Decimal) -> Decimal {
    (rate * Decimal::ONE_HUNDRED).normalize()
}

fn render_projection(projection: &Projection, mode: ChartMode, currency: &str) {
    let with_investments = projection
        .frames
        .iter()
        .any(|frame| frame.balance_with_investments.is_some());

    let mut columns = vec![TableColumn::left("Month")];
    match mode {
        ChartMode::Cumulative => {
            columns.push(TableColumn::right("Balance"));
            if with_investments {
                columns.push(TableColumn::right("With investments"));
            }
        }
        ChartMode::NonCumulative => {
            columns.push(TableColumn::right("Income"));
            columns.push(TableColumn::right("Expense"));
            columns.push(TableColumn::right("Net"));
        }
    }
    columns.push(TableColumn::left("Events"));

    let mut table = Table::new(columns);
    for (frame, point) in projection.frames.iter().zip(projection.chart(mode)) {
        let mut row = vec![point.label().to_string()];
        match point {
            ChartPoint::Cumulative {
                balance,
                balance_with_investments,
                ..
            } => {
                row.push(output::money(balance));
                if with_investments {
                    row.push(balance_with_investments.map(output::money).unwrap_or_default());
                }
            }
            ChartPoint::NonCumulative {
                income,
                expense,
                net,
                ..
            } => {
                row.push(output::money(income));
                row.push(output::money(expense));
                row.push(output::money(net));
            }
        }
        row.push(events(frame));
        table.push(row);
    }

    output::section(format!("Balance projection ({currency})"));
    output::info(table.render());

    let totals = projection.totals();
    output::info("");
    if let Some(balance) = projection.final_balance() {
        output::info(format!("Final balance:  {}", output::money(balance)));
    }
    if let Some(lowest) = projection.lowest_point() {
        output::info(format!(
            "Lowest balance: {} in {}",
            output::money(lowest.cumulative_balance),
            lowest.label
        ));
    }
    output::info(format!(
        "Total income {} / expense {} / net {}",
        output::money(totals.income),
        output::money(totals.expense),
        output::money(totals.net)
    ));
}

fn events(frame: &MonthlyBalanceFrame) -> String {
    frame
        .special_items
        .iter()
        .map(|item| {
            let sign = match item.kind {
                SpecialItemKind::OneOffIncome => '+',
                SpecialItemKind::OneOffExpense | SpecialItemKind::CustomExpense => '-',
            };
            format!("{} {}{:.2}", item.name, sign, item.amount)
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn render_month(summary: &MonthSummary, categories: &[CategoryTotal], currency: &str) {
    output::section(format!(
        "{} ({:?}, {currency})",
        summary.month.label(),
        summary.phase
    ));

    let mut lines = Table::new(vec![
        TableColumn::left("Item"),
        TableColumn::left("Kind"),
        TableColumn::right("Amount"),
        TableColumn::right("CPF"),
        TableColumn::left("Source"),
    ]);
    for line in &summary.lines {
        lines.push(vec![
            line.name.clone(),
            format!("{:?}", line.kind).to_lowercase(),
            output::money(line.amount),
            output::money(line.employee_cpf),
            format!("{:?}", line.source).to_lowercase(),
        ]);
    }
    output::info(lines.render());
    output::info("");
    output::info(format!("Income (gross):  {}", output::money(summary.income_gross)));
    output::info(format!("Employee CPF:    {}", output::money(summary.employee_cpf)));
    output::info(format!("Income (net):    {}", output::money(summary.income_net)));
    output::info(format!("Expenses:        {}", output::money(summary.expense)));
    output::info(format!(
        "Investments:     {}",
        output::money(summary.investment_contributions)
    ));
    output::success(format!("Net flow:        {}", output::money(summary.net_flow)));

    if categories.is_empty() {
        return;
    }
    let mut table = Table::new(vec![
        TableColumn::left("Category"),
        TableColumn::left("Kind"),
        TableColumn::right("Items"),
        TableColumn::right("Amount"),
    ]);
    for total in categories {
        table.push(vec![
            total.category.clone(),
            format!("{:?}", total.kind).to_lowercase(),
            total.items.to_string(),
            output::money(total.amount),
        ]);
    }
    output::section("By category");
    output::info(table.render());
}

fn render_comparison(comparison: &MonthComparison) {
    output::section(format!(
        "Change since {}",
        comparison.previous.month.label()
    ));
    output::info(format!(
        "Net income: {} -> {} ({})",
        output::money(comparison.previous.income_net),
        output::money(comparison.current.income_net),
        output::money(comparison.income_delta)
    ));
    output::info(format!(
        "Expenses:   {} -> {} ({})",
        output::money(comparison.previous.expense),
        output::money(comparison.current.expense),
        output::money(comparison.expense_delta)
    ));
    output::info(format!(
        "Net flow:   {} -> {} ({})",
        output::money(comparison.previous.net_flow),
        output::money(comparison.current.net_flow),
        output::money(comparison.net_flow_delta)
    ));
}
