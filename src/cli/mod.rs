//! Command-line front end over the engine: balance projections, month summaries,
//! and CPF breakdowns.

mod commands;
pub mod output;
pub mod table;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;

use crate::{
    config::{ConfigManager, EngineConfig},
    core::services::ServiceError,
    domain::YearMonth,
    errors::EngineError,
    projection::ChartMode,
};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Parser)]
#[command(name = "cashflow_cli", version, about = "Recurring cashflow projections")]
pub struct Cli {
    /// Configuration file to use instead of the one in the application directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Project the running balance month by month.
    Project(ProjectArgs),
    /// Resolve every item for a single month.
    Month(MonthArgs),
    /// Compute the CPF split for a monthly wage.
    Cpf(CpfArgs),
    /// Print build metadata.
    Version,
}

#[derive(Debug, Args)]
pub struct SnapshotArgs {
    /// Snapshot file with `incomes`, `expenses`, and `investments` lists.
    #[arg(long)]
    pub snapshot: Option<PathBuf>,
    /// Reference date for historical/future classification (defaults to today).
    #[arg(long)]
    pub today: Option<NaiveDate>,
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ProjectArgs {
    #[command(flatten)]
    pub snapshot: SnapshotArgs,
    #[arg(long)]
    pub months: Option<u32>,
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub starting_balance: Decimal,
    /// Anchor month (defaults to the month of `--today`).
    #[arg(long)]
    pub start: Option<YearMonth>,
    #[arg(long)]
    pub no_investments: bool,
    /// Count CPF-subject incomes before the employee contribution.
    #[arg(long)]
    pub gross: bool,
    #[arg(long, value_enum, default_value_t = CliChartMode::Cumulative)]
    pub mode: CliChartMode,
}

#[derive(Debug, Args)]
pub struct MonthArgs {
    #[command(flatten)]
    pub snapshot: SnapshotArgs,
    /// Month to resolve (defaults to the month of `--today`).
    #[arg(long)]
    pub month: Option<YearMonth>,
    /// Also show the previous month and the change since then.
    #[arg(long)]
    pub compare: bool,
}

#[derive(Debug, Args)]
pub struct CpfArgs {
    #[arg(long)]
    pub wage: Decimal,
    #[arg(long)]
    pub age: u32,
    #[arg(long)]
    pub json: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliChartMode {
    Cumulative,
    #[value(alias = "non-cumulative")]
    Flow,
}

impl From<CliChartMode> for ChartMode {
    fn from(value: CliChartMode) -> Self {
        match value {
            CliChartMode::Cumulative => ChartMode::Cumulative,
            CliChartMode::Flow => ChartMode::NonCumulative,
        }
    }
}

/// Parses the process arguments and runs the selected command.
pub fn run_cli() -> Result<(), CliError> {
    run(Cli::parse())
}

pub fn run(cli: Cli) -> Result<(), CliError> {
    if let Command::Version = cli.command {
        return commands::version();
    }
    let config = load_config(cli.config)?;
    match cli.command {
        Command::Project(args) => commands::project(&config, args),
        Command::Month(args) => commands::month(&config, args),
        Command::Cpf(args) => commands::cpf(&config, args),
        Command::Version => commands::version(),
    }
}

fn load_config(path: Option<PathBuf>) -> Result<EngineConfig, CliError> {
    let manager = match path {
        Some(path) => ConfigManager::at_path(path),
        None => ConfigManager::new()?,
    };
    Ok(manager.load()?)
}
