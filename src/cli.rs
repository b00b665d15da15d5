use std::fmt::Write as _;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::AppConfig;
use crate::core::{
    AssetCatalog, DEFAULT_PROJECTION_YEARS, MAX_PROJECTION_YEARS, Plan, PlanEvaluation, PlanWarning, PlannerError,
    TimeFrame, evaluate_plan, refresh_expected_yields,
};
use crate::export::{Currency, export_plan_csv, find_currency, format_currency, format_percentage};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliTimeFrame {
    OneYear,
    FiveYear,
    TenYear,
    TwentyYear,
    ThirtyYear,
}

impl From<CliTimeFrame> for TimeFrame {
    fn from(value: CliTimeFrame) -> Self {
        match value {
            CliTimeFrame::OneYear => TimeFrame::OneYear,
            CliTimeFrame::FiveYear => TimeFrame::FiveYear,
            CliTimeFrame::TenYear => TimeFrame::TenYear,
            CliTimeFrame::TwentyYear => TimeFrame::TwentyYear,
            CliTimeFrame::ThirtyYear => TimeFrame::ThirtyYear,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "retirement-buckets",
    about = "Retirement bucket planner (blended yields + withdrawal projection)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the JSON API.
    Serve {
        #[arg(long, help = "Listen port; defaults to $PORT or 8080")]
        port: Option<u16>,
    },
    /// Evaluate a plan and print the projection.
    Project(ProjectArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    #[arg(long, help = "Plan JSON file; defaults to the starter plan")]
    pub plan: Option<PathBuf>,
    #[arg(long, help = "Asset catalog (.csv or .json); defaults to $PLANNER_CATALOG or built-in")]
    pub catalog: Option<PathBuf>,
    #[arg(long, value_enum, help = "Overrides the plan's historical time frame")]
    pub time_frame: Option<CliTimeFrame>,
    #[arg(long, default_value_t = DEFAULT_PROJECTION_YEARS, help = "Projection horizon, 1 to 100 years")]
    pub years: u32,
    #[arg(long, default_value = "ILS", help = "Display currency: ILS, USD, EUR or GBP")]
    pub currency: String,
    #[arg(long, help = "Write the CSV export to this path")]
    pub export: Option<PathBuf>,
}

pub fn load_plan(path: &Path) -> Result<Plan, PlannerError> {
    let reader = BufReader::new(File::open(path)?);
    let plan = serde_json::from_reader(reader)?;
    tracing::info!(path = %path.display(), "loaded plan file");
    Ok(plan)
}

/// Runs `project`: evaluates the plan, writes the export if requested and
/// returns the printable report.
pub fn run_project(args: &ProjectArgs, config: &AppConfig) -> Result<String, String> {
    let catalog = match &args.catalog {
        Some(path) => AssetCatalog::from_path(path),
        None => config.load_catalog(),
    }
    .map_err(|e| format!("failed to load asset catalog: {e}"))?;

    let mut plan = match &args.plan {
        Some(path) => load_plan(path).map_err(|e| format!("failed to read plan {}: {e}", path.display()))?,
        None => Plan::default(),
    };
    if let Some(time_frame) = args.time_frame {
        plan.time_frame = time_frame.into();
    }
    plan.buckets = refresh_expected_yields(&plan.buckets, &catalog, plan.time_frame);

    if !(1..=MAX_PROJECTION_YEARS).contains(&args.years) {
        return Err(format!("--years must be between 1 and {MAX_PROJECTION_YEARS}"));
    }
    let currency = find_currency(&args.currency)
        .ok_or_else(|| format!("unknown currency `{}`", args.currency))?;

    if let Some(path) = &args.export {
        let csv = export_plan_csv(&plan, &catalog, currency, args.years)
            .map_err(|e| format!("failed to render export: {e}"))?;
        std::fs::write(path, csv)
            .map_err(|e| format!("failed to write export {}: {e}", path.display()))?;
        tracing::info!(path = %path.display(), "wrote plan export");
    }

    let evaluation = evaluate_plan(&plan, &catalog, args.years);
    Ok(render_report(&plan, &evaluation, currency))
}

pub fn render_report(plan: &Plan, evaluation: &PlanEvaluation, currency: Currency) -> String {
    let symbol = currency.symbol;
    let withdrawal = &plan.withdrawal_plan;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Retirement plan ({} historical data, {})",
        evaluation.time_frame.label(),
        currency.code
    );
    let _ = writeln!(
        out,
        "Total capital: {}",
        format_currency(plan.total_capital, symbol)
    );
    if withdrawal.adjust_for_inflation {
        let _ = writeln!(
            out,
            "Annual withdrawal: {} (inflation-adjusted at {}%)",
            format_currency(withdrawal.annual_amount, symbol),
            withdrawal.inflation_rate
        );
    } else {
        let _ = writeln!(
            out,
            "Annual withdrawal: {} (fixed)",
            format_currency(withdrawal.annual_amount, symbol)
        );
    }
    let _ = writeln!(
        out,
        "Expected portfolio yield: {}",
        format_percentage(evaluation.portfolio_yield)
    );
    let _ = writeln!(out, "Portfolio longevity: {}", evaluation.longevity_label);

    let _ = writeln!(out, "\nBuckets:");
    for bucket in &evaluation.buckets {
        let _ = writeln!(
            out,
            "  {:<16} {:>3}y  {:>6}% {:>16}  yield {:>7}  allocated {}%",
            bucket.name,
            bucket.time_horizon,
            bucket.percentage,
            format_currency(bucket.capital, symbol),
            format_percentage(bucket.expected_yield),
            bucket.total_allocation
        );
    }

    if !evaluation.warnings.is_empty() {
        let _ = writeln!(out, "\nWarnings:");
        for warning in &evaluation.warnings {
            let _ = writeln!(out, "  - {}", describe_warning(warning));
        }
    }

    let _ = writeln!(out, "\nProjection:");
    let _ = writeln!(
        out,
        "{:>4} {:>18} {:>14} {:>14}",
        "Year", "Portfolio value", "Withdrawal", "Returns"
    );
    for row in &evaluation.projections {
        let _ = writeln!(
            out,
            "{:>4} {:>18} {:>14} {:>14}",
            row.year,
            format_currency(row.portfolio_value, symbol),
            format_currency(row.withdrawal, symbol),
            format_currency(row.returns, symbol)
        );
    }
    out
}

fn describe_warning(warning: &PlanWarning) -> String {
    match warning {
        PlanWarning::BucketShareMismatch { total_percentage } => {
            format!("bucket shares add up to {total_percentage}%, not 100%")
        }
        PlanWarning::Overallocated {
            bucket_id,
            total_allocation,
        } => format!("bucket `{bucket_id}` is over-allocated ({total_allocation}%)"),
        PlanWarning::Underallocated {
            bucket_id,
            total_allocation,
        } => format!("bucket `{bucket_id}` is under-allocated ({total_allocation}%)"),
        PlanWarning::UnknownAsset {
            bucket_id,
            asset_id,
        } => format!("bucket `{bucket_id}` references unknown asset `{asset_id}`"),
    }
}

pub fn resolve_port(flag: Option<u16>, config: &AppConfig) -> u16 {
    flag.unwrap_or(config.port)
}
