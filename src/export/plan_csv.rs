use std::io;

use crate::core::{
    AssetCatalog, Plan, PlannerError, calculate_bucket_yield, calculate_portfolio_yield,
    project_portfolio,
};

use super::{Currency, format_percentage};

pub const EXPORT_FILE_NAME: &str = "retirement_plan.csv";

const EXPORT_TITLE: &str = "Retirement Bucket Planner - Exported Plan";

type Row = Vec<String>;

fn row<const N: usize>(fields: [&str; N]) -> Row {
    fields.iter().map(|f| f.to_string()).collect()
}

/// Renders the plan summary, bucket allocations and the full projection as
/// one CSV document. Sections are separated by blank lines.
pub fn export_plan_csv(
    plan: &Plan,
    catalog: &AssetCatalog,
    currency: Currency,
    years: u32,
) -> Result<String, PlannerError> {
    let time_frame = plan.time_frame;
    let withdrawal = &plan.withdrawal_plan;
    let projections = project_portfolio(
        plan.total_capital,
        &plan.buckets,
        catalog,
        withdrawal,
        time_frame,
        years,
    );

    let mut sections: Vec<Vec<Row>> = vec![vec![row([EXPORT_TITLE])]];

    let mut summary = vec![
        row(["PLAN SUMMARY"]),
        row(["Total Capital", &plan.total_capital.to_string(), currency.code]),
        row([
            "Annual Withdrawal",
            &withdrawal.annual_amount.to_string(),
            currency.code,
        ]),
        row([
            "Inflation Adjustment",
            if withdrawal.adjust_for_inflation { "Yes" } else { "No" },
        ]),
    ];
    if withdrawal.adjust_for_inflation {
        summary.push(row(["Inflation Rate", &format!("{}%", withdrawal.inflation_rate)]));
    }
    summary.push(row([
        "Time Frame",
        &format!("{} historical data", time_frame.label()),
    ]));
    summary.push(row([
        "Expected Portfolio Yield",
        &format_percentage(calculate_portfolio_yield(&plan.buckets, catalog, time_frame)),
    ]));
    sections.push(summary);

    sections.push(vec![row(["BUCKET ALLOCATIONS"])]);
    for bucket in &plan.buckets {
        let mut rows = vec![
            row([&format!("{} ({} years)", bucket.name, bucket.time_horizon)]),
            row(["Asset", "Allocation (%)", "Expected Return (%)"]),
        ];
        for allocation in &bucket.allocation {
            let Some(asset) = catalog.get(&allocation.asset_id) else {
                continue;
            };
            rows.push(row([
                &asset.name,
                &format!("{}%", allocation.percentage),
                &format_percentage(asset.historical_return.get(time_frame) * 100.0),
            ]));
        }
        rows.push(row([
            "Total Expected Return",
            &format_percentage(calculate_bucket_yield(bucket, catalog, time_frame)),
        ]));
        sections.push(rows);
    }

    let mut projection_rows = vec![
        row(["PORTFOLIO PROJECTIONS"]),
        row(["Year", "Portfolio Value", "Annual Withdrawal", "Returns"]),
    ];
    projection_rows.extend(projections.iter().map(|p| {
        vec![
            p.year.to_string(),
            format!("{:.2}", p.portfolio_value),
            format!("{:.2}", p.withdrawal),
            format!("{:.2}", p.returns),
        ]
    }));
    sections.push(projection_rows);

    let out = write_sections(&sections)?;
    tracing::debug!(
        buckets = plan.buckets.len(),
        rows = projections.len(),
        "rendered plan export"
    );
    Ok(out)
}

// A csv writer turns an empty record into `""`, so blank separator lines are
// written between writers rather than through one.
fn write_sections(sections: &[Vec<Row>]) -> Result<String, PlannerError> {
    let mut out = Vec::new();
    for (idx, rows) in sections.iter().enumerate() {
        if idx > 0 {
            out.push(b'\n');
        }
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(&mut out);
        for record in rows {
            writer.write_record(record)?;
        }
        writer.flush()?;
    }
    String::from_utf8(out).map_err(|e| PlannerError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}
