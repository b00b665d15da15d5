use super::buckets::plan_warnings;
use super::catalog::AssetCatalog;
use super::types::{
    Bucket, BucketResult, LongevityOutlook, LongevitySummary, Plan, PlanEvaluation,
    PortfolioProjection, TimeFrame, WithdrawalPlan,
};

pub const DEFAULT_PROJECTION_YEARS: u32 = 30;
pub const MAX_PROJECTION_YEARS: u32 = 100;

const CRITICAL_LONGEVITY_YEARS: i64 = 20;
const CAUTION_LONGEVITY_YEARS: i64 = 30;

/// Blended expected annual return of one bucket, in percent.
///
/// Allocations whose asset id is missing from the catalog are skipped and do
/// not count towards the normalising mass.
pub fn calculate_bucket_yield(bucket: &Bucket, catalog: &AssetCatalog, time_frame: TimeFrame) -> f64 {
    let mut total_yield = 0.0;
    let mut total_percentage = 0.0;

    for allocation in &bucket.allocation {
        if let Some(asset) = catalog.get(&allocation.asset_id) {
            total_yield += asset.historical_return.get(time_frame) * allocation.percentage;
            total_percentage += allocation.percentage;
        }
    }

    if total_percentage > 0.0 {
        total_yield / (total_percentage / 100.0)
    } else {
        0.0
    }
}

/// Bucket yields weighted by each bucket's share of capital, in percent.
/// Shares are applied as given, even when they do not sum to 100.
pub fn calculate_portfolio_yield(
    buckets: &[Bucket],
    catalog: &AssetCatalog,
    time_frame: TimeFrame,
) -> f64 {
    buckets
        .iter()
        .map(|bucket| calculate_bucket_yield(bucket, catalog, time_frame) * (bucket.percentage / 100.0))
        .fold(0.0, |acc, y| acc + y)
}

/// Year-by-year balances for `0..=years`, stopping after the first year that
/// reaches zero (that year is emitted once, floored at 0).
pub fn project_portfolio(
    total_capital: f64,
    buckets: &[Bucket],
    catalog: &AssetCatalog,
    withdrawal_plan: &WithdrawalPlan,
    time_frame: TimeFrame,
    years: u32,
) -> Vec<PortfolioProjection> {
    // Constant for a given configuration, so one evaluation serves every year.
    let portfolio_yield = calculate_portfolio_yield(buckets, catalog, time_frame);
    let mut projections = Vec::with_capacity(years.min(MAX_PROJECTION_YEARS) as usize + 1);
    let mut portfolio_value = total_capital;
    let mut current_withdrawal = withdrawal_plan.annual_amount;

    for year in 0..=years {
        if portfolio_value <= 0.0 {
            break;
        }

        let returns = portfolio_value * (portfolio_yield / 100.0);
        portfolio_value = portfolio_value + returns - current_withdrawal;

        projections.push(PortfolioProjection {
            year,
            portfolio_value: portfolio_value.max(0.0),
            withdrawal: current_withdrawal,
            returns,
        });

        if withdrawal_plan.adjust_for_inflation {
            current_withdrawal *= 1.0 + withdrawal_plan.inflation_rate / 100.0;
        }
    }

    if projections.last().is_some_and(|p| p.portfolio_value <= 0.0) {
        tracing::debug!(
            depleted_in_year = projections.len().saturating_sub(1),
            "portfolio depleted"
        );
    }

    projections
}

/// Last year index with a positive balance; `-1` when the first year already
/// depletes the portfolio (or there are no projections at all).
pub fn estimate_portfolio_longevity(projections: &[PortfolioProjection]) -> i64 {
    match projections.iter().position(|p| p.portfolio_value <= 0.0) {
        Some(idx) => idx as i64 - 1,
        None => projections.len() as i64 - 1,
    }
}

pub fn summarize_longevity(projections: &[PortfolioProjection]) -> LongevitySummary {
    let years = estimate_portfolio_longevity(projections);
    let lasted_full_horizon = !projections.is_empty() && years == projections.len() as i64 - 1;
    let outlook = if years < CRITICAL_LONGEVITY_YEARS {
        LongevityOutlook::Critical
    } else if years < CAUTION_LONGEVITY_YEARS {
        LongevityOutlook::Caution
    } else {
        LongevityOutlook::Healthy
    };

    LongevitySummary {
        years,
        lasted_full_horizon,
        outlook,
    }
}

pub fn evaluate_plan(plan: &Plan, catalog: &AssetCatalog, years: u32) -> PlanEvaluation {
    let buckets = plan
        .buckets
        .iter()
        .map(|bucket| BucketResult {
            id: bucket.id.clone(),
            name: bucket.name.clone(),
            time_horizon: bucket.time_horizon,
            percentage: bucket.percentage,
            expected_yield: calculate_bucket_yield(bucket, catalog, plan.time_frame),
            capital: bucket.capital(plan.total_capital),
            total_allocation: bucket.total_allocation(),
            allocation_status: bucket.allocation_status(),
        })
        .collect::<Vec<_>>();

    let projections = project_portfolio(
        plan.total_capital,
        &plan.buckets,
        catalog,
        &plan.withdrawal_plan,
        plan.time_frame,
        years,
    );
    let longevity = summarize_longevity(&projections);

    PlanEvaluation {
        time_frame: plan.time_frame,
        portfolio_yield: calculate_portfolio_yield(&plan.buckets, catalog, plan.time_frame),
        buckets,
        longevity_label: longevity.label(),
        longevity,
        projections,
        warnings: plan_warnings(plan, catalog),
    }
}
