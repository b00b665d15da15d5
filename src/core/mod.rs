mod buckets;
mod catalog;
mod engine;
mod error;
mod types;

pub use buckets::{
    BucketEdit, add_bucket, bucket_shares_balanced, initial_buckets, plan_warnings,
    refresh_expected_yields, remove_bucket, set_allocation, total_bucket_percentage,
    update_bucket,
};
pub use catalog::{AssetCatalog, CUSTOM_ASSET_DESCRIPTION};
pub use engine::{
    DEFAULT_PROJECTION_YEARS, MAX_PROJECTION_YEARS, calculate_bucket_yield, calculate_portfolio_yield,
    estimate_portfolio_longevity, evaluate_plan, project_portfolio, summarize_longevity,
};
pub use error::PlannerError;
pub use types::{
    AllocationStatus, Asset, AssetAllocation, AssetCategory, Bucket, BucketResult,
    HistoricalReturns, LongevityOutlook, LongevitySummary, Plan, PlanEvaluation, PlanWarning,
    PortfolioProjection, TimeFrame, WithdrawalPlan,
};
