use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TimeFrame {
    #[serde(alias = "one-year", alias = "1y")]
    OneYear,
    #[serde(alias = "five-year", alias = "5y")]
    FiveYear,
    #[default]
    #[serde(alias = "ten-year", alias = "10y")]
    TenYear,
    #[serde(alias = "twenty-year", alias = "20y")]
    TwentyYear,
    #[serde(alias = "thirty-year", alias = "30y")]
    ThirtyYear,
}

impl TimeFrame {
    pub const ALL: [TimeFrame; 5] = [
        TimeFrame::OneYear,
        TimeFrame::FiveYear,
        TimeFrame::TenYear,
        TimeFrame::TwentyYear,
        TimeFrame::ThirtyYear,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TimeFrame::OneYear => "1 year",
            TimeFrame::FiveYear => "5 year",
            TimeFrame::TenYear => "10 year",
            TimeFrame::TwentyYear => "20 year",
            TimeFrame::ThirtyYear => "30 year",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetCategory {
    International,
    Israeli,
    Custom,
}

/// Average annual returns as fractions (0.11 is 11%), one per time frame.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalReturns {
    pub one_year: f64,
    pub five_year: f64,
    pub ten_year: f64,
    pub twenty_year: f64,
    pub thirty_year: f64,
}

impl HistoricalReturns {
    pub fn flat(rate: f64) -> Self {
        Self {
            one_year: rate,
            five_year: rate,
            ten_year: rate,
            twenty_year: rate,
            thirty_year: rate,
        }
    }

    pub fn get(&self, time_frame: TimeFrame) -> f64 {
        match time_frame {
            TimeFrame::OneYear => self.one_year,
            TimeFrame::FiveYear => self.five_year,
            TimeFrame::TenYear => self.ten_year,
            TimeFrame::TwentyYear => self.twenty_year,
            TimeFrame::ThirtyYear => self.thirty_year,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub name: String,
    #[serde(alias = "type")]
    pub category: AssetCategory,
    #[serde(default)]
    pub description: String,
    pub historical_return: HistoricalReturns,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetAllocation {
    pub asset_id: String,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub id: String,
    pub name: String,
    pub time_horizon: u32,
    #[serde(default)]
    pub allocation: Vec<AssetAllocation>,
    /// Cached display value; the engine always recomputes from `allocation`.
    #[serde(default)]
    pub expected_yield: f64,
    pub percentage: f64,
}

impl Bucket {
    pub fn total_allocation(&self) -> f64 {
        self.allocation.iter().fold(0.0, |acc, a| acc + a.percentage)
    }

    pub fn allocation_status(&self) -> AllocationStatus {
        let total = self.total_allocation();
        if total > 100.0 {
            AllocationStatus::Overallocated
        } else if total < 100.0 {
            AllocationStatus::Underallocated
        } else {
            AllocationStatus::FullyAllocated
        }
    }

    pub fn allocation_for(&self, asset_id: &str) -> f64 {
        self.allocation
            .iter()
            .find(|a| a.asset_id == asset_id)
            .map(|a| a.percentage)
            .unwrap_or(0.0)
    }

    pub fn capital(&self, total_capital: f64) -> f64 {
        total_capital * (self.percentage / 100.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AllocationStatus {
    Underallocated,
    FullyAllocated,
    Overallocated,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalPlan {
    pub annual_amount: f64,
    pub adjust_for_inflation: bool,
    pub inflation_rate: f64,
}

impl Default for WithdrawalPlan {
    fn default() -> Self {
        Self {
            annual_amount: 40_000.0,
            adjust_for_inflation: true,
            inflation_rate: 2.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioProjection {
    pub year: u32,
    pub portfolio_value: f64,
    pub withdrawal: f64,
    pub returns: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub total_capital: f64,
    pub buckets: Vec<Bucket>,
    pub withdrawal_plan: WithdrawalPlan,
    #[serde(default)]
    pub time_frame: TimeFrame,
}

impl Default for Plan {
    fn default() -> Self {
        Self {
            total_capital: 1_000_000.0,
            buckets: super::buckets::initial_buckets(),
            withdrawal_plan: WithdrawalPlan::default(),
            time_frame: TimeFrame::default(),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LongevityOutlook {
    Critical,
    Caution,
    Healthy,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LongevitySummary {
    pub years: i64,
    pub lasted_full_horizon: bool,
    pub outlook: LongevityOutlook,
}

impl LongevitySummary {
    pub fn label(&self) -> String {
        if self.lasted_full_horizon {
            format!("{}+ years", self.years.max(0))
        } else {
            format!("{} years", self.years)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketResult {
    pub id: String,
    pub name: String,
    pub time_horizon: u32,
    pub percentage: f64,
    pub expected_yield: f64,
    pub capital: f64,
    pub total_allocation: f64,
    pub allocation_status: AllocationStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PlanWarning {
    #[serde(rename_all = "camelCase")]
    BucketShareMismatch { total_percentage: f64 },
    #[serde(rename_all = "camelCase")]
    Overallocated { bucket_id: String, total_allocation: f64 },
    #[serde(rename_all = "camelCase")]
    Underallocated { bucket_id: String, total_allocation: f64 },
    #[serde(rename_all = "camelCase")]
    UnknownAsset { bucket_id: String, asset_id: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanEvaluation {
    pub time_frame: TimeFrame,
    pub portfolio_yield: f64,
    pub buckets: Vec<BucketResult>,
    pub projections: Vec<PortfolioProjection>,
    pub longevity: LongevitySummary,
    pub longevity_label: String,
    pub warnings: Vec<PlanWarning>,
}
