use super::catalog::AssetCatalog;
use super::engine::calculate_bucket_yield;
use super::error::PlannerError;
use super::types::{AllocationStatus, AssetAllocation, Bucket, Plan, PlanWarning, TimeFrame};

const BUCKET_SHARE_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, PartialEq)]
pub enum BucketEdit {
    Rename(String),
    TimeHorizon(u32),
    Percentage(f64),
}

pub fn initial_buckets() -> Vec<Bucket> {
    let seed = |id: &str, name: &str, time_horizon: u32, percentage: f64| Bucket {
        id: id.to_string(),
        name: name.to_string(),
        time_horizon,
        allocation: Vec::new(),
        expected_yield: 0.0,
        percentage,
    };

    vec![
        seed("short-term", "Short-term", 2, 20.0),
        seed("mid-term", "Mid-term", 5, 30.0),
        seed("long-term", "Long-term", 10, 50.0),
    ]
}

pub fn add_bucket(buckets: &[Bucket]) -> Vec<Bucket> {
    let mut number = buckets.len() + 1;
    while buckets.iter().any(|b| b.id == format!("bucket-{number}")) {
        number += 1;
    }

    let mut updated = buckets.to_vec();
    updated.push(Bucket {
        id: format!("bucket-{number}"),
        name: format!("Bucket {number}"),
        time_horizon: 1,
        allocation: Vec::new(),
        expected_yield: 0.0,
        percentage: 0.0,
    });
    updated
}

pub fn remove_bucket(buckets: &[Bucket], index: usize) -> Result<Vec<Bucket>, PlannerError> {
    check_index(buckets, index)?;
    if buckets.len() <= 1 {
        return Err(PlannerError::LastBucket);
    }

    let mut updated = buckets.to_vec();
    updated.remove(index);
    Ok(updated)
}

pub fn update_bucket(
    buckets: &[Bucket],
    index: usize,
    edit: BucketEdit,
) -> Result<Vec<Bucket>, PlannerError> {
    check_index(buckets, index)?;

    let mut bucket = buckets[index].clone();
    match edit {
        BucketEdit::Rename(name) => bucket.name = name,
        BucketEdit::TimeHorizon(years) => bucket.time_horizon = years,
        BucketEdit::Percentage(percentage) => bucket.percentage = percentage,
    }

    Ok(replace_at(buckets, index, bucket))
}

/// Sets one asset's share inside a bucket. A share of 0 drops the allocation;
/// the bucket's cached expected yield is refreshed in the returned copy.
pub fn set_allocation(
    buckets: &[Bucket],
    index: usize,
    asset_id: &str,
    percentage: f64,
    catalog: &AssetCatalog,
    time_frame: TimeFrame,
) -> Result<Vec<Bucket>, PlannerError> {
    check_index(buckets, index)?;

    let mut bucket = buckets[index].clone();
    match bucket.allocation.iter().position(|a| a.asset_id == asset_id) {
        Some(pos) if percentage == 0.0 => {
            bucket.allocation.remove(pos);
        }
        Some(pos) => bucket.allocation[pos].percentage = percentage,
        None if percentage > 0.0 => bucket.allocation.push(AssetAllocation {
            asset_id: asset_id.to_string(),
            percentage,
        }),
        None => {}
    }
    bucket.expected_yield = calculate_bucket_yield(&bucket, catalog, time_frame);

    Ok(replace_at(buckets, index, bucket))
}

pub fn refresh_expected_yields(
    buckets: &[Bucket],
    catalog: &AssetCatalog,
    time_frame: TimeFrame,
) -> Vec<Bucket> {
    buckets
        .iter()
        .map(|bucket| Bucket {
            expected_yield: calculate_bucket_yield(bucket, catalog, time_frame),
            ..bucket.clone()
        })
        .collect()
}

pub fn total_bucket_percentage(buckets: &[Bucket]) -> f64 {
    buckets.iter().fold(0.0, |acc, b| acc + b.percentage)
}

pub fn bucket_shares_balanced(buckets: &[Bucket]) -> bool {
    (total_bucket_percentage(buckets) - 100.0).abs() <= BUCKET_SHARE_TOLERANCE
}

pub fn plan_warnings(plan: &Plan, catalog: &AssetCatalog) -> Vec<PlanWarning> {
    let mut warnings = Vec::new();

    if !bucket_shares_balanced(&plan.buckets) {
        warnings.push(PlanWarning::BucketShareMismatch {
            total_percentage: total_bucket_percentage(&plan.buckets),
        });
    }

    for bucket in &plan.buckets {
        let total_allocation = bucket.total_allocation();
        match bucket.allocation_status() {
            AllocationStatus::Overallocated => warnings.push(PlanWarning::Overallocated {
                bucket_id: bucket.id.clone(),
                total_allocation,
            }),
            AllocationStatus::Underallocated => warnings.push(PlanWarning::Underallocated {
                bucket_id: bucket.id.clone(),
                total_allocation,
            }),
            AllocationStatus::FullyAllocated => {}
        }

        for allocation in &bucket.allocation {
            if !catalog.contains(&allocation.asset_id) {
                warnings.push(PlanWarning::UnknownAsset {
                    bucket_id: bucket.id.clone(),
                    asset_id: allocation.asset_id.clone(),
                });
            }
        }
    }

    warnings
}

fn check_index(buckets: &[Bucket], index: usize) -> Result<(), PlannerError> {
    if index >= buckets.len() {
        return Err(PlannerError::BucketIndexOutOfRange {
            index,
            len: buckets.len(),
        });
    }
    Ok(())
}

fn replace_at(buckets: &[Bucket], index: usize, bucket: Bucket) -> Vec<Bucket> {
    let mut updated = buckets.to_vec();
    updated[index] = bucket;
    updated
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn initial_buckets_cover_short_mid_and_long_term() {
        let buckets = initial_buckets();

        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[0].id, "short-term");
        assert_eq!(buckets[1].id, "mid-term");
        assert_eq!(buckets[2].id, "long-term");
        assert_eq!(
            buckets.iter().map(|b| b.time_horizon).collect::<Vec<_>>(),
            vec![2, 5, 10]
        );
        assert_approx(total_bucket_percentage(&buckets), 100.0);
        assert!(bucket_shares_balanced(&buckets));
        assert!(buckets.iter().all(|b| b.allocation.is_empty()));
    }

    #[test]
    fn empty_totals_render_as_plain_zero() {
        let buckets = initial_buckets();

        assert_eq!(format!("{}", buckets[0].total_allocation()), "0");
        assert_eq!(format!("{}", total_bucket_percentage(&[])), "0");
        assert_eq!(buckets[0].allocation_status(), AllocationStatus::Underallocated);
    }

    #[test]
    fn add_bucket_appends_empty_bucket_with_fresh_id() {
        let buckets = initial_buckets();
        let added = add_bucket(&buckets);

        assert_eq!(buckets.len(), 3);
        assert_eq!(added.len(), 4);
        let bucket = &added[3];
        assert_eq!(bucket.id, "bucket-4");
        assert_eq!(bucket.name, "Bucket 4");
        assert_eq!(bucket.time_horizon, 1);
        assert_eq!(bucket.percentage, 0.0);
    }

    #[test]
    fn add_bucket_skips_ids_still_in_use_after_removal() {
        let buckets = add_bucket(&add_bucket(&initial_buckets()));
        let buckets = remove_bucket(&buckets, 0).expect("removal allowed");
        assert_eq!(buckets.len(), 4);

        let buckets = add_bucket(&buckets);
        let ids = buckets.iter().map(|b| b.id.as_str()).collect::<Vec<_>>();
        assert_eq!(
            ids,
            vec!["mid-term", "long-term", "bucket-4", "bucket-5", "bucket-6"]
        );
    }

    #[test]
    fn remove_bucket_keeps_at_least_one() {
        let single = vec![initial_buckets().remove(0)];
        assert!(matches!(remove_bucket(&single, 0), Err(PlannerError::LastBucket)));

        let buckets = initial_buckets();
        assert!(matches!(
            remove_bucket(&buckets, 3),
            Err(PlannerError::BucketIndexOutOfRange { index: 3, len: 3 })
        ));

        let remaining = remove_bucket(&buckets, 1).expect("removal allowed");
        assert_eq!(remaining.len(), 2);
        assert_eq!(remaining[1].id, "long-term");
    }

    #[test]
    fn update_bucket_changes_only_target_field() {
        let buckets = initial_buckets();
        let renamed = update_bucket(&buckets, 0, BucketEdit::Rename("Cash".to_string()))
            .expect("valid index");
        let rehorizoned =
            update_bucket(&renamed, 0, BucketEdit::TimeHorizon(3)).expect("valid index");
        let reshared =
            update_bucket(&rehorizoned, 2, BucketEdit::Percentage(40.0)).expect("valid index");

        assert_eq!(buckets[0].name, "Short-term");
        assert_eq!(reshared[0].name, "Cash");
        assert_eq!(reshared[0].time_horizon, 3);
        assert_approx(reshared[0].percentage, 20.0);
        assert_approx(reshared[2].percentage, 40.0);
        assert!(!bucket_shares_balanced(&reshared));
    }

    #[test]
    fn set_allocation_adds_updates_and_removes_entries() {
        let catalog = AssetCatalog::builtin();
        let buckets = initial_buckets();

        let step1 = set_allocation(&buckets, 2, "sp500", 60.0, &catalog, TimeFrame::TenYear)
            .expect("valid index");
        let step2 = set_allocation(&step1, 2, "global-bonds", 40.0, &catalog, TimeFrame::TenYear)
            .expect("valid index");
        assert_eq!(step2[2].allocation.len(), 2);
        assert_eq!(step2[2].allocation_status(), AllocationStatus::FullyAllocated);
        assert_approx(step2[2].expected_yield, 0.113 * 60.0 + 0.035 * 40.0);

        let step3 = set_allocation(&step2, 2, "sp500", 70.0, &catalog, TimeFrame::TenYear)
            .expect("valid index");
        assert_approx(step3[2].allocation_for("sp500"), 70.0);
        assert_eq!(step3[2].allocation_status(), AllocationStatus::Overallocated);

        let step4 = set_allocation(&step3, 2, "sp500", 0.0, &catalog, TimeFrame::TenYear)
            .expect("valid index");
        assert_eq!(step4[2].allocation.len(), 1);
        assert_eq!(step4[2].allocation[0].asset_id, "global-bonds");
        assert_approx(step4[2].expected_yield, 3.5);

        assert!(buckets[2].allocation.is_empty());
        assert_eq!(step2[2].allocation.len(), 2);
    }

    #[test]
    fn set_allocation_of_zero_for_missing_asset_is_a_no_op() {
        let catalog = AssetCatalog::builtin();
        let buckets = initial_buckets();
        let updated = set_allocation(&buckets, 0, "nasdaq", 0.0, &catalog, TimeFrame::OneYear)
            .expect("valid index");
        assert_eq!(updated, buckets);
    }

    #[test]
    fn refresh_expected_yields_tracks_time_frame() {
        let catalog = AssetCatalog::builtin();
        let buckets = set_allocation(
            &initial_buckets(),
            1,
            "msci-world",
            100.0,
            &catalog,
            TimeFrame::OneYear,
        )
        .expect("valid index");
        assert_approx(buckets[1].expected_yield, 19.19);

        let refreshed = refresh_expected_yields(&buckets, &catalog, TimeFrame::ThirtyYear);
        assert_approx(refreshed[1].expected_yield, 9.5);
        assert_eq!(refreshed[0].expected_yield, 0.0);
    }

    #[test]
    fn plan_warnings_flag_shares_allocation_and_unknown_assets() {
        let catalog = AssetCatalog::builtin();
        let mut plan = Plan::default();
        plan.buckets[0].allocation = vec![
            AssetAllocation {
                asset_id: "global-bonds".to_string(),
                percentage: 100.0,
            },
        ];
        plan.buckets[1].allocation = vec![
            AssetAllocation {
                asset_id: "sp500".to_string(),
                percentage: 80.0,
            },
            AssetAllocation {
                asset_id: "retired-fund".to_string(),
                percentage: 30.0,
            },
        ];
        plan.buckets[2].percentage = 40.0;

        let warnings = plan_warnings(&plan, &catalog);
        assert_eq!(
            warnings,
            vec![
                PlanWarning::BucketShareMismatch {
                    total_percentage: 90.0
                },
                PlanWarning::Overallocated {
                    bucket_id: "mid-term".to_string(),
                    total_allocation: 110.0
                },
                PlanWarning::UnknownAsset {
                    bucket_id: "mid-term".to_string(),
                    asset_id: "retired-fund".to_string()
                },
                PlanWarning::Underallocated {
                    bucket_id: "long-term".to_string(),
                    total_allocation: 0.0
                },
            ]
        );
    }
}
