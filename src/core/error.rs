use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported catalog format: {}", .0.display())]
    UnsupportedCatalogFormat(PathBuf),
    #[error("duplicate asset id `{0}` in catalog")]
    DuplicateAssetId(String),
    #[error("invalid custom asset: {0}")]
    InvalidCustomAsset(String),
    #[error("bucket index {index} out of range ({len} buckets)")]
    BucketIndexOutOfRange { index: usize, len: usize },
    #[error("at least one bucket must remain")]
    LastBucket,
}
