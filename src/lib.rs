//! Retirement bucket planner: blended yields per time-horizon bucket and a
//! deterministic year-by-year withdrawal projection.

pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod export;
pub mod logging;
