//! Analytics Domain
//!
//! Daily metrics are a derived aggregate: one row per calendar date holding
//! room occupancy, revenue from completed payments and front-desk activity
//! counts. The rollup is a pure function of its inputs, so recomputing a date
//! without intervening changes always yields the same row.

pub mod metrics;

pub use metrics::{DailyMetrics, MetricsInputs};
