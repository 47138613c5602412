//! Aggregation engine: monthly reports over the usage statistics fact table.
//!
//! Every report is a read-only computation for one month (or every month
//! but the current one) that counts only eligible rows, i.e. instances that
//! reported at least twice that month.

pub mod installations;
pub mod jvm;
pub mod lookup;
pub mod model;
pub mod plugins;
pub mod totals;

#[cfg(test)]
mod test_support;

pub use installations::{capabilities, installations};
pub use jvm::jvm_report;
pub use model::*;
pub use plugins::{jenkins_versions_for_plugin_versions, latest_plugin_numbers, plugin_reports};
pub use totals::{executor_totals, job_totals, os_totals};
