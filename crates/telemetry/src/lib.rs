//! Tracing and import metrics for the usage statistics engine.

pub mod metrics;
pub mod tracing_setup;

pub use metrics::*;
pub use tracing_setup::*;
