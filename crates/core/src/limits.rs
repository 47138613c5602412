//! Data-quality limits and sentinel values for incoming snapshots.
//!
//! The `#[validate]` derive macro requires literal values in attributes,
//! so the length limits are duplicated on `Snapshot`. Keep both in sync
//! when modifying.

// === Pre-filter limits (chars) ===
// Repeated literally in the `#[validate]` attributes on `Snapshot`.

/// Instance identifiers longer than this are discarded.
pub const MAX_INSTANCE_ID_LEN: u64 = 64;

/// Jenkins version strings longer than this are discarded.
pub const MAX_JENKINS_VERSION_LEN: u64 = 32;

/// Substrings that disqualify a Jenkins version string.
pub const DISALLOWED_VERSION_MARKERS: &[&str] = &["SNAPSHOT", "***", "?"];

// === Sentinels and placeholders ===

/// Executor count reported by corrupted upstream data (i32::MAX).
pub const EXECUTORS_SENTINEL: u64 = 2_147_483_647;

/// Plugin version placeholder meaning "no real version".
pub const PLACEHOLDER_PLUGIN_VERSION: &str = "???";

/// JVM version recorded when a snapshot has no controller node.
pub const MISSING_JVM_VERSION: &str = "N/A";

/// Job type class names with this prefix are never counted.
pub const PRIVATE_JOB_PREFIX: &str = "private";

/// Plugin names with this prefix are dropped at decode time.
pub const PRIVATE_PLUGIN_PREFIX: &str = "privateplugin-";

/// Plugin versions containing this marker are dropped at decode time.
pub const PRIVATE_PLUGIN_VERSION_MARKER: &str = "(private)";

// === Aggregation ===

/// Minimum `count_for_month` for a fact row to be counted by reports.
pub const MIN_ELIGIBLE_COUNT_FOR_MONTH: i64 = 2;
