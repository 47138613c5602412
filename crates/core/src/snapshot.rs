//! Raw snapshot records as emitted by Jenkins installations.
//!
//! One `Snapshot` is one instance's point-in-time telemetry, decoded from a
//! single line of a daily file. Absent fields and explicit `null`s decode to
//! their defaults.

use std::collections::BTreeMap;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError};

use crate::error::{Error, InputErrorCode, Result};
use crate::limits::{
    DISALLOWED_VERSION_MARKERS, PRIVATE_PLUGIN_PREFIX, PRIVATE_PLUGIN_VERSION_MARKER,
};

/// Access-log style timestamp used by the usage collector, e.g. `30/Oct/2021:23:59:54 +0000`.
const RAW_TIMESTAMP_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Fractional-second digits kept on parsed timestamps; matches the
/// millisecond `report_time` column.
const TIMESTAMP_SUBSEC_DIGITS: u16 = 3;

/// Decodes `null` as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A single node (controller or agent) of an instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotNode {
    #[serde(
        rename = "os",
        skip_serializing_if = "String::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub os: String,
    #[serde(
        rename = "jvm-version",
        skip_serializing_if = "String::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub jvm_version: String,
    #[serde(
        rename = "jvm-name",
        skip_serializing_if = "String::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub jvm_name: String,
    #[serde(
        rename = "jvm-vendor",
        skip_serializing_if = "String::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub jvm_vendor: String,
    #[serde(deserialize_with = "null_as_default")]
    pub executors: u64,
    /// Whether this node is the instance's controller.
    #[serde(rename = "master", deserialize_with = "null_as_default")]
    pub is_controller: bool,
}

/// An installed plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotPlugin {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub version: String,
}

impl SnapshotPlugin {
    /// Private plugins are never recorded.
    pub fn is_private(&self) -> bool {
        self.name.starts_with(PRIVATE_PLUGIN_PREFIX)
            || self.version.contains(PRIVATE_PLUGIN_VERSION_MARKER)
    }
}

/// One instance's telemetry at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Snapshot {
    /// Installation identifier (max 64 chars)
    #[serde(rename = "install", deserialize_with = "null_as_default")]
    #[validate(length(max = 64))]
    pub install_id: String,
    /// Raw timestamp string as delivered
    #[serde(deserialize_with = "null_as_default")]
    pub timestamp: String,
    /// Jenkins version (max 32 chars, no snapshot or garbled markers)
    #[serde(deserialize_with = "null_as_default")]
    #[validate(length(max = 32), custom(function = "validate_jenkins_version"))]
    pub version: String,
    #[serde(rename = "servletContainer", skip_serializing_if = "Option::is_none")]
    pub servlet_container: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub nodes: Vec<SnapshotNode>,
    #[serde(deserialize_with = "null_as_default")]
    pub plugins: Vec<SnapshotPlugin>,
    /// Job type class name to job count
    #[serde(deserialize_with = "null_as_default")]
    pub jobs: BTreeMap<String, u64>,
}

/// Why a snapshot was discarded without touching its fact row content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Instance identifier longer than 64 characters
    InstanceId,
    /// Jenkins version too long or carrying a disallowed marker
    JenkinsVersion,
    /// Timestamp equal to or earlier than the stored report time
    NotNewer,
    /// No visible jobs after filtering
    NoJobs,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InstanceId => "instance_id",
            Self::JenkinsVersion => "jenkins_version",
            Self::NotNewer => "not_newer",
            Self::NoJobs => "no_jobs",
        }
    }
}

fn validate_jenkins_version(version: &str) -> std::result::Result<(), ValidationError> {
    if DISALLOWED_VERSION_MARKERS
        .iter()
        .any(|marker| version.contains(marker))
    {
        let mut err = ValidationError::new("disallowed_version");
        err.message = Some(format!("version {version:?} is not a release").into());
        return Err(err);
    }
    Ok(())
}

impl Snapshot {
    /// Parses the raw timestamp into a UTC instant.
    pub fn parsed_timestamp(&self) -> Result<DateTime<Utc>> {
        parse_snapshot_timestamp(&self.timestamp)
    }

    /// Applies the data-quality pre-filter.
    ///
    /// Returns the reason the snapshot must be discarded, if any. The
    /// instance identifier is checked before the version.
    pub fn pre_filter(&self) -> Option<SkipReason> {
        let errors = self.validate().err()?;
        let fields = errors.field_errors();
        if fields.contains_key("install_id") {
            Some(SkipReason::InstanceId)
        } else if fields.contains_key("version") {
            Some(SkipReason::JenkinsVersion)
        } else {
            None
        }
    }

    /// Drops private plugins in place.
    pub fn strip_private_plugins(&mut self) {
        self.plugins.retain(|p| !p.is_private());
    }

    /// The node flagged as the controller, if any. When several nodes claim
    /// it, the last one wins.
    pub fn controller(&self) -> Option<&SnapshotNode> {
        self.nodes.iter().rev().find(|n| n.is_controller)
    }
}

/// Parses a snapshot timestamp.
///
/// Accepts the collector's `dd/Mon/yyyy:HH:MM:SS +zzzz` form and RFC 3339.
/// Sub-millisecond precision is truncated so parsed instants compare equal
/// to stored ones.
pub fn parse_snapshot_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let trimmed = raw.trim();
    DateTime::parse_from_str(trimmed, RAW_TIMESTAMP_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(trimmed))
        .map(|ts| ts.with_timezone(&Utc).trunc_subsecs(TIMESTAMP_SUBSEC_DIGITS))
        .map_err(|e| {
            Error::input(
                InputErrorCode::InvalidTimestamp,
                format!("cannot parse timestamp {raw:?}: {e}"),
            )
        })
}
