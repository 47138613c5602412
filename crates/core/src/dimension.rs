//! Dimension kinds and their storage layout.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Surrogate key of a dimension row.
pub type DimensionId = i64;

/// The five interned dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionKind {
    JvmVersion,
    OsType,
    JobType,
    JenkinsVersion,
    /// Keyed on (name, version)
    Plugin,
}

impl DimensionKind {
    pub const ALL: [DimensionKind; 5] = [
        Self::JvmVersion,
        Self::OsType,
        Self::JobType,
        Self::JenkinsVersion,
        Self::Plugin,
    ];

    /// Backing table name.
    pub fn table(&self) -> &'static str {
        match self {
            Self::JvmVersion => "jvm_versions",
            Self::OsType => "os_types",
            Self::JobType => "job_types",
            Self::JenkinsVersion => "jenkins_versions",
            Self::Plugin => "plugins",
        }
    }

    /// Column holding the natural-key name.
    pub fn name_column(&self) -> &'static str {
        match self {
            Self::JenkinsVersion => "version",
            _ => "name",
        }
    }

    /// Whether the natural key carries a version alongside the name.
    pub fn is_versioned(&self) -> bool {
        matches!(self, Self::Plugin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JvmVersion => "jvm_version",
            Self::OsType => "os_type",
            Self::JobType => "job_type",
            Self::JenkinsVersion => "jenkins_version",
            Self::Plugin => "plugin",
        }
    }
}

impl fmt::Display for DimensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Natural key of a dimension row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DimensionKey {
    pub kind: DimensionKind,
    pub name: String,
    /// Only set for plugins.
    pub version: Option<String>,
}

impl DimensionKey {
    pub fn named(kind: DimensionKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            version: None,
        }
    }

    pub fn plugin(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            kind: DimensionKind::Plugin,
            name: name.into(),
            version: Some(version.into()),
        }
    }
}

/// A plugin dimension row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginRef {
    pub name: String,
    pub version: String,
}
