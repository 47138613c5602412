//! Snapshot builders and daily file writers.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::{json, Map, Value};
use stats_core::Snapshot;

/// A UTC instant rendered the way the usage collector writes timestamps.
pub fn raw_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%d/%b/%Y:%H:%M:%S +0000").to_string()
}

pub fn utc(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, min, sec).unwrap()
}

/// Builds one snapshot line in wire format.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    install: String,
    timestamp: DateTime<Utc>,
    version: String,
    nodes: Vec<Value>,
    plugins: Vec<Value>,
    jobs: Map<String, Value>,
}

impl SnapshotBuilder {
    /// A controller on Linux / Java 11 with two executors and no plugins or jobs.
    pub fn new(install: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            install: install.to_string(),
            timestamp,
            version: "2.303.1".to_string(),
            nodes: vec![json!({
                "os": "Linux",
                "jvm-version": "11.0.12",
                "jvm-name": "OpenJDK 64-Bit Server VM",
                "jvm-vendor": "Eclipse Adoptium",
                "executors": 2,
                "master": true
            })],
            plugins: Vec::new(),
            jobs: Map::new(),
        }
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    pub fn controller_jvm(mut self, jvm_version: &str) -> Self {
        if let Some(node) = self.nodes.first_mut() {
            node["jvm-version"] = json!(jvm_version);
        }
        self
    }

    pub fn agent(mut self, os: &str, executors: u64) -> Self {
        self.nodes.push(json!({ "os": os, "executors": executors }));
        self
    }

    pub fn plugin(mut self, name: &str, version: &str) -> Self {
        self.plugins.push(json!({ "name": name, "version": version }));
        self
    }

    /// Adds `count` generated plugins named `plugin-0` .. `plugin-{count-1}`.
    pub fn plugins(mut self, count: usize) -> Self {
        for i in 0..count {
            self.plugins.push(json!({ "name": format!("plugin-{i}"), "version": "1.0" }));
        }
        self
    }

    pub fn job(mut self, class: &str, count: u64) -> Self {
        self.jobs.insert(class.to_string(), json!(count));
        self
    }

    pub fn to_json(&self) -> Value {
        json!({
            "install": self.install,
            "timestamp": raw_timestamp(self.timestamp),
            "version": self.version,
            "servletContainer": "jetty/9.4.43.v20210629",
            "nodes": self.nodes,
            "plugins": self.plugins,
            "jobs": self.jobs,
        })
    }

    pub fn to_line(&self) -> String {
        self.to_json().to_string()
    }

    pub fn build(&self) -> Snapshot {
        serde_json::from_value(self.to_json()).unwrap()
    }
}

/// Writes `lines` gzip-compressed as `dir/name`.
pub fn write_daily_file(dir: &Path, name: &str, lines: &[String]) -> PathBuf {
    let path = dir.join(name);
    let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
    for line in lines {
        writeln!(encoder, "{line}").unwrap();
    }
    encoder.finish().unwrap();
    path
}
