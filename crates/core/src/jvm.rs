//! JVM version canonicalization.
//!
//! Nodes report free-form `java.version` strings. Before interning they are
//! collapsed to a short release label:
//! - legacy HotSpot VM build strings (`25.<update>-b<build>`) map to `1.8`
//! - `1.x...` strings keep their first two dot-delimited tokens (`1.8.0_292` -> `1.8`)
//! - anything else keeps its leading dot-delimited segment (`11.0.12` -> `11`)

use std::sync::LazyLock;

use regex::Regex;

/// HotSpot 25.x is the VM shipped with Java 8.
static LEGACY_HOTSPOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^25\.\d+-b\d+").expect("valid regex"));

const LEGACY_HOTSPOT_RELEASE: &str = "1.8";

/// Returns the short release label for a raw JVM version string.
pub fn canonical_jvm_version(raw: &str) -> String {
    if LEGACY_HOTSPOT.is_match(raw) {
        return LEGACY_HOTSPOT_RELEASE.to_string();
    }

    if raw.starts_with("1.") {
        return raw.split('.').take(2).collect::<Vec<_>>().join(".");
    }

    raw.split('.').next().unwrap_or_default().to_string()
}

/// Whether a canonical JVM label is one the JVM report tracks
/// (two digits, or `digit.digit`).
pub fn is_reportable_jvm(name: &str) -> bool {
    let bytes = name.as_bytes();
    match bytes {
        [a, b] => a.is_ascii_digit() && b.is_ascii_digit(),
        [a, b'.', c] => a.is_ascii_digit() && c.is_ascii_digit(),
        _ => false,
    }
}
