//! Snapshot normalizer: gzip-compressed, newline-delimited JSON daily files.
//!
//! Tolerated per-line corruption (counted and skipped):
//! - numeric fields that are negative or overflow `u64`
//! - job counts delivered as arrays instead of numbers
//!
//! Any other undecodable line is fatal for the file (`INPUT_002`).

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use serde_json::error::Category;
use stats_core::{Error, InputErrorCode, Result, Snapshot};
use tracing::debug;

/// Decoded contents of one daily file.
#[derive(Debug, Default)]
pub struct DecodedFile {
    pub snapshots: Vec<Snapshot>,
    /// Lines dropped under the tolerance rules
    pub tolerated: u64,
}

/// Whether a decode failure falls under the tolerance rules.
///
/// Every `u64` field of a snapshot is either an executor count or a job
/// count, so a data error that expected a `u64` is exactly the tolerated set.
fn is_tolerated(err: &serde_json::Error) -> bool {
    err.classify() == Category::Data && err.to_string().contains("expected u64")
}

/// Decodes newline-delimited snapshot records from an uncompressed reader.
pub fn decode_snapshots<R: BufRead>(reader: R) -> Result<DecodedFile> {
    let mut decoded = DecodedFile::default();

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|e| {
            Error::input(
                InputErrorCode::UnreadableFile,
                format!("read failed at line {line_no}: {e}"),
            )
        })?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<Snapshot>(&line) {
            Ok(mut snapshot) => {
                snapshot.strip_private_plugins();
                decoded.snapshots.push(snapshot);
            }
            Err(e) if is_tolerated(&e) => {
                debug!(line = line_no, error = %e, "Skipping corrupt snapshot line");
                decoded.tolerated += 1;
            }
            Err(e) => {
                return Err(Error::input(
                    InputErrorCode::MalformedLine,
                    format!("line {line_no}: {e}"),
                ));
            }
        }
    }

    Ok(decoded)
}

/// Opens, decompresses and decodes one daily file.
pub fn decode_daily_file(path: &Path) -> Result<DecodedFile> {
    let file = File::open(path).map_err(|e| {
        Error::input(
            InputErrorCode::UnreadableFile,
            format!("cannot open {}: {e}", path.display()),
        )
    })?;
    decode_snapshots(BufReader::new(MultiGzDecoder::new(file)))
}
