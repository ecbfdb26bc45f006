//! Run summary: what was merged, what was written, and a digest of the output.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use tickmerge_core::domain::TimeKey;
use tickmerge_core::merge::MergeStats;

use crate::config::MergeConfig;

/// Current schema version for serialized summaries.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub schema_version: u32,
    pub config: MergeConfig,
    pub inputs: Vec<PathBuf>,
    pub output_file: PathBuf,
    /// Data rows written (header excluded).
    pub output_rows: u64,
    /// BLAKE3 hex digest of the whole output file.
    pub output_digest: String,
    pub started_at: DateTime<Local>,
    pub elapsed_ms: u64,
    pub merge: MergeStats,
}

impl RunSummary {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Merged {} file(s) into {}", self.inputs.len(), self.output_file.display())?;
        writeln!(
            f,
            "  session:          [{}, {}]",
            self.config.session.start(),
            self.config.session.end()
        )?;
        writeln!(f, "  rows written:     {}", self.output_rows)?;
        writeln!(f, "  outside session:  {}", self.merge.records_outside_session)?;
        match (self.merge.first_time, self.merge.last_time) {
            (Some(first), Some(last)) => writeln!(
                f,
                "  time range:       {} .. {}",
                readable(first),
                readable(last)
            )?,
            _ => writeln!(f, "  time range:       (empty)")?,
        }
        writeln!(f, "  pulls:            {}", self.merge.pulls)?;
        writeln!(f, "  peak queue:       {}", self.merge.peak_queue_len)?;
        for file in &self.merge.files {
            let r = &file.reader;
            writeln!(
                f,
                "  [{}] {}: {} emitted, {} parsed, {} parse error(s), {} abandoned",
                file.origin, file.label, file.records_emitted, r.records_parsed, r.parse_errors, r.lines_abandoned
            )?;
        }
        writeln!(f, "  blake3:           {}", self.output_digest)?;
        write!(f, "  elapsed:          {} ms", self.elapsed_ms)
    }
}

/// `20240305091500 (2024-03-05 09:15:00)`, or just the key if it is not a real instant.
fn readable(key: TimeKey) -> String {
    match key.to_datetime() {
        Some(dt) => format!("{key} ({dt})"),
        None => key.to_string(),
    }
}

/// BLAKE3 hex digest of a file's contents.
pub fn digest_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = blake3::Hasher::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hasher.finalize().to_hex().to_string())
}
