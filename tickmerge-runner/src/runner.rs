//! Merge runner: wires discovery, readers, the coordinator and the CSV sink.

use std::path::PathBuf;
use std::time::Instant;

use chrono::Local;
use thiserror::Error;

use tickmerge_core::logging::LogHandle;
use tickmerge_core::merge::{MergeCoordinator, MergeError};
use tickmerge_core::reader::{ChunkedRecordReader, ReaderError};
use tickmerge_core::sink::{CsvQuoteSink, SinkError};

use crate::config::{ConfigError, MergeConfig};
use crate::discovery::{discover_inputs, DiscoveryError};
use crate::summary::{digest_file, RunSummary, SCHEMA_VERSION};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("failed to open input: {0}")]
    Reader(#[from] ReaderError),

    #[error("merge failed: {0}")]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("failed to hash output {}: {source}", path.display())]
    Digest {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Merge every matching input file into the configured output file.
///
/// The output is truncated and rewritten on every run; with unchanged inputs
/// it is byte-identical, which [`RunSummary::output_digest`] makes checkable.
pub fn run_merge(config: &MergeConfig, log: &LogHandle) -> Result<RunSummary, RunError> {
    let started_at = Local::now();
    let clock = Instant::now();

    log.log(format!("Session Start: {}", config.session.start()));
    log.log(format!("Session End: {}", config.session.end()));
    log.log(format!("Input Folder: {}", config.input_folder.display()));
    log.log(format!("Output File: {}", config.output_file.display()));
    log.log(format!(
        "Searching for files in folder: {}",
        config.input_folder.display()
    ));

    let inputs = discover_inputs(&config.input_folder, &config.file_prefix)?;
    for path in &inputs {
        let name = path.file_name().unwrap_or(path.as_os_str());
        log.log(format!("Found file with prefix: {}", name.to_string_lossy()));
    }
    if inputs.is_empty() {
        log.log(format!(
            "No files starting with '{}' in {}",
            config.file_prefix,
            config.input_folder.display()
        ));
    }

    let mut readers = Vec::with_capacity(inputs.len());
    for (origin, path) in inputs.iter().enumerate() {
        let reader = ChunkedRecordReader::open(path, origin, log.clone()).map_err(|e| {
            log.log(format!("Failed to open file: {}", path.display()));
            e
        })?;
        readers.push(reader.with_parse_error_policy(config.on_parse_error));
    }

    let coordinator = MergeCoordinator::new(
        readers,
        config.session,
        config.buffer_size,
        log.clone(),
    )?
    .with_refill_policy(config.refill_policy);

    let mut sink = CsvQuoteSink::create(&config.output_file)?;
    let stats = coordinator.run(&mut sink)?;
    let output_rows = sink.rows();
    // Flushes and closes the file before it is hashed.
    drop(sink.into_inner()?);

    let output_digest = digest_file(&config.output_file).map_err(|source| RunError::Digest {
        path: config.output_file.clone(),
        source,
    })?;
    log.log(format!(
        "Processing complete. Output written to: {}",
        config.output_file.display()
    ));

    Ok(RunSummary {
        schema_version: SCHEMA_VERSION,
        config: config.clone(),
        inputs,
        output_file: config.output_file.clone(),
        output_rows,
        output_digest,
        started_at,
        elapsed_ms: u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX),
        merge: stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tickmerge_core::domain::{SessionWindow, TimeKey};

    fn config(dir: &std::path::Path) -> MergeConfig {
        MergeConfig {
            session: SessionWindow::new(TimeKey(20240305091500), TimeKey(20240305153000)).unwrap(),
            input_folder: dir.join("in"),
            output_file: dir.join("out.csv"),
            buffer_size: 4096,
            file_prefix: "NSE_".into(),
            refill_policy: Default::default(),
            on_parse_error: Default::default(),
        }
    }

    #[test]
    fn no_inputs_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("in")).unwrap();
        let (log, capture) = LogHandle::capturing();

        let summary = run_merge(&config(dir.path()), &log).unwrap();
        assert_eq!(summary.output_rows, 0);
        assert!(summary.inputs.is_empty());
        assert_eq!(
            fs::read_to_string(dir.path().join("out.csv")).unwrap(),
            "ScriptName,TimeStamp,Bid,Ask,Bid_Quantity,Ask_Quntity,ltp\n"
        );
        let messages = capture.messages();
        assert!(messages.iter().any(|m| m.starts_with("No files starting with 'NSE_'")));
        assert!(messages.last().unwrap().starts_with("Processing complete."));
    }

    #[test]
    fn missing_input_folder_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_merge(&config(dir.path()), &LogHandle::disabled()).unwrap_err();
        assert!(matches!(err, RunError::Discovery(_)));
    }

    #[test]
    fn unwritable_output_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("in")).unwrap();
        let mut cfg = config(dir.path());
        cfg.output_file = dir.path().join("no/such/dir/out.csv");
        let err = run_merge(&cfg, &LogHandle::disabled()).unwrap_err();
        assert!(matches!(err, RunError::Sink(SinkError::Create { .. })));
    }
}
