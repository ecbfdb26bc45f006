//! tickmerge CLI: merge per-instrument tick files into one time-ordered CSV.
//!
//! Usage: `tickmerge <CONFIG> [--log-file PATH] [--summary-json PATH] [--quiet]`
//!
//! Exit status is 0 on success and 1 on any fatal error, including a missing
//! or invalid argument. `--help` and `--version` exit 0.

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tickmerge_core::logging::{LogHandle, LogSink};
use tickmerge_runner::{load_config, run_merge, MergeConfig};

const DEFAULT_LOG_FILE: &str = "log.txt";

#[derive(Parser)]
#[command(
    name = "tickmerge",
    version,
    about = "Merge time-sorted tick files into one session-filtered CSV"
)]
struct Cli {
    /// Path to the key=value config file.
    config: PathBuf,

    /// Log file (appended to).
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,

    /// Also write the run summary as JSON to this path.
    #[arg(long)]
    summary_json: Option<PathBuf>,

    /// Do not print the run summary.
    #[arg(long, short, default_value_t = false)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            if e.kind() == ErrorKind::MissingRequiredArgument {
                log_once(
                    Path::new(DEFAULT_LOG_FILE),
                    "Error: Config file path must be provided as a command line argument!",
                );
            }
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    let sink = match LogSink::open(&cli.log_file) {
        Ok(sink) => sink,
        Err(e) => {
            eprintln!("Error: cannot open log file {}: {e}", cli.log_file.display());
            return ExitCode::FAILURE;
        }
    };

    let code = match run(&cli, &sink.handle()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            sink.log(format!("Error: {e:#}"));
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    };

    if let Err(e) = sink.shutdown() {
        eprintln!("Warning: failed to flush log file {}: {e}", cli.log_file.display());
    }
    code
}

fn run(cli: &Cli, log: &LogHandle) -> Result<()> {
    log.log(format!(
        "Attempting to load config from: {}",
        cli.config.display()
    ));
    let map = load_config(&cli.config).context("Error loading config")?;
    log.log("Config loaded successfully.");

    let config = MergeConfig::from_map(&map)?;
    let summary = run_merge(&config, log)?;

    if !cli.quiet {
        println!("{summary}");
    }
    if let Some(path) = &cli.summary_json {
        std::fs::write(path, summary.to_json_pretty()?)
            .with_context(|| format!("failed to write summary to {}", path.display()))?;
        if !cli.quiet {
            println!("Summary written to: {}", path.display());
        }
    }
    Ok(())
}

/// Best-effort single log line for failures before the real sink exists.
fn log_once(path: &Path, message: &str) {
    if let Ok(sink) = LogSink::open(path) {
        sink.log(message);
        let _ = sink.shutdown();
    }
}
