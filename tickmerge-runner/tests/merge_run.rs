//! Integration tests for full merge runs driven by a config file.

use std::fs;
use std::path::{Path, PathBuf};
use tickmerge_core::logging::{LogHandle, LogSink};
use tickmerge_runner::{run_merge, MergeConfig, RunError};

const HEADER: &str = "ticker,date,time,ltp,buyPrice,buyQty,sellPrice,sellQty,ltq,openInterest\n";
const OUTPUT_HEADER: &str = "ScriptName,TimeStamp,Bid,Ask,Bid_Quantity,Ask_Quntity,ltp\n";

struct Fixture {
    _dir: tempfile::TempDir,
    root: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        fs::create_dir(root.join("in")).unwrap();
        Self { _dir: dir, root }
    }

    fn input(&self, name: &str, rows: &[&str]) {
        let mut text = HEADER.to_string();
        for row in rows {
            text.push_str(row);
            text.push('\n');
        }
        fs::write(self.root.join("in").join(name), text).unwrap();
    }

    fn config(&self, buffer_size: usize, extra: &str) -> PathBuf {
        let path = self.root.join("merge.cfg");
        fs::write(
            &path,
            format!(
                "session_start=20240305091500\n\
                 session_end=20240305153000\n\
                 input_folder={}\n\
                 output_file={}\n\
                 buffer_size={buffer_size}\n\
                 file_prefix=NSE_\n{extra}",
                self.root.join("in").display(),
                self.output().display()
            ),
        )
        .unwrap();
        path
    }

    fn output(&self) -> PathBuf {
        self.root.join("out.csv")
    }
}

fn run(config: &Path) -> tickmerge_runner::RunSummary {
    let cfg = MergeConfig::load(config).unwrap();
    run_merge(&cfg, &LogHandle::disabled()).unwrap()
}

fn row(ticker: &str, time: &str) -> String {
    format!("{ticker},05/03/2024,{time},100.5,100.25,10,100.75,20,5,1000")
}

#[test]
fn merges_prefixed_files_in_time_order() {
    let fx = Fixture::new();
    fx.input("NSE_A.csv", &[&row("A", "09:15:00"), &row("A", "09:16:00")]);
    fx.input("NSE_B.csv", &[&row("B", "09:15:30")]);
    fx.input("BSE_C.csv", &[&row("C", "09:15:10")]);

    let summary = run(&fx.config(4096, ""));
    assert_eq!(summary.inputs.len(), 2);
    assert_eq!(summary.output_rows, 3);

    let out = fs::read_to_string(fx.output()).unwrap();
    assert_eq!(
        out,
        format!(
            "{OUTPUT_HEADER}\
             A,20240305091500,10025,10075,10,20,10050\n\
             B,20240305091530,10025,10075,10,20,10050\n\
             A,20240305091600,10025,10075,10,20,10050\n"
        )
    );
}

#[test]
fn session_boundaries_are_inclusive() {
    let fx = Fixture::new();
    fx.input(
        "NSE_A.csv",
        &[
            &row("A", "09:14:59"),
            &row("A", "09:15:00"),
            &row("A", "15:30:00"),
            &row("A", "15:30:01"),
        ],
    );
    let summary = run(&fx.config(4096, ""));
    assert_eq!(summary.output_rows, 2);
    assert_eq!(summary.merge.records_outside_session, 2);

    let out = fs::read_to_string(fx.output()).unwrap();
    let stamps: Vec<&str> = out.lines().skip(1).map(|l| l.split(',').nth(1).unwrap()).collect();
    assert_eq!(stamps, vec!["20240305091500", "20240305153000"]);
}

#[test]
fn rerun_is_byte_identical() {
    let fx = Fixture::new();
    fx.input("NSE_A.csv", &[&row("A", "09:15:00"), &row("A", "09:15:00"), &row("A", "09:20:00")]);
    fx.input("NSE_B.csv", &[&row("B", "09:15:00"), &row("B", "09:19:59")]);
    let config = fx.config(64, "");

    let first = run(&config);
    let bytes = fs::read(fx.output()).unwrap();
    let second = run(&config);
    assert_eq!(first.output_digest, second.output_digest);
    assert_eq!(fs::read(fx.output()).unwrap(), bytes);
}

#[test]
fn buffer_smaller_than_a_line_gives_same_output() {
    let fx = Fixture::new();
    fx.input("NSE_A.csv", &[&row("A", "09:15:00"), &row("A", "09:15:02"), &row("A", "09:15:04")]);
    fx.input("NSE_B.csv", &[&row("B", "09:15:01"), &row("B", "09:15:03")]);

    let big = run(&fx.config(1 << 16, ""));
    let tiny = run(&fx.config(7, ""));
    assert_eq!(big.output_digest, tiny.output_digest);
    assert_eq!(tiny.output_rows, 5);
    assert!(tiny.merge.pulls > big.merge.pulls);

    let drained = run(&fx.config(7, "refill_policy=on_drain\n"));
    assert_eq!(drained.output_digest, big.output_digest);
}

#[test]
fn skip_line_policy_keeps_the_rest_of_the_chunk() {
    let fx = Fixture::new();
    fx.input(
        "NSE_A.csv",
        &[&row("A", "09:15:00"), "A,05/03/2024,09:15:01,bad,1,1,1,1,1,1", &row("A", "09:15:02")],
    );
    assert_eq!(run(&fx.config(4096, "")).output_rows, 1);
    assert_eq!(run(&fx.config(4096, "on_parse_error=skip_line\n")).output_rows, 2);
}

#[test]
fn log_file_records_the_run() {
    let fx = Fixture::new();
    fx.input("NSE_A.csv", &[&row("A", "09:15:00")]);
    let log_path = fx.root.join("log.txt");

    let sink = LogSink::open(&log_path).unwrap();
    let cfg = MergeConfig::load(&fx.config(4096, "")).unwrap();
    run_merge(&cfg, &sink.handle()).unwrap();
    sink.shutdown().unwrap();

    let log = fs::read_to_string(&log_path).unwrap();
    for needle in [
        "[LOG]: Session Start: 20240305091500",
        "[LOG]: Session End: 20240305153000",
        "[LOG]: Found file with prefix: NSE_A.csv",
        "[LOG]: Processing complete. Output written to: ",
    ] {
        assert!(log.contains(needle), "missing {needle:?} in:\n{log}");
    }
}

#[test]
fn summary_serializes_to_json() {
    let fx = Fixture::new();
    fx.input("NSE_A.csv", &[&row("A", "09:15:00")]);
    let summary = run(&fx.config(4096, ""));

    let json: serde_json::Value = serde_json::from_str(&summary.to_json_pretty().unwrap()).unwrap();
    assert_eq!(json["schema_version"], 1);
    assert_eq!(json["output_rows"], 1);
    assert_eq!(json["config"]["file_prefix"], "NSE_");
    assert_eq!(json["config"]["refill_policy"], "every_emit");
    assert_eq!(json["merge"]["first_time"], 20240305091500i64);
    assert_eq!(json["output_digest"].as_str().unwrap().len(), 64);
}

#[test]
fn unopenable_config_values_surface_as_errors() {
    let fx = Fixture::new();
    let config = fx.config(4096, "");
    let mut cfg = MergeConfig::load(&config).unwrap();
    cfg.input_folder = fx.root.join("missing");
    assert!(matches!(
        run_merge(&cfg, &LogHandle::disabled()),
        Err(RunError::Discovery(_))
    ));
}
