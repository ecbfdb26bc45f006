//! Flat `key=value` run configuration.
//!
//! One pair per line, split on the first `=`. No sections, quoting or
//! comments. A line without `=` or with an empty value is malformed, and so
//! is a blank line. Later duplicates override earlier ones.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use tickmerge_core::domain::{SessionError, SessionWindow, TimeKey};
use tickmerge_core::merge::RefillPolicy;
use tickmerge_core::reader::ParseErrorPolicy;

/// Raw keys and values as read from the file.
pub type ConfigMap = BTreeMap<String, String>;

pub const KEY_SESSION_START: &str = "session_start";
pub const KEY_SESSION_END: &str = "session_end";
pub const KEY_INPUT_FOLDER: &str = "input_folder";
pub const KEY_OUTPUT_FILE: &str = "output_file";
pub const KEY_BUFFER_SIZE: &str = "buffer_size";
pub const KEY_FILE_PREFIX: &str = "file_prefix";
pub const KEY_REFILL_POLICY: &str = "refill_policy";
pub const KEY_ON_PARSE_ERROR: &str = "on_parse_error";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not open config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid format in config file at line {line}: expected key=value")]
    Malformed { line: usize },

    #[error("missing key in config: {0}")]
    MissingKey(&'static str),

    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid session window: {0}")]
    Session(#[from] SessionError),
}

/// Read and parse a config file.
pub fn load_config(path: &Path) -> Result<ConfigMap, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&text)
}

/// Parse config text. Line numbers in errors are 1-based.
pub fn parse_config(text: &str) -> Result<ConfigMap, ConfigError> {
    let mut map = ConfigMap::new();
    for (i, raw) in text.lines().enumerate() {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        match line.split_once('=') {
            Some((key, value)) if !value.is_empty() => {
                map.insert(key.to_string(), value.to_string());
            }
            _ => return Err(ConfigError::Malformed { line: i + 1 }),
        }
    }
    Ok(map)
}

/// Typed settings for one merge run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeConfig {
    pub session: SessionWindow,
    pub input_folder: PathBuf,
    pub output_file: PathBuf,
    /// Bytes per read chunk; always positive.
    pub buffer_size: usize,
    pub file_prefix: String,
    #[serde(default)]
    pub refill_policy: RefillPolicy,
    #[serde(default)]
    pub on_parse_error: ParseErrorPolicy,
}

impl MergeConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_map(&load_config(path)?)
    }

    pub fn from_map(map: &ConfigMap) -> Result<Self, ConfigError> {
        let start = parse_key::<TimeKey>(map, KEY_SESSION_START)?;
        let end = parse_key::<TimeKey>(map, KEY_SESSION_END)?;
        let session = SessionWindow::new(start, end)?;

        let buffer_size = parse_key::<usize>(map, KEY_BUFFER_SIZE)?;
        if buffer_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: KEY_BUFFER_SIZE,
                value: "0".into(),
                reason: "must be positive".into(),
            });
        }

        let refill_policy = optional_key(map, KEY_REFILL_POLICY)?.unwrap_or_default();
        let on_parse_error = optional_key(map, KEY_ON_PARSE_ERROR)?.unwrap_or_default();

        Ok(Self {
            session,
            input_folder: PathBuf::from(required(map, KEY_INPUT_FOLDER)?),
            output_file: PathBuf::from(required(map, KEY_OUTPUT_FILE)?),
            buffer_size,
            file_prefix: required(map, KEY_FILE_PREFIX)?.to_string(),
            refill_policy,
            on_parse_error,
        })
    }
}

fn required<'a>(map: &'a ConfigMap, key: &'static str) -> Result<&'a str, ConfigError> {
    map.get(key)
        .map(String::as_str)
        .ok_or(ConfigError::MissingKey(key))
}

fn parse_value<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: e.to_string(),
        })
}

fn parse_key<T>(map: &ConfigMap, key: &'static str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, required(map, key)?)
}

fn optional_key<T>(map: &ConfigMap, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    map.get(key).map(|v| parse_value(key, v)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = "session_start=20240305091500\n\
                         session_end=20240305153000\n\
                         input_folder=data/in\n\
                         output_file=data/out.csv\n\
                         buffer_size=4096\n\
                         file_prefix=NSE_\n";

    #[test]
    fn parses_valid_config() {
        let cfg = MergeConfig::from_map(&parse_config(VALID).unwrap()).unwrap();
        assert_eq!(cfg.session.start(), TimeKey(20240305091500));
        assert_eq!(cfg.session.end(), TimeKey(20240305153000));
        assert_eq!(cfg.input_folder, PathBuf::from("data/in"));
        assert_eq!(cfg.output_file, PathBuf::from("data/out.csv"));
        assert_eq!(cfg.buffer_size, 4096);
        assert_eq!(cfg.file_prefix, "NSE_");
        assert_eq!(cfg.refill_policy, RefillPolicy::EveryEmit);
        assert_eq!(cfg.on_parse_error, ParseErrorPolicy::TruncateChunk);
    }

    #[test]
    fn splits_on_first_equals_and_keeps_spaces() {
        let map = parse_config("output_file=a=b.csv\nfile_prefix= X \n").unwrap();
        assert_eq!(map["output_file"], "a=b.csv");
        assert_eq!(map["file_prefix"], " X ");
    }

    #[test]
    fn later_duplicate_wins_and_crlf_is_stripped() {
        let map = parse_config("buffer_size=1\r\nbuffer_size=2\r\n").unwrap();
        assert_eq!(map["buffer_size"], "2");
    }

    #[test]
    fn malformed_lines_report_line_number() {
        for (text, line) in [
            ("a=1\nno_equals\n", 2),
            ("a=\n", 1),
            ("a=1\n\nb=2\n", 2),
        ] {
            match parse_config(text) {
                Err(ConfigError::Malformed { line: l }) => assert_eq!(l, line, "{text:?}"),
                other => panic!("expected malformed for {text:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn empty_file_parses_to_empty_map() {
        assert!(parse_config("").unwrap().is_empty());
    }

    #[test]
    fn missing_key_is_named() {
        let text = VALID.replace("file_prefix=NSE_\n", "");
        let err = MergeConfig::from_map(&parse_config(&text).unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey("file_prefix")));
        assert_eq!(err.to_string(), "missing key in config: file_prefix");
    }

    #[test]
    fn rejects_bad_numbers() {
        for (from, to, key) in [
            ("buffer_size=4096", "buffer_size=0", "buffer_size"),
            ("buffer_size=4096", "buffer_size=big", "buffer_size"),
            ("session_start=20240305091500", "session_start=9:15", "session_start"),
        ] {
            let text = VALID.replace(from, to);
            match MergeConfig::from_map(&parse_config(&text).unwrap()) {
                Err(ConfigError::InvalidValue { key: k, .. }) => assert_eq!(k, key),
                other => panic!("expected invalid {key}, got {other:?}"),
            }
        }
    }

    #[test]
    fn rejects_inverted_session() {
        let text = VALID.replace("session_end=20240305153000", "session_end=20240305091459");
        let err = MergeConfig::from_map(&parse_config(&text).unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::Session(_)));
    }

    #[test]
    fn optional_policies() {
        let text = format!("{VALID}refill_policy=on_drain\non_parse_error=skip_line\n");
        let cfg = MergeConfig::from_map(&parse_config(&text).unwrap()).unwrap();
        assert_eq!(cfg.refill_policy, RefillPolicy::OnDrain);
        assert_eq!(cfg.on_parse_error, ParseErrorPolicy::SkipLine);

        let text = format!("{VALID}refill_policy=sometimes\n");
        assert!(matches!(
            MergeConfig::from_map(&parse_config(&text).unwrap()),
            Err(ConfigError::InvalidValue { key: "refill_policy", .. })
        ));
    }

    #[test]
    fn load_reports_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("missing.cfg")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().starts_with("could not open config file"));
    }
}
