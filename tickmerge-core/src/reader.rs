//! Chunked, line-reconstructing reader for one tick file.
//!
//! Each [`pull`](ChunkedRecordReader::pull) reads one bounded chunk of raw
//! bytes, appends it to the partial line carried over from the previous pull
//! and parses every complete line it now holds. The unterminated tail is kept
//! for the next pull. The first complete line of the file is the header and
//! is never parsed.
//!
//! Bytes left in the carry when the source runs dry (a last line with no
//! trailing newline) are dropped without an error; only
//! [`ReaderStats::trailing_bytes_dropped`] records them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::codec::{parse_quote_line, LineParseError};
use crate::domain::{FileIndex, QuoteRecord};
use crate::logging::LogHandle;

/// What a pull does after a line fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorPolicy {
    /// Return the records parsed so far; the rest of the chunk is abandoned.
    #[default]
    TruncateChunk,
    /// Drop only the offending line and keep parsing the chunk.
    SkipLine,
}

impl FromStr for ParseErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "truncate_chunk" => Ok(Self::TruncateChunk),
            "skip_line" => Ok(Self::SkipLine),
            other => Err(format!(
                "unknown parse error policy '{other}' (expected truncate_chunk or skip_line)"
            )),
        }
    }
}

impl fmt::Display for ParseErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TruncateChunk => write!(f, "truncate_chunk"),
            Self::SkipLine => write!(f, "skip_line"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("failed to open input file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("chunk size must be greater than zero")]
    ZeroChunkSize,
}

/// Per-file counters, reported in the run summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderStats {
    pub pulls: u64,
    pub bytes_read: u64,
    pub records_parsed: u64,
    pub parse_errors: u64,
    /// Complete lines skipped because an earlier line in the chunk failed.
    pub lines_abandoned: u64,
    pub blank_lines: u64,
    pub trailing_bytes_dropped: u64,
}

/// Result of one pull.
#[derive(Debug, Default)]
pub struct PullOutcome {
    pub records: Vec<QuoteRecord>,
    /// False once the source returned no bytes. No further pull yields data.
    pub has_more: bool,
}

impl PullOutcome {
    fn finished() -> Self {
        Self {
            records: Vec::new(),
            has_more: false,
        }
    }
}

pub struct ChunkedRecordReader<R> {
    source: R,
    origin: FileIndex,
    label: String,
    /// Reusable chunk buffer, sized on first pull.
    buf: Vec<u8>,
    /// Unterminated tail of the previous chunk.
    carry: Vec<u8>,
    header_skipped: bool,
    exhausted: bool,
    line_no: u64,
    policy: ParseErrorPolicy,
    log: LogHandle,
    stats: ReaderStats,
}

impl ChunkedRecordReader<File> {
    /// Open a tick file. Records are tagged with `origin`.
    pub fn open(path: &Path, origin: FileIndex, log: LogHandle) -> Result<Self, ReaderError> {
        let file = File::open(path).map_err(|source| ReaderError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(file, origin, path.display().to_string(), log))
    }
}

impl<R: Read> ChunkedRecordReader<R> {
    /// Wrap any byte source. `label` names the source in log messages.
    pub fn new(source: R, origin: FileIndex, label: impl Into<String>, log: LogHandle) -> Self {
        Self {
            source,
            origin,
            label: label.into(),
            buf: Vec::new(),
            carry: Vec::new(),
            header_skipped: false,
            exhausted: false,
            line_no: 0,
            policy: ParseErrorPolicy::default(),
            log,
            stats: ReaderStats::default(),
        }
    }

    pub fn with_parse_error_policy(mut self, policy: ParseErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn origin(&self) -> FileIndex {
        self.origin
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn stats(&self) -> &ReaderStats {
        &self.stats
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Read the next chunk of at most `chunk_size` bytes and parse every line
    /// it completes.
    pub fn pull(&mut self, chunk_size: usize) -> Result<PullOutcome, ReaderError> {
        if chunk_size == 0 {
            return Err(ReaderError::ZeroChunkSize);
        }
        if self.exhausted {
            return Ok(PullOutcome::finished());
        }
        self.stats.pulls += 1;

        if self.buf.len() != chunk_size {
            self.buf.resize(chunk_size, 0);
        }
        let n = match fill_chunk(&mut self.source, &mut self.buf) {
            Ok(n) => n,
            Err(e) => {
                self.log
                    .log(format!("Error reading file chunk from {}: {e}", self.label));
                self.finish();
                return Ok(PullOutcome::finished());
            }
        };
        if n == 0 {
            self.finish();
            return Ok(PullOutcome::finished());
        }
        self.stats.bytes_read += n as u64;

        let mut carry = std::mem::take(&mut self.carry);
        carry.extend_from_slice(&self.buf[..n]);
        let mut records = Vec::new();
        let consumed = self.parse_complete_lines(&carry, &mut records);
        carry.drain(..consumed);
        self.carry = carry;

        Ok(PullOutcome {
            records,
            has_more: true,
        })
    }

    /// Parse the complete lines at the front of `text`; returns the number of
    /// bytes they span (including their newlines).
    fn parse_complete_lines(&mut self, text: &[u8], records: &mut Vec<QuoteRecord>) -> usize {
        let mut start = 0;
        let mut abandoning = false;
        let mut abandoned = 0u64;

        while let Some(offset) = text[start..].iter().position(|&b| b == b'\n') {
            let raw = &text[start..start + offset];
            start += offset + 1;
            self.line_no += 1;

            if !self.header_skipped {
                self.header_skipped = true;
                continue;
            }
            if abandoning {
                abandoned += 1;
                continue;
            }

            let parsed = std::str::from_utf8(raw)
                .map_err(|_| LineParseError::NotUtf8)
                .and_then(|line| {
                    if line.trim().is_empty() {
                        Ok(None)
                    } else {
                        parse_quote_line(line, self.origin).map(Some)
                    }
                });

            match parsed {
                Ok(Some(quote)) => {
                    self.stats.records_parsed += 1;
                    records.push(quote);
                }
                Ok(None) => self.stats.blank_lines += 1,
                Err(e) => {
                    self.stats.parse_errors += 1;
                    self.log.log(format!(
                        "Error parsing {} line {}: {e}",
                        self.label, self.line_no
                    ));
                    if self.policy == ParseErrorPolicy::TruncateChunk {
                        abandoning = true;
                    }
                }
            }
        }

        if abandoned > 0 {
            self.stats.lines_abandoned += abandoned;
            self.log.log(format!(
                "Skipped {abandoned} line(s) of {} after a parse error in the same chunk",
                self.label
            ));
        }
        start
    }

    fn finish(&mut self) {
        self.exhausted = true;
        if !self.carry.is_empty() {
            self.stats.trailing_bytes_dropped += self.carry.len() as u64;
            self.carry.clear();
        }
    }
}

/// Read until `buf` is full or the source is at EOF.
fn fill_chunk<R: Read>(source: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
