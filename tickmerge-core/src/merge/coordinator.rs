//! K-way merge over chunked readers.
//!
//! Protocol:
//! 1. Prime: pull every reader; queue its in-session records.
//! 2. Pop the smallest time key, write it, then pull again from the reader
//!    that produced it and queue whatever it yields in-session.
//! 3. Stop when the queue is empty and no reader has data left.
//!
//! The merge is correct because every file is sorted: the unread part of a
//! file can only hold keys >= the largest key already pulled from it. For
//! that argument to cover a file, the queue must hold at least one of its
//! records while the file still has data. A single pull does not guarantee
//! this (a chunk shorter than one line, or a chunk entirely before the
//! session), so a file with nothing queued is pulled until it contributes a
//! record or runs dry.
//!
//! Once a file yields a key past the session end, it is retired: nothing
//! later in it can be in-session.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;
use std::str::FromStr;
use thiserror::Error;

use super::min_queue::MinQueue;
use crate::domain::{FileIndex, QuoteRecord, SessionWindow, TimeKey};
use crate::logging::LogHandle;
use crate::reader::{ChunkedRecordReader, ReaderError, ReaderStats};
use crate::sink::{QuoteSink, SinkError};

/// When the coordinator pulls from a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefillPolicy {
    /// Pull from the origin file after every emitted record.
    #[default]
    EveryEmit,
    /// Pull only once the origin file has nothing left in the queue.
    /// Bounds the queue to roughly one chunk of records per file.
    OnDrain,
}

impl FromStr for RefillPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "every_emit" => Ok(Self::EveryEmit),
            "on_drain" => Ok(Self::OnDrain),
            other => Err(format!(
                "unknown refill policy '{other}' (expected every_emit or on_drain)"
            )),
        }
    }
}

impl fmt::Display for RefillPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EveryEmit => write!(f, "every_emit"),
            Self::OnDrain => write!(f, "on_drain"),
        }
    }
}

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("reader at position {position} is tagged with origin {origin}")]
    OriginMismatch { position: usize, origin: FileIndex },

    #[error(transparent)]
    Reader(#[from] ReaderError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Per-file outcome of a merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStats {
    pub origin: FileIndex,
    pub label: String,
    pub records_emitted: u64,
    pub retired_past_session: bool,
    pub reader: ReaderStats,
}

/// Outcome of a merge run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeStats {
    pub records_emitted: u64,
    /// Parsed records dropped because their key was outside the session.
    pub records_outside_session: u64,
    pub pulls: u64,
    pub peak_queue_len: usize,
    pub first_time: Option<TimeKey>,
    pub last_time: Option<TimeKey>,
    pub files: Vec<FileStats>,
}

struct FileState {
    /// Records from this file currently in the queue.
    queued: usize,
    /// No more pulls: source exhausted or past the session end.
    done: bool,
    retired_past_session: bool,
    emitted: u64,
}

type QuoteQueue = MinQueue<QuoteRecord, TimeKey, fn(&QuoteRecord) -> TimeKey>;

pub struct MergeCoordinator<R> {
    readers: Vec<ChunkedRecordReader<R>>,
    files: Vec<FileState>,
    session: SessionWindow,
    chunk_size: usize,
    policy: RefillPolicy,
    log: LogHandle,
    stats: MergeStats,
}

impl<R: Read> MergeCoordinator<R> {
    /// `readers[i]` must tag its records with origin `i`.
    pub fn new(
        readers: Vec<ChunkedRecordReader<R>>,
        session: SessionWindow,
        chunk_size: usize,
        log: LogHandle,
    ) -> Result<Self, MergeError> {
        if chunk_size == 0 {
            return Err(ReaderError::ZeroChunkSize.into());
        }
        for (position, reader) in readers.iter().enumerate() {
            if reader.origin() != position {
                return Err(MergeError::OriginMismatch {
                    position,
                    origin: reader.origin(),
                });
            }
        }
        let files = readers
            .iter()
            .map(|_| FileState {
                queued: 0,
                done: false,
                retired_past_session: false,
                emitted: 0,
            })
            .collect();

        Ok(Self {
            readers,
            files,
            session,
            chunk_size,
            policy: RefillPolicy::default(),
            log,
            stats: MergeStats::default(),
        })
    }

    pub fn with_refill_policy(mut self, policy: RefillPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Merge every reader into `sink` in ascending time-key order.
    pub fn run<S: QuoteSink>(mut self, sink: &mut S) -> Result<MergeStats, MergeError> {
        self.log.log(format!(
            "Merging {} file(s): chunk size {} bytes, session [{}, {}], refill {}",
            self.readers.len(),
            self.chunk_size,
            self.session.start(),
            self.session.end(),
            self.policy
        ));

        let mut queue: QuoteQueue = MinQueue::with_capacity(
            self.readers.len(),
            QuoteRecord::time_key as fn(&QuoteRecord) -> TimeKey,
        );

        for origin in 0..self.readers.len() {
            self.refill(origin, &mut queue)?;
        }

        while let Some(quote) = queue.pop() {
            let origin = quote.origin;
            self.files[origin].queued -= 1;
            self.files[origin].emitted += 1;

            sink.write_quote(&quote)?;
            self.stats.records_emitted += 1;
            self.stats.first_time.get_or_insert(quote.time);
            self.stats.last_time = Some(quote.time);

            match self.policy {
                RefillPolicy::EveryEmit => self.refill(origin, &mut queue)?,
                RefillPolicy::OnDrain if self.files[origin].queued == 0 => {
                    self.refill(origin, &mut queue)?
                }
                RefillPolicy::OnDrain => {}
            }
        }
        sink.finish()?;

        self.stats.peak_queue_len = queue.peak_len();
        self.stats.files = self
            .readers
            .iter()
            .zip(&self.files)
            .map(|(reader, state)| FileStats {
                origin: reader.origin(),
                label: reader.label().to_string(),
                records_emitted: state.emitted,
                retired_past_session: state.retired_past_session,
                reader: reader.stats().clone(),
            })
            .collect();

        self.log.log(format!(
            "Merge complete: {} record(s) emitted, {} outside session, {} pull(s), peak queue {}",
            self.stats.records_emitted,
            self.stats.records_outside_session,
            self.stats.pulls,
            self.stats.peak_queue_len
        ));
        Ok(self.stats)
    }

    /// Pull once from `origin`, then keep pulling while it has nothing queued
    /// and still has data.
    fn refill(&mut self, origin: FileIndex, queue: &mut QuoteQueue) -> Result<(), MergeError> {
        self.pull_once(origin, queue)?;
        while self.files[origin].queued == 0 && !self.files[origin].done {
            self.pull_once(origin, queue)?;
        }
        Ok(())
    }

    fn pull_once(&mut self, origin: FileIndex, queue: &mut QuoteQueue) -> Result<(), MergeError> {
        if self.files[origin].done {
            return Ok(());
        }
        let outcome = self.readers[origin].pull(self.chunk_size)?;
        self.stats.pulls += 1;

        let state = &mut self.files[origin];
        if !outcome.has_more {
            state.done = true;
        }
        for quote in outcome.records {
            if self.session.contains(quote.time) {
                state.queued += 1;
                queue.push(quote);
            } else {
                self.stats.records_outside_session += 1;
                if self.session.is_after(quote.time) && !state.retired_past_session {
                    state.done = true;
                    state.retired_past_session = true;
                    self.log.log(format!(
                        "{} passed session end at {}; no further reads",
                        self.readers[origin].label(),
                        quote.time
                    ));
                }
            }
        }
        Ok(())
    }
}
