//! tickmerge core: decoding and merging of per-instrument tick files.
//!
//! This crate contains the engine:
//! - Domain types (time keys, quote records, session windows)
//! - Codecs for date/time tokens, fixed-point prices and input lines
//! - Chunked record readers with bounded read buffers
//! - The min-queue and merge coordinator
//! - Output sinks and the asynchronous log sink

pub mod codec;
pub mod domain;
pub mod logging;
pub mod merge;
pub mod reader;
pub mod sink;

pub use domain::{FileIndex, QuoteRecord, SessionError, SessionWindow, TimeKey};
pub use logging::{LogHandle, LogSink};
pub use merge::{MergeCoordinator, MergeError, MergeStats, RefillPolicy};
pub use reader::{ChunkedRecordReader, ParseErrorPolicy, ReaderError, ReaderStats};
pub use sink::{CsvQuoteSink, QuoteSink, SinkError};
