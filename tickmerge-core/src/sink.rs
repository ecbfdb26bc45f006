//! Output sinks for merged quotes.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::QuoteRecord;

/// Output header. The `Ask_Quntity` spelling is what downstream consumers expect.
pub const OUTPUT_HEADER: [&str; 7] = [
    "ScriptName",
    "TimeStamp",
    "Bid",
    "Ask",
    "Bid_Quantity",
    "Ask_Quntity",
    "ltp",
];

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to create output file {}: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write output: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to flush output: {0}")]
    Io(#[from] io::Error),
}

/// Destination for quotes in emission order.
pub trait QuoteSink {
    fn write_quote(&mut self, quote: &QuoteRecord) -> Result<(), SinkError>;

    /// Flush buffered output. Called once after the last quote.
    fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl QuoteSink for Vec<QuoteRecord> {
    fn write_quote(&mut self, quote: &QuoteRecord) -> Result<(), SinkError> {
        self.push(quote.clone());
        Ok(())
    }
}

/// Writes `ScriptName,TimeStamp,Bid,Ask,Bid_Quantity,Ask_Quntity,ltp` rows.
pub struct CsvQuoteSink<W: Write> {
    writer: csv::Writer<W>,
    rows: u64,
}

impl CsvQuoteSink<BufWriter<File>> {
    /// Create (truncate) `path` and write the header.
    pub fn create(path: &Path) -> Result<Self, SinkError> {
        let file = File::create(path).map_err(|source| SinkError::Create {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> CsvQuoteSink<W> {
    pub fn new(inner: W) -> Result<Self, SinkError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(inner);
        writer.write_record(OUTPUT_HEADER)?;
        Ok(Self { writer, rows: 0 })
    }

    /// Data rows written so far (header excluded).
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> Result<W, SinkError> {
        self.writer
            .into_inner()
            .map_err(|e| SinkError::Io(e.into_error()))
    }
}

impl<W: Write> QuoteSink for CsvQuoteSink<W> {
    fn write_quote(&mut self, q: &QuoteRecord) -> Result<(), SinkError> {
        let (time, bid, ask) = (q.time.to_string(), q.bid.to_string(), q.ask.to_string());
        let (bid_qty, ask_qty, ltp) = (q.bid_qty.to_string(), q.ask_qty.to_string(), q.ltp.to_string());
        self.writer.write_record([
            q.ticker.as_str(),
            time.as_str(),
            bid.as_str(),
            ask.as_str(),
            bid_qty.as_str(),
            ask_qty.as_str(),
            ltp.as_str(),
        ])?;
        self.rows += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}
