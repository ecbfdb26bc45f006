//! Asynchronous append-only log sink.
//!
//! [`LogSink`] owns a background writer thread and the log file. Components
//! receive a cloneable [`LogHandle`]; `log` only enqueues onto an mpsc
//! channel and never waits on disk I/O. The worker drains the channel,
//! flushing whenever it runs dry, and performs a final drain when the sink is
//! shut down (explicitly or on drop), so nothing enqueued before shutdown is
//! lost.
//!
//! Line format: `YYYY-MM-DD HH:MM:SS [LOG]: <message>` in local time.

use chrono::{DateTime, Local};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

enum LogCommand {
    Entry(LogEntry),
    Shutdown,
}

/// One enqueued log message with the time it was logged.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub at: DateTime<Local>,
    pub message: String,
}

impl LogEntry {
    /// Render as a log file line (without the trailing newline).
    pub fn format_line(&self) -> String {
        format!("{} [LOG]: {}", self.at.format(TIMESTAMP_FORMAT), self.message)
    }
}

/// Cheap, cloneable front end to a [`LogSink`].
#[derive(Clone, Default)]
pub struct LogHandle {
    tx: Option<Sender<LogCommand>>,
}

impl LogHandle {
    /// A handle that drops every message.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// A handle whose messages can be read back from the returned capture.
    pub fn capturing() -> (Self, LogCapture) {
        let (tx, rx) = mpsc::channel();
        (Self { tx: Some(tx) }, LogCapture { rx })
    }

    /// Enqueue a message. Never blocks; silently dropped after shutdown.
    pub fn log(&self, message: impl Into<String>) {
        if let Some(tx) = &self.tx {
            let entry = LogEntry {
                at: Local::now(),
                message: message.into(),
            };
            let _ = tx.send(LogCommand::Entry(entry));
        }
    }
}

impl std::fmt::Debug for LogHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogHandle")
            .field("enabled", &self.tx.is_some())
            .finish()
    }
}

/// In-memory receiver for [`LogHandle::capturing`].
pub struct LogCapture {
    rx: Receiver<LogCommand>,
}

impl LogCapture {
    /// Messages enqueued so far, in order.
    pub fn messages(&self) -> Vec<String> {
        self.rx
            .try_iter()
            .filter_map(|cmd| match cmd {
                LogCommand::Entry(e) => Some(e.message),
                LogCommand::Shutdown => None,
            })
            .collect()
    }
}

/// Owner of the log file and its writer thread.
pub struct LogSink {
    handle: LogHandle,
    worker: Option<JoinHandle<io::Result<()>>>,
}

impl LogSink {
    /// Open (append/create) `path` and start the writer thread.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Self::spawn(file)
    }

    fn spawn(file: File) -> io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let worker = thread::Builder::new()
            .name("tickmerge-log".into())
            .spawn(move || drain(rx, BufWriter::new(file)))?;
        Ok(Self {
            handle: LogHandle { tx: Some(tx) },
            worker: Some(worker),
        })
    }

    pub fn handle(&self) -> LogHandle {
        self.handle.clone()
    }

    pub fn log(&self, message: impl Into<String>) {
        self.handle.log(message);
    }

    /// Drain everything queued so far, flush, and stop the writer thread.
    pub fn shutdown(mut self) -> io::Result<()> {
        self.stop()
    }

    fn stop(&mut self) -> io::Result<()> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        if let Some(tx) = &self.handle.tx {
            let _ = tx.send(LogCommand::Shutdown);
        }
        worker
            .join()
            .map_err(|_| io::Error::other("log writer thread panicked"))?
    }
}

impl Drop for LogSink {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

fn drain<W: Write>(rx: Receiver<LogCommand>, mut out: W) -> io::Result<()> {
    'outer: while let Ok(cmd) = rx.recv() {
        let mut next = Some(cmd);
        while let Some(cmd) = next.take() {
            match cmd {
                LogCommand::Entry(entry) => writeln!(out, "{}", entry.format_line())?,
                LogCommand::Shutdown => break 'outer,
            }
            next = rx.try_recv().ok();
        }
        out.flush()?;
    }

    // Final pass: anything other handles managed to enqueue before we stop.
    for cmd in rx.try_iter() {
        if let LogCommand::Entry(entry) = cmd {
            writeln!(out, "{}", entry.format_line())?;
        }
    }
    out.flush()
}
