//! Per-call log sink.
//!
//! A [`CallLogger`] is handed to the called function inside its
//! [`CallRequest`](crate::call::CallRequest). Every line is mirrored to
//! `tracing`; when the client asked for `log_level`, lines at or above that
//! level are also written to the open response stream as
//! `[<level>][<timestamp>] <message>`.
//!
//! The stream channel is bounded. A line that finds it full is counted, not
//! queued; the count is reported as one `warn` line at the next chance.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Local};
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::Sender;

/// Marker prefixed to streamed log lines when `mark_log` is set.
pub const LOG_MARKER: u8 = b'L';

/// Marker prefixed to the streamed result when `mark_log` is set.
pub const RESULT_MARKER: u8 = b'R';

/// Capacity of the channel between a call and its streamed response body.
pub const STREAM_CAPACITY: usize = 256;

/// Log levels, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Fatal,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown log level '{0}'")]
pub struct ParseLogLevelError(pub String);

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Fatal => "fatal",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// True if a message at `self` passes a `threshold` verbosity.
    pub fn passes(self, threshold: LogLevel) -> bool {
        self <= threshold
    }
}

impl FromStr for LogLevel {
    type Err = ParseLogLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fatal" => Ok(LogLevel::Fatal),
            "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(ParseLogLevelError(s.to_string())),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render one streamed log line.
pub fn format_line(level: LogLevel, time: DateTime<Local>, message: &str, mark: bool) -> Vec<u8> {
    let mut line = Vec::with_capacity(message.len() + 40);
    if mark {
        line.push(LOG_MARKER);
    }
    line.extend_from_slice(
        format!("[{level}][{}] {message}\n", time.format("%a %b %e %H:%M:%S %Y")).as_bytes(),
    );
    line
}

/// Notice written in place of lines that did not fit the stream.
pub fn dropped_notice(count: usize, mark: bool) -> Vec<u8> {
    format_line(
        LogLevel::Warn,
        Local::now(),
        &format!("{count} log line(s) dropped"),
        mark,
    )
}

#[derive(Default)]
struct SinkState {
    tx: Option<Sender<Vec<u8>>>,
    dropped: usize,
}

impl SinkState {
    /// Queue `line` without waiting. Returns false if it was counted as
    /// dropped instead.
    fn offer(&mut self, line: Vec<u8>) -> bool {
        let Some(tx) = &self.tx else { return false };
        match tx.try_send(line) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                false
            }
            Err(TrySendError::Closed(_)) => {
                self.tx = None;
                false
            }
        }
    }
}

type Slot = Arc<Mutex<SinkState>>;

#[derive(Clone)]
struct StreamSink {
    threshold: LogLevel,
    mark: bool,
    slot: Slot,
}

/// Logger scoped to a single call.
#[derive(Clone, Default)]
pub struct CallLogger {
    sink: Option<StreamSink>,
}

/// Detaches the stream sink of a [`CallLogger`] when closed or dropped.
pub struct SinkGuard {
    slot: Slot,
}

impl SinkGuard {
    /// Detach the sink and return how many lines were dropped and not yet
    /// reported.
    pub fn close(self) -> usize {
        let mut state = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        state.tx = None;
        std::mem::take(&mut state.dropped)
    }
}

impl Drop for SinkGuard {
    fn drop(&mut self) {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).tx = None;
    }
}

impl CallLogger {
    /// Logger that only reports to `tracing`.
    pub fn detached() -> Self {
        Self::default()
    }

    /// Logger that also writes to a response stream until the guard is
    /// closed.
    pub fn streaming(threshold: LogLevel, mark: bool, tx: Sender<Vec<u8>>) -> (Self, SinkGuard) {
        let slot = Arc::new(Mutex::new(SinkState {
            tx: Some(tx),
            dropped: 0,
        }));
        let logger = Self {
            sink: Some(StreamSink {
                threshold,
                mark,
                slot: Arc::clone(&slot),
            }),
        };
        (logger, SinkGuard { slot })
    }

    pub fn is_streaming(&self) -> bool {
        self.sink.is_some()
    }

    pub fn log(&self, level: LogLevel, message: impl fmt::Display) {
        let message = message.to_string();
        match level {
            LogLevel::Fatal | LogLevel::Error => tracing::error!(target: "riap_http::call", "{message}"),
            LogLevel::Warn => tracing::warn!(target: "riap_http::call", "{message}"),
            LogLevel::Info => tracing::info!(target: "riap_http::call", "{message}"),
            LogLevel::Debug => tracing::debug!(target: "riap_http::call", "{message}"),
            LogLevel::Trace => tracing::trace!(target: "riap_http::call", "{message}"),
        }

        let Some(sink) = &self.sink else { return };
        if !level.passes(sink.threshold) {
            return;
        }
        let line = format_line(level, Local::now(), &message, sink.mark);
        let mut state = sink.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if state.dropped > 0 {
            let notice = dropped_notice(state.dropped, sink.mark);
            let pending = state.dropped;
            if !state.offer(notice) {
                state.dropped = pending + 1;
                return;
            }
            state.dropped = 0;
        }
        state.offer(line);
    }

    pub fn fatal(&self, message: impl fmt::Display) {
        self.log(LogLevel::Fatal, message)
    }

    pub fn error(&self, message: impl fmt::Display) {
        self.log(LogLevel::Error, message)
    }

    pub fn warn(&self, message: impl fmt::Display) {
        self.log(LogLevel::Warn, message)
    }

    pub fn info(&self, message: impl fmt::Display) {
        self.log(LogLevel::Info, message)
    }

    pub fn debug(&self, message: impl fmt::Display) {
        self.log(LogLevel::Debug, message)
    }

    pub fn trace(&self, message: impl fmt::Display) {
        self.log(LogLevel::Trace, message)
    }
}

impl fmt::Debug for CallLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallLogger")
            .field("threshold", &self.sink.as_ref().map(|s| s.threshold))
            .field("mark", &self.sink.as_ref().map(|s| s.mark))
            .finish()
    }
}
