// crates/harness-core/src/logging.rs
// ============================================================================
// Module: Harness Run Logging
// Description: Structured run log events and sinks.
// Purpose: Emit JSON-line diagnostics without a hard logging dependency.
// Dependencies: rand, serde, serde_json
// ============================================================================

//! ## Overview
//! Every warning and error the engine recovers from is surfaced as a
//! [`RunLogEvent`] recorded through a [`RunLogSink`]. Sinks are cheap trait
//! objects so the CLI can route events to stderr or a file and tests can
//! capture them in memory. [`RunLogger`] stamps each event with the run id and
//! a timestamp.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Deserialize;
use serde::Serialize;

use crate::identifiers::TestAssetId;
use crate::identifiers::TestCaseId;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Log severity, ordered from most to least severe.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Failures that were recovered from but lost information.
    Error,
    /// Skipped or degraded inputs.
    #[default]
    #[serde(alias = "warn")]
    Warning,
    /// Progress messages.
    Info,
    /// Verbose diagnostics.
    Debug,
}

impl LogLevel {
    /// Returns the lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }

    /// Parses a case-insensitive level label.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warning" | "warn" => Some(Self::Warning),
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured run log event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunLogEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Run identifier shared by all events of one invocation.
    pub run_id: String,
    /// Severity.
    pub level: LogLevel,
    /// Human-readable message.
    pub message: String,
    /// Test case the event concerns, when any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_case_id: Option<TestCaseId>,
    /// Test asset the event concerns, when any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<TestAssetId>,
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Destination for run log events.
pub trait RunLogSink: Send + Sync {
    /// Records an event.
    fn record(&self, event: &RunLogEvent);
}

/// Sink that writes JSON lines to stderr.
pub struct StderrLogSink;

impl RunLogSink for StderrLogSink {
    fn record(&self, event: &RunLogEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

/// Sink that appends JSON lines to a file.
pub struct FileLogSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileLogSink {
    /// Opens the log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl RunLogSink for FileLogSink {
    fn record(&self, event: &RunLogEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// Sink that keeps events in memory.
#[derive(Default)]
pub struct MemoryLogSink {
    /// Captured events in arrival order.
    events: Mutex<Vec<RunLogEvent>>,
}

impl MemoryLogSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of captured events.
    #[must_use]
    pub fn events(&self) -> Vec<RunLogEvent> {
        self.events.lock().map_or_else(|_| Vec::new(), |events| events.clone())
    }

    /// Returns captured events at the given level.
    #[must_use]
    pub fn events_at(&self, level: LogLevel) -> Vec<RunLogEvent> {
        self.events().into_iter().filter(|event| event.level == level).collect()
    }
}

impl RunLogSink for MemoryLogSink {
    fn record(&self, event: &RunLogEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Sink that drops events less severe than a threshold.
pub struct LevelFilterSink {
    /// Most verbose level that is forwarded.
    max_level: LogLevel,
    /// Downstream sink.
    inner: Arc<dyn RunLogSink>,
}

impl LevelFilterSink {
    /// Wraps a sink with a level threshold.
    #[must_use]
    pub fn new(max_level: LogLevel, inner: Arc<dyn RunLogSink>) -> Self {
        Self {
            max_level,
            inner,
        }
    }
}

impl RunLogSink for LevelFilterSink {
    fn record(&self, event: &RunLogEvent) {
        if event.level <= self.max_level {
            self.inner.record(event);
        }
    }
}

// ============================================================================
// SECTION: Logger Handle
// ============================================================================

/// Optional test case and asset context attached to an event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogContext<'a> {
    /// Test case identifier.
    pub test_case_id: Option<&'a TestCaseId>,
    /// Test asset identifier.
    pub asset_id: Option<&'a TestAssetId>,
}

impl<'a> LogContext<'a> {
    /// Context for a test case.
    #[must_use]
    pub const fn case(test_case_id: &'a TestCaseId) -> Self {
        Self {
            test_case_id: Some(test_case_id),
            asset_id: None,
        }
    }

    /// Context for an asset within a test case.
    #[must_use]
    pub const fn asset(test_case_id: &'a TestCaseId, asset_id: &'a TestAssetId) -> Self {
        Self {
            test_case_id: Some(test_case_id),
            asset_id: Some(asset_id),
        }
    }
}

/// Cloneable logger bound to one run.
#[derive(Clone)]
pub struct RunLogger {
    /// Run identifier stamped on every event.
    run_id: String,
    /// Destination sink.
    sink: Arc<dyn RunLogSink>,
}

impl RunLogger {
    /// Creates a logger with an explicit run id.
    #[must_use]
    pub fn new(run_id: impl Into<String>, sink: Arc<dyn RunLogSink>) -> Self {
        Self {
            run_id: run_id.into(),
            sink,
        }
    }

    /// Creates a logger with a random eight-character run id.
    #[must_use]
    pub fn with_random_run_id(sink: Arc<dyn RunLogSink>) -> Self {
        Self::new(format!("{:08x}", rand::random::<u32>()), sink)
    }

    /// Returns the run id.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Records an event at the given level.
    pub fn log(&self, level: LogLevel, context: LogContext<'_>, message: impl Into<String>) {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        let event = RunLogEvent {
            event: "harness_log",
            timestamp_ms,
            run_id: self.run_id.clone(),
            level,
            message: message.into(),
            test_case_id: context.test_case_id.cloned(),
            asset_id: context.asset_id.cloned(),
        };
        self.sink.record(&event);
    }

    /// Records an error event.
    pub fn error(&self, context: LogContext<'_>, message: impl Into<String>) {
        self.log(LogLevel::Error, context, message);
    }

    /// Records a warning event.
    pub fn warn(&self, context: LogContext<'_>, message: impl Into<String>) {
        self.log(LogLevel::Warning, context, message);
    }

    /// Records an info event.
    pub fn info(&self, context: LogContext<'_>, message: impl Into<String>) {
        self.log(LogLevel::Info, context, message);
    }

    /// Records a debug event.
    pub fn debug(&self, context: LogContext<'_>, message: impl Into<String>) {
        self.log(LogLevel::Debug, context, message);
    }
}
