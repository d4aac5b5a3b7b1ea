// crates/harness-cli/src/log_sink.rs
// ============================================================================
// Module: Run Log Sink Setup
// Description: Builds the run log sink from logging configuration.
// Purpose: Route leveled JSON-line events to stderr or a file.
// Dependencies: harness-config, harness-core
// ============================================================================

//! ## Overview
//! Events below the configured level are dropped before they reach the
//! underlying stderr or file sink.

use std::sync::Arc;

use harness_config::LoggingConfig;
use harness_core::RunLogSink;
use harness_core::logging::FileLogSink;
use harness_core::logging::LevelFilterSink;
use harness_core::logging::StderrLogSink;

/// Opens the configured log sink.
///
/// # Errors
///
/// Returns [`std::io::Error`] when the log file cannot be opened.
pub fn open_log_sink(config: &LoggingConfig) -> std::io::Result<Arc<dyn RunLogSink>> {
    let inner: Arc<dyn RunLogSink> = match &config.file {
        Some(path) => Arc::new(FileLogSink::new(path)?),
        None => Arc::new(StderrLogSink),
    };
    Ok(Arc::new(LevelFilterSink::new(config.level, inner)))
}
