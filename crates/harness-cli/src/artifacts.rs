// crates/harness-cli/src/artifacts.rs
// ============================================================================
// Module: Run Artifacts
// Description: File-backed report sink and summary writer.
// Purpose: Persist statistics, the CSV report, and the run summary.
// Dependencies: harness-core, serde_json
// ============================================================================

//! ## Overview
//! Artifacts are rewritten in full on every checkpoint so a run interrupted
//! between test cases still leaves consistent files behind. Each write goes
//! to a sibling temporary file first and is renamed into place.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use harness_core::ArtifactError;
use harness_core::FlatReport;
use harness_core::ReportSink;
use harness_core::RunSummary;
use harness_core::StatisticsTable;

// ============================================================================
// SECTION: Report Sink
// ============================================================================

/// Report sink writing statistics JSON and CSV to optional paths.
#[derive(Debug, Clone, Default)]
pub struct FileReportSink {
    /// Statistics table destination.
    stats_path: Option<PathBuf>,
    /// CSV report destination.
    csv_path: Option<PathBuf>,
}

impl FileReportSink {
    /// Creates a sink; unset paths are skipped.
    #[must_use]
    pub const fn new(stats_path: Option<PathBuf>, csv_path: Option<PathBuf>) -> Self {
        Self {
            stats_path,
            csv_path,
        }
    }
}

impl ReportSink for FileReportSink {
    fn checkpoint(&self, stats: &StatisticsTable, report: &FlatReport) -> Result<(), ArtifactError> {
        if let Some(path) = &self.stats_path {
            let bytes =
                serde_json::to_vec(stats).map_err(|err| ArtifactError::Serialize(err.to_string()))?;
            write_atomic(path, &bytes)?;
        }
        if let Some(path) = &self.csv_path {
            write_atomic(path, report.to_csv().as_bytes())?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Summary
// ============================================================================

/// Writes the run summary as JSON.
///
/// # Errors
///
/// Returns [`ArtifactError`] when serialization or the write fails.
pub fn write_summary(path: &Path, summary: &RunSummary) -> Result<(), ArtifactError> {
    let bytes =
        serde_json::to_vec(summary).map_err(|err| ArtifactError::Serialize(err.to_string()))?;
    write_atomic(path, &bytes)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Writes bytes via a temporary sibling and rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ArtifactError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| io_error(parent, &err))?;
    }
    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);
    fs::write(&temp, bytes).map_err(|err| io_error(&temp, &err))?;
    fs::rename(&temp, path).map_err(|err| io_error(path, &err))
}

/// Formats an I/O failure with its path.
fn io_error(path: &Path, err: &std::io::Error) -> ArtifactError {
    ArtifactError::Io(format!("{}: {err}", path.display()))
}
