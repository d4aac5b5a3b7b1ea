// crates/harness-core/src/report.rs
// ============================================================================
// Module: Flat Report and Run Summary
// Description: Row-oriented report and run-level pass/fail counters.
// Purpose: Produce the CSV report and JSON summary artifacts in memory.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`FlatReport`] is an append-only list of rows, one per graded asset, with
//! one verdict column per agent in a fixed order. [`RunSummary`] holds the
//! whole-run counters written as `{"PASSED": n, "FAILED": n, "SKIPPED": n}`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::identifiers::AgentId;
use crate::identifiers::TestAssetId;
use crate::identifiers::TestCaseId;
use crate::verdict::Verdict;
use crate::verdict::VerdictKind;


// ============================================================================
// SECTION: Flat Report
// ============================================================================

/// Leading CSV columns preceding the agent columns.
const FIXED_COLUMNS: [&str; 3] = ["name", "TestCase", "TestAsset"];

/// One report row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    /// Asset display name.
    pub name: String,
    /// Owning test case.
    pub test_case_id: TestCaseId,
    /// Asset identifier.
    pub asset_id: TestAssetId,
    /// Verdict tags for agents that reported, in column order.
    pub verdicts: Vec<String>,
}

/// Append-only report rows with fixed agent columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatReport {
    /// Agent columns in output order.
    agents: Vec<AgentId>,
    /// Rows in recording order.
    rows: Vec<ReportRow>,
}

impl FlatReport {
    /// Creates an empty report for the given agent columns.
    #[must_use]
    pub fn new(agents: Vec<AgentId>) -> Self {
        Self {
            agents,
            rows: Vec::new(),
        }
    }

    /// Appends a row.
    pub fn push(&mut self, row: ReportRow) {
        self.rows.push(row);
    }

    /// Returns the rows in recording order.
    #[must_use]
    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    /// Returns the agent columns.
    #[must_use]
    pub fn agents(&self) -> &[AgentId] {
        &self.agents
    }

    /// Returns the CSV header line without a trailing newline.
    #[must_use]
    pub fn header(&self) -> String {
        FIXED_COLUMNS
            .iter()
            .copied()
            .chain(self.agents.iter().map(AgentId::as_str))
            .map(csv_field)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Renders the report as CSV with a header line.
    #[must_use]
    pub fn to_csv(&self) -> String {
        let mut out = self.header();
        out.push('\n');
        for row in &self.rows {
            let line = [row.name.as_str(), row.test_case_id.as_str(), row.asset_id.as_str()]
                .into_iter()
                .chain(row.verdicts.iter().map(String::as_str))
                .map(csv_field)
                .collect::<Vec<_>>()
                .join(",");
            out.push_str(&line);
            out.push('\n');
        }
        out
    }
}

/// Quotes a CSV field when it contains separators, quotes, or newlines.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

// ============================================================================
// SECTION: Run Summary
// ============================================================================

/// Whole-run counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Assets whose primary verdict passed.
    #[serde(rename = "PASSED")]
    pub passed: u64,
    /// Assets that failed or errored, plus unsupported test cases.
    #[serde(rename = "FAILED")]
    pub failed: u64,
    /// Assets with no results or no verdict from the primary agent.
    #[serde(rename = "SKIPPED")]
    pub skipped: u64,
}

impl RunSummary {
    /// Counts one graded asset by its primary-agent verdict.
    pub const fn record(&mut self, verdict: Option<&Verdict>) {
        match verdict {
            Some(verdict) => match verdict.kind() {
                VerdictKind::Passed => self.passed += 1,
                VerdictKind::Failed | VerdictKind::Error => self.failed += 1,
                VerdictKind::NoResults => self.skipped += 1,
            },
            None => self.skipped += 1,
        }
    }

    /// Counts a test case that could not be run.
    pub const fn record_failure(&mut self) {
        self.failed += 1;
    }

    /// Returns the sum of all counters.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.passed + self.failed + self.skipped
    }
}
