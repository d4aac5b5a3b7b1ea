// crates/harness-core/src/collector.rs
// ============================================================================
// Module: Result Collector
// Description: Aggregates per-asset verdicts into statistics and a report.
// Purpose: Keep count and row invariants intact across a whole run.
// Dependencies: crate::{stats, report, logging}
// ============================================================================

//! ## Overview
//! [`ResultCollector::record`] is the only writer of the run's
//! [`StatisticsTable`] and [`FlatReport`]. It takes `&mut self`, so callers
//! that share a collector across tasks must serialize access (the runner holds
//! it behind a mutex). Keys outside the seeded table are logged once per agent
//! and never counted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use crate::identifiers::AgentId;
use crate::logging::LogContext;
use crate::logging::RunLogger;
use crate::model::TestAsset;
use crate::model::TestCase;
use crate::report::FlatReport;
use crate::report::ReportRow;
use crate::stats::StatisticsTable;
use crate::verdict::Verdict;

// ============================================================================
// SECTION: Collector
// ============================================================================

/// Run-wide verdict aggregator.
pub struct ResultCollector {
    /// Known agents in column order.
    agents: Vec<AgentId>,
    /// Seeded verdict counters.
    stats: StatisticsTable,
    /// Append-only report rows.
    report: FlatReport,
    /// Destination for key mismatch errors.
    logger: RunLogger,
}

impl ResultCollector {
    /// Creates a collector seeded for the given agents.
    #[must_use]
    pub fn new(agents: Vec<AgentId>, logger: RunLogger) -> Self {
        let stats = StatisticsTable::for_agents(&agents);
        let report = FlatReport::new(agents.clone());
        Self {
            agents,
            stats,
            report,
            logger,
        }
    }

    /// Records one asset's verdicts.
    ///
    /// Counts are incremented for every known agent that has a verdict; the
    /// report gains exactly one row.
    pub fn record(
        &mut self,
        test_case: &TestCase,
        asset: &TestAsset,
        verdicts: &BTreeMap<AgentId, Verdict>,
    ) {
        let context = LogContext::asset(&test_case.id, &asset.id);
        let category = asset.expected_category();
        let label = asset.expected_output.as_deref().unwrap_or("<none>");
        for agent in &self.agents {
            let Some(verdict) = verdicts.get(agent) else {
                continue;
            };
            let Some(category) = category else {
                self.logger.error(
                    context,
                    format!("cannot count {} for unknown category {label}", verdict.kind()),
                );
                continue;
            };
            if let Err(err) = self.stats.increment(agent, category, verdict.kind()) {
                self.logger.error(context, format!("statistics not updated: {err}"));
            }
        }
        let row_verdicts = self
            .agents
            .iter()
            .filter_map(|agent| verdicts.get(agent))
            .map(|verdict| verdict.kind().tag().to_string())
            .collect();
        self.report.push(ReportRow {
            name: asset.display_name().to_string(),
            test_case_id: test_case.id.clone(),
            asset_id: asset.id.clone(),
            verdicts: row_verdicts,
        });
    }

    /// Returns the known agents in column order.
    #[must_use]
    pub fn agents(&self) -> &[AgentId] {
        &self.agents
    }

    /// Returns the statistics table.
    #[must_use]
    pub const fn stats(&self) -> &StatisticsTable {
        &self.stats
    }

    /// Returns the flat report.
    #[must_use]
    pub const fn report(&self) -> &FlatReport {
        &self.report
    }
}
