// crates/harness-core/src/stats.rs
// ============================================================================
// Module: Statistics Table
// Description: Pre-seeded agent x category x verdict counters.
// Purpose: Count verdicts without ever inserting unexpected keys.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! The table is fully enumerated at construction: every agent, category, and
//! verdict kind triple exists with a zero count before anything is recorded.
//! [`StatisticsTable::increment`] only touches existing cells and reports
//! anything else as [`StatsError::UnknownKey`]. The serialized form is the
//! nested JSON object `{agent: {category: {verdict: count}}}`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::identifiers::AgentId;
use crate::model::ExpectedOutput;
use crate::verdict::VerdictKind;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Statistics update failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatsError {
    /// The addressed cell was not seeded.
    #[error("no statistics cell for agent {agent}, category {category}, verdict {verdict}")]
    UnknownKey {
        /// Agent label.
        agent: String,
        /// Category label.
        category: String,
        /// Verdict tag.
        verdict: String,
    },
}

// ============================================================================
// SECTION: Table
// ============================================================================

/// Verdict counts per category.
type CategoryCounts = BTreeMap<String, BTreeMap<String, u64>>;

/// Nested verdict counters.
///
/// # Invariants
/// - The key set is fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StatisticsTable {
    /// Counts keyed by agent, category label, then verdict tag.
    counts: BTreeMap<String, CategoryCounts>,
}

impl StatisticsTable {
    /// Seeds a table for the given key space.
    #[must_use]
    pub fn new(agents: &[AgentId], categories: &[ExpectedOutput], verdicts: &[VerdictKind]) -> Self {
        let counts = agents
            .iter()
            .map(|agent| {
                let per_category = categories
                    .iter()
                    .map(|category| {
                        let per_verdict =
                            verdicts.iter().map(|verdict| (verdict.tag().to_string(), 0)).collect();
                        (category.as_str().to_string(), per_verdict)
                    })
                    .collect();
                (agent.as_str().to_string(), per_category)
            })
            .collect();
        Self {
            counts,
        }
    }

    /// Seeds a table with every supported category and verdict kind.
    #[must_use]
    pub fn for_agents(agents: &[AgentId]) -> Self {
        Self::new(agents, &ExpectedOutput::SUPPORTED, &VerdictKind::ALL)
    }

    /// Increments a seeded cell and returns the new count.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::UnknownKey`] when the cell does not exist; no
    /// count changes in that case.
    pub fn increment(
        &mut self,
        agent: &AgentId,
        category: ExpectedOutput,
        verdict: VerdictKind,
    ) -> Result<u64, StatsError> {
        let cell = self
            .counts
            .get_mut(agent.as_str())
            .and_then(|per_category| per_category.get_mut(category.as_str()))
            .and_then(|per_verdict| per_verdict.get_mut(verdict.tag()))
            .ok_or_else(|| StatsError::UnknownKey {
                agent: agent.to_string(),
                category: category.to_string(),
                verdict: verdict.to_string(),
            })?;
        *cell += 1;
        Ok(*cell)
    }

    /// Returns a cell count when the cell exists.
    #[must_use]
    pub fn get(
        &self,
        agent: &AgentId,
        category: ExpectedOutput,
        verdict: VerdictKind,
    ) -> Option<u64> {
        self.counts
            .get(agent.as_str())
            .and_then(|per_category| per_category.get(category.as_str()))
            .and_then(|per_verdict| per_verdict.get(verdict.tag()))
            .copied()
    }

    /// Sums all verdict counts for an agent and category.
    #[must_use]
    pub fn category_total(&self, agent: &AgentId, category: ExpectedOutput) -> Option<u64> {
        self.counts
            .get(agent.as_str())
            .and_then(|per_category| per_category.get(category.as_str()))
            .map(|per_verdict| per_verdict.values().sum())
    }

    /// Iterates every cell as `(agent, category, verdict, count)`.
    pub fn cells(&self) -> impl Iterator<Item = (&str, &str, &str, u64)> {
        self.counts.iter().flat_map(|(agent, per_category)| {
            per_category.iter().flat_map(move |(category, per_verdict)| {
                per_verdict.iter().map(move |(verdict, count)| {
                    (agent.as_str(), category.as_str(), verdict.as_str(), *count)
                })
            })
        })
    }
}
