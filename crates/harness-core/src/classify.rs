// crates/harness-core/src/classify.rs
// ============================================================================
// Module: Result Classification
// Description: Classifier interface and the rank-based default classifier.
// Purpose: Grade a TRAPI result list against an expectation category.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! A [`ResultClassifier`] receives the results of one dispatch, the
//! normalized output CURIE, and the expectation category, and returns a
//! [`Verdict`]. The engine never calls it for failed dispatches.
//!
//! [`RankClassifier`] orders results by their first analysis score
//! (descending, stable for ties and missing scores) and locates the first
//! result that binds the expected output:
//! - `TopAnswer` passes within the top cutoff (30 by default).
//! - `Acceptable` passes within the upper half.
//! - `BadButForgivable` passes in the lower half or when absent.
//! - `NeverShow` passes only when absent.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

use crate::identifiers::AgentId;
use crate::model::ExpectedOutput;
use crate::verdict::Verdict;


// ============================================================================
// SECTION: Interface
// ============================================================================

/// Grades query results for one asset and agent.
pub trait ResultClassifier: Send + Sync {
    /// Classifies `results` for the expected output.
    fn classify(
        &self,
        agent: &AgentId,
        results: &[Value],
        output_id: &str,
        expected: ExpectedOutput,
    ) -> Verdict;
}

// ============================================================================
// SECTION: Rank Classifier
// ============================================================================

/// Default number of leading results that count as top answers.
pub const DEFAULT_TOP_ANSWER_CUTOFF: usize = 30;

/// Rank-based classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankClassifier {
    /// Leading results that count as top answers.
    top_answer_cutoff: usize,
}

impl RankClassifier {
    /// Creates a classifier with a custom top-answer cutoff.
    #[must_use]
    pub const fn new(top_answer_cutoff: usize) -> Self {
        Self {
            top_answer_cutoff,
        }
    }
}

impl Default for RankClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_ANSWER_CUTOFF)
    }
}

impl ResultClassifier for RankClassifier {
    fn classify(
        &self,
        _agent: &AgentId,
        results: &[Value],
        output_id: &str,
        expected: ExpectedOutput,
    ) -> Verdict {
        if results.is_empty() {
            return Verdict::NoResults;
        }
        let total = results.len();
        let upper_half = total.div_ceil(2);
        let rank = output_rank(results, output_id);
        let passed = match (expected, rank) {
            (ExpectedOutput::TopAnswer, Some(rank)) => rank < self.top_answer_cutoff,
            (ExpectedOutput::Acceptable, Some(rank)) => rank < upper_half,
            (ExpectedOutput::BadButForgivable, Some(rank)) => rank >= upper_half,
            (ExpectedOutput::BadButForgivable | ExpectedOutput::NeverShow, None) => true,
            (ExpectedOutput::TopAnswer | ExpectedOutput::Acceptable, None)
            | (ExpectedOutput::NeverShow, Some(_)) => false,
            (ExpectedOutput::OverlyGeneric, _) => {
                return Verdict::Error {
                    message: format!("unsupported expected output: {expected}"),
                };
            }
        };
        if passed {
            return Verdict::Passed;
        }
        let message = rank.map_or_else(
            || format!("{output_id} not found in {total} results"),
            |rank| format!("{output_id} ranked {} of {total}", rank + 1),
        );
        Verdict::Failed {
            message: Some(message),
        }
    }
}

/// Returns the zero-based score rank of the first result binding `output_id`.
fn output_rank(results: &[Value], output_id: &str) -> Option<usize> {
    let mut order: Vec<(usize, f64)> =
        results.iter().enumerate().map(|(index, result)| (index, result_score(result))).collect();
    order.sort_by(|left, right| right.1.total_cmp(&left.1));
    order.iter().position(|(index, _)| binds_output(&results[*index], output_id))
}

/// Reads the first analysis score, treating missing scores as lowest.
fn result_score(result: &Value) -> f64 {
    result
        .pointer("/analyses/0/score")
        .or_else(|| result.get("score"))
        .and_then(Value::as_f64)
        .unwrap_or(f64::NEG_INFINITY)
}

/// Returns true when any node binding of the result has the given id.
fn binds_output(result: &Value, output_id: &str) -> bool {
    let Some(Value::Object(bindings)) = result.get("node_bindings") else {
        return false;
    };
    bindings.values().filter_map(Value::as_array).flatten().any(|binding| {
        binding.get("id").and_then(Value::as_str).is_some_and(|id| id == output_id)
    })
}
