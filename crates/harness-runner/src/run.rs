// crates/harness-runner/src/run.rs
// ============================================================================
// Module: Test Runner
// Description: Drives a suite through normalization, dispatch, and grading.
// Purpose: Own the per-test-case pipeline and the run-wide aggregates.
// Dependencies: harness-core, tokio
// ============================================================================

//! ## Overview
//! Test cases run one after another. For each acceptance test the runner
//! normalizes the case's identifiers, plans one canonical query per distinct
//! key, dispatches the plan, grades every asset from its query's response,
//! and checkpoints the aggregates. Problems with a single asset or query are
//! logged and contained; nothing short of a programming error stops a run.
//!
//! The collector sits behind an async mutex so every aggregate write goes
//! through one lock, independent of how many cases are in flight.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;

use harness_core::AgentId;
use harness_core::ExpectedOutput;
use harness_core::FlatReport;
use harness_core::LogContext;
use harness_core::NormalizationCache;
use harness_core::Normalizer;
use harness_core::QueryHash;
use harness_core::QueryPlan;
use harness_core::ReportSink;
use harness_core::ResultClassifier;
use harness_core::ResultCollector;
use harness_core::RunLogger;
use harness_core::RunSummary;
use harness_core::StatisticsTable;
use harness_core::TestAsset;
use harness_core::TestCase;
use harness_core::TestObjective;
use harness_core::TestSuite;
use harness_core::Verdict;
use harness_core::build_query;
use harness_core::normalize::Resolved;
use tokio::sync::Mutex;

use crate::dispatch::QueryDispatcher;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Aggregates produced by a completed run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Whole-run counters.
    pub summary: RunSummary,
    /// Final statistics table.
    pub stats: StatisticsTable,
    /// Final flat report.
    pub report: FlatReport,
}

/// Asset accepted into a query plan.
struct PlannedAsset {
    /// Asset with its normalized input.
    asset: TestAsset,
    /// Parsed expectation category.
    expected: ExpectedOutput,
    /// Normalized expected output CURIE.
    output_id: String,
    /// Hash of the query answering this asset.
    hash: QueryHash,
}

// ============================================================================
// SECTION: Runner
// ============================================================================

/// Suite runner for one agent.
pub struct TestRunner {
    /// Agent whose verdict drives the run summary.
    agent: AgentId,
    /// Query dispatcher.
    dispatcher: QueryDispatcher,
    /// Identifier normalizer.
    normalizer: Arc<dyn Normalizer>,
    /// Result classifier.
    classifier: Arc<dyn ResultClassifier>,
    /// Checkpoint destination.
    report_sink: Arc<dyn ReportSink>,
    /// Run-scoped identifier cache.
    cache: Mutex<NormalizationCache>,
    /// Single writer of statistics and report rows.
    collector: Mutex<ResultCollector>,
    /// Run log handle.
    logger: RunLogger,
}

impl TestRunner {
    /// Builds a runner around a dispatcher and its collaborators.
    #[must_use]
    pub fn new(
        dispatcher: QueryDispatcher,
        normalizer: Arc<dyn Normalizer>,
        classifier: Arc<dyn ResultClassifier>,
        report_sink: Arc<dyn ReportSink>,
        logger: RunLogger,
    ) -> Self {
        let agent = dispatcher.target().agent.clone();
        let collector = ResultCollector::new(vec![agent.clone()], logger.clone());
        Self {
            agent,
            dispatcher,
            normalizer,
            classifier,
            report_sink,
            cache: Mutex::new(NormalizationCache::new()),
            collector: Mutex::new(collector),
            logger,
        }
    }

    /// Runs every test case of the suite in identifier order.
    pub async fn run(&self, suite: &TestSuite) -> RunOutcome {
        self.logger
            .info(LogContext::default(), format!("running {} test cases", suite.test_cases.len()));
        let mut summary = RunSummary::default();
        // Identifier order, independent of document order.
        for test_case in suite.test_cases.values() {
            self.run_case(test_case, &mut summary).await;
        }
        let collector = self.collector.lock().await;
        RunOutcome {
            summary,
            stats: collector.stats().clone(),
            report: collector.report().clone(),
        }
    }

    /// Processes one test case.
    async fn run_case(&self, test_case: &TestCase, summary: &mut RunSummary) {
        let context = LogContext::case(&test_case.id);
        let Some(objective) = test_case.objective.as_ref().filter(|_| !test_case.test_assets.is_empty())
        else {
            self.logger.warn(context, "test case is missing assets or an objective");
            return;
        };
        match objective {
            TestObjective::AcceptanceTest => {
                self.run_acceptance_case(test_case, summary).await;
            }
            TestObjective::QuantitativeTest => {
                self.logger.info(context, "quantitative tests are not graded");
                return;
            }
            TestObjective::Other(label) => {
                self.logger.error(context, format!("unsupported test case objective {label}"));
                summary.record_failure();
            }
        }
        self.checkpoint(test_case).await;
    }

    /// Normalizes, dispatches, and grades an acceptance test case.
    async fn run_acceptance_case(&self, test_case: &TestCase, summary: &mut RunSummary) {
        self.refresh_cache(test_case).await;
        let (plan, planned) = self.plan_case(test_case).await;
        if plan.is_empty() {
            self.logger.warn(LogContext::case(&test_case.id), "no gradable assets");
            return;
        }
        self.logger.debug(
            LogContext::case(&test_case.id),
            format!("dispatching {} unique queries for {} assets", plan.len(), planned.len()),
        );
        let responses = self.dispatcher.run(&test_case.id, &plan).await;

        for planned_asset in planned {
            let context = LogContext::asset(&test_case.id, &planned_asset.asset.id);
            let Some(result) = responses.get(&planned_asset.hash) else {
                self.logger.warn(context, "no response recorded for test asset");
                summary.record(None);
                continue;
            };
            let verdicts: BTreeMap<AgentId, Verdict> = result
                .iter()
                .map(|(agent, response)| {
                    let verdict = response.failure_verdict().unwrap_or_else(|| {
                        self.classifier.classify(
                            agent,
                            response.results(),
                            &planned_asset.output_id,
                            planned_asset.expected,
                        )
                    });
                    (agent.clone(), verdict)
                })
                .collect();
            let primary = verdicts.get(&self.agent);
            if let Some(verdict) = primary {
                self.logger.debug(context, format!("{} verdict {}", self.agent, verdict.kind()));
            }
            summary.record(primary);
            self.collector.lock().await.record(test_case, &planned_asset.asset, &verdicts);
        }
    }

    /// Normalizes identifiers not yet in the cache.
    async fn refresh_cache(&self, test_case: &TestCase) {
        let context = LogContext::case(&test_case.id);
        let mut cache = self.cache.lock().await;
        let missing: Vec<String> = test_case
            .test_assets
            .iter()
            .flat_map(|asset| [asset.input_id.as_deref(), asset.output_id.as_deref()])
            .flatten()
            .filter(|curie| !curie.is_empty() && !cache.contains(curie))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();
        if missing.is_empty() {
            return;
        }
        match self.normalizer.normalize(&missing).await {
            Ok(mappings) => cache.merge(mappings),
            Err(err) => {
                self.logger.warn(context, format!("normalization failed, using raw identifiers: {err}"));
            }
        }
    }

    /// Validates assets and builds the deduplicated query plan.
    async fn plan_case(&self, test_case: &TestCase) -> (QueryPlan, Vec<PlannedAsset>) {
        let cache = self.cache.lock().await;
        let mut plan = QueryPlan::new();
        let mut planned = Vec::with_capacity(test_case.test_assets.len());
        for asset in &test_case.test_assets {
            let context = LogContext::asset(&test_case.id, &asset.id);
            let expected = match asset.check() {
                Ok(expected) => expected,
                Err(rejection) => {
                    self.logger.warn(context, format!("asset skipped: {rejection}"));
                    continue;
                }
            };
            let mut asset = asset.clone();
            let raw_input = asset.input_id.clone().unwrap_or_default();
            let input_id = self.resolve(&cache, &raw_input, context);
            asset.set_normalized_input(input_id);
            let raw_output = asset.output_id.clone().unwrap_or_default();
            let output_id = self.resolve(&cache, &raw_output, context);
            let query = match build_query(&asset) {
                Ok(query) => query,
                Err(err) => {
                    self.logger.warn(context, format!("asset skipped: {err}"));
                    continue;
                }
            };
            let hash = query.hash.clone();
            if let Err(err) = plan.insert(query) {
                self.logger.error(context, format!("asset skipped: {err}"));
                continue;
            }
            planned.push(PlannedAsset {
                asset,
                expected,
                output_id,
                hash,
            });
        }
        (plan, planned)
    }

    /// Resolves an identifier through the cache, warning on fallback.
    fn resolve(&self, cache: &NormalizationCache, raw: &str, context: LogContext<'_>) -> String {
        match cache.resolve(raw) {
            Resolved::Canonical(id) => id,
            Resolved::Fallback(id) => {
                self.logger.warn(context, format!("no normalized identifier for {raw}, using it as is"));
                id
            }
        }
    }

    /// Persists the current aggregates.
    async fn checkpoint(&self, test_case: &TestCase) {
        let collector = self.collector.lock().await;
        if let Err(err) = self.report_sink.checkpoint(collector.stats(), collector.report()) {
            self.logger.error(LogContext::case(&test_case.id), format!("checkpoint failed: {err}"));
        }
    }
}
