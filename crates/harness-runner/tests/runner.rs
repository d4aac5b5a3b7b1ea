// crates/harness-runner/tests/runner.rs
// ============================================================================
// Module: Test Runner Tests
// Description: End-to-end runner and dispatcher tests against a stub agent.
// ============================================================================
//! ## Overview
//! Spins up an in-process agent that answers TRAPI queries based on the input
//! CURIE, then checks deduplication, failure capture, concurrency bounds,
//! normalization fallback, asset filtering, and checkpointing.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::post;
use harness_core::AgentId;
use harness_core::ArtifactError;
use harness_core::ExpectedOutput;
use harness_core::FlatReport;
use harness_core::IdentityNormalizer;
use harness_core::LogLevel;
use harness_core::NormalizeError;
use harness_core::Normalizer;
use harness_core::QueryPlan;
use harness_core::RankClassifier;
use harness_core::ReportSink;
use harness_core::RunLogger;
use harness_core::StatisticsTable;
use harness_core::TestAsset;
use harness_core::TestAssetId;
use harness_core::TestCase;
use harness_core::TestCaseId;
use harness_core::TestObjective;
use harness_core::TestSuite;
use harness_core::VerdictKind;
use harness_core::build_query;
use harness_core::logging::MemoryLogSink;
use harness_runner::DispatchTarget;
use harness_runner::QueryDispatcher;
use harness_runner::RunOutcome;
use harness_runner::TestRunner;
use serde_json::Value;
use serde_json::json;
use tokio::sync::oneshot;
use url::Url;

// ============================================================================
// SECTION: Stub Agent
// ============================================================================

const EXPECTED_OUTPUT: &str = "CHEBI:6801";

#[derive(Default)]
struct AgentStub {
    requests: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    inputs: Mutex<Vec<String>>,
}

async fn handle_query(State(stub): State<Arc<AgentStub>>, Json(body): Json<Value>) -> Response {
    stub.requests.fetch_add(1, Ordering::SeqCst);
    let current = stub.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    stub.max_in_flight.fetch_max(current, Ordering::SeqCst);
    let input = body
        .pointer("/message/query_graph/nodes/n0/ids/0")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    stub.inputs.lock().unwrap().push(input.clone());

    let response = if input.starts_with("SLOW:") {
        tokio::time::sleep(Duration::from_secs(3)).await;
        (StatusCode::OK, Json(json!({"message": {"results": []}}))).into_response()
    } else if input.starts_with("BUSY:") {
        tokio::time::sleep(Duration::from_millis(100)).await;
        (StatusCode::OK, Json(ranked_results(&input))).into_response()
    } else if input.starts_with("DOWN:") {
        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"detail": "maintenance"}))).into_response()
    } else if input.starts_with("GARBAGE:") {
        (StatusCode::OK, "<html>not json</html>").into_response()
    } else if input.starts_with("EMPTY:") {
        (StatusCode::OK, Json(json!({"message": {"results": []}}))).into_response()
    } else {
        (StatusCode::OK, Json(ranked_results(&input))).into_response()
    };
    stub.in_flight.fetch_sub(1, Ordering::SeqCst);
    response
}

/// Two results: the expected output first, an unrelated chemical second.
fn ranked_results(input: &str) -> Value {
    json!({
        "message": {
            "results": [
                {
                    "node_bindings": {"n0": [{"id": input}], "n1": [{"id": EXPECTED_OUTPUT}]},
                    "analyses": [{"score": 0.9}],
                },
                {
                    "node_bindings": {"n0": [{"id": input}], "n1": [{"id": "CHEBI:15365"}]},
                    "analyses": [{"score": 0.1}],
                },
            ],
        },
    })
}

async fn spawn_agent() -> (Url, Arc<AgentStub>, oneshot::Sender<()>) {
    let stub = Arc::new(AgentStub::default());
    let app = Router::new().route("/query", post(handle_query)).with_state(Arc::clone(&stub));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await;
    });
    let url = Url::parse(&format!("http://{addr}/query")).expect("url");
    (url, stub, shutdown_tx)
}

// ============================================================================
// SECTION: Fixtures
// ============================================================================

fn agent() -> AgentId {
    AgentId::new("biothings-explorer")
}

fn dispatch_case() -> TestCaseId {
    TestCaseId::new("TestCase_dispatch")
}

fn dispatcher(url: Url, timeout: Duration, concurrency: usize, logger: RunLogger) -> QueryDispatcher {
    QueryDispatcher::new(
        DispatchTarget {
            url,
            agent: agent(),
            timeout,
            concurrency,
        },
        logger,
    )
    .expect("dispatcher")
}

fn asset(id: &str, input: &str, expected: &str) -> TestAsset {
    TestAsset {
        id: TestAssetId::new(id),
        name: Some(format!("{input} treated by {EXPECTED_OUTPUT}")),
        input_id: Some(input.to_string()),
        input_category: Some("biolink:Disease".to_string()),
        predicate_id: Some("biolink:treats".to_string()),
        output_id: Some(EXPECTED_OUTPUT.to_string()),
        output_category: Some("biolink:ChemicalEntity".to_string()),
        expected_output: Some(expected.to_string()),
    }
}

fn test_case(id: &str, objective: Option<TestObjective>, assets: Vec<TestAsset>) -> TestCase {
    TestCase {
        id: TestCaseId::new(id),
        name: None,
        objective,
        test_assets: assets,
    }
}

fn suite(cases: Vec<TestCase>) -> TestSuite {
    TestSuite {
        id: Some("runner_tests".to_string()),
        test_cases: cases.into_iter().map(|case| (case.id.as_str().to_string(), case)).collect(),
    }
}

#[derive(Default)]
struct RecordingSink {
    row_counts: Mutex<Vec<usize>>,
}

impl ReportSink for RecordingSink {
    fn checkpoint(&self, _stats: &StatisticsTable, report: &FlatReport) -> Result<(), ArtifactError> {
        self.row_counts.lock().unwrap().push(report.rows().len());
        Ok(())
    }
}

struct MappingNormalizer {
    mappings: BTreeMap<String, String>,
}

#[async_trait]
impl Normalizer for MappingNormalizer {
    async fn normalize(&self, curies: &[String]) -> Result<BTreeMap<String, String>, NormalizeError> {
        Ok(curies
            .iter()
            .filter_map(|curie| self.mappings.get(curie).map(|id| (curie.clone(), id.clone())))
            .collect())
    }
}

struct FailingNormalizer;

#[async_trait]
impl Normalizer for FailingNormalizer {
    async fn normalize(&self, _curies: &[String]) -> Result<BTreeMap<String, String>, NormalizeError> {
        Err(NormalizeError::Unavailable("connection refused".to_string()))
    }
}

struct Harness {
    runner: TestRunner,
    stub: Arc<AgentStub>,
    logs: Arc<MemoryLogSink>,
    sink: Arc<RecordingSink>,
    _shutdown: oneshot::Sender<()>,
}

async fn harness(normalizer: Arc<dyn Normalizer>, timeout: Duration, concurrency: usize) -> Harness {
    let (url, stub, shutdown) = spawn_agent().await;
    let logs = Arc::new(MemoryLogSink::new());
    let logger = RunLogger::new("runner-test", logs.clone());
    let sink = Arc::new(RecordingSink::default());
    let runner = TestRunner::new(
        dispatcher(url, timeout, concurrency, logger.clone()),
        normalizer,
        Arc::new(RankClassifier::default()),
        sink.clone(),
        logger,
    );
    Harness {
        runner,
        stub,
        logs,
        sink,
        _shutdown: shutdown,
    }
}

async fn default_harness() -> Harness {
    harness(Arc::new(IdentityNormalizer), Duration::from_secs(5), 1).await
}

fn count(outcome: &RunOutcome, category: ExpectedOutput, kind: VerdictKind) -> u64 {
    outcome.stats.get(&agent(), category, kind).expect("seeded cell")
}

fn tags(outcome: &RunOutcome) -> Vec<String> {
    outcome.report.rows().iter().map(|row| row.verdicts.join("|")).collect()
}

// ============================================================================
// SECTION: Dispatcher
// ============================================================================

#[tokio::test]
async fn dispatcher_times_out_without_blocking_siblings() {
    let (url, _stub, shutdown) = spawn_agent().await;
    let logger = RunLogger::new("dispatch-test", Arc::new(MemoryLogSink::new()));
    let dispatcher = dispatcher(url, Duration::from_millis(300), 2, logger);
    let slow = build_query(&asset("slow", "SLOW:1", "TopAnswer")).unwrap();
    let fast = build_query(&asset("fast", "MONDO:0005148", "TopAnswer")).unwrap();
    let mut plan = QueryPlan::new();
    plan.insert(slow.clone()).unwrap();
    plan.insert(fast.clone()).unwrap();

    let responses = dispatcher.run(&dispatch_case(), &plan).await;
    assert_eq!(responses.len(), 2);
    let slow_response = &responses[&slow.hash][&agent()];
    assert_eq!(slow_response.status_code, 598);
    assert_eq!(slow_response.failure_verdict().unwrap().message(), Some("Timed out"));
    let fast_response = &responses[&fast.hash][&agent()];
    assert_eq!(fast_response.status_code, 200);
    assert_eq!(fast_response.results().len(), 2);
    let _ = shutdown.send(());
}

#[tokio::test]
async fn dispatcher_captures_http_and_body_failures() {
    let (url, _stub, shutdown) = spawn_agent().await;
    let logger = RunLogger::new("dispatch-test", Arc::new(MemoryLogSink::new()));
    let dispatcher = dispatcher(url, Duration::from_secs(5), 4, logger);
    let down = build_query(&asset("down", "DOWN:1", "TopAnswer")).unwrap();
    let garbage = build_query(&asset("garbage", "GARBAGE:1", "TopAnswer")).unwrap();
    let mut plan = QueryPlan::new();
    plan.insert(down.clone()).unwrap();
    plan.insert(garbage.clone()).unwrap();

    let responses = dispatcher.run(&dispatch_case(), &plan).await;
    let down_response = &responses[&down.hash][&agent()];
    assert_eq!(down_response.status_code, 503);
    assert_eq!(down_response.body, json!({"detail": "maintenance"}));
    assert_eq!(down_response.failure_verdict().unwrap().message(), Some("Status code: 503"));
    let garbage_response = &responses[&garbage.hash][&agent()];
    assert_eq!(garbage_response.failure_verdict().unwrap().message(), Some("invalid response body"));
    let _ = shutdown.send(());
}

#[tokio::test]
async fn dispatcher_reports_unreachable_agent_as_transport_failure() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let url = Url::parse(&format!("http://{addr}/query")).unwrap();
    let logs = Arc::new(MemoryLogSink::new());
    let dispatcher = dispatcher(url, Duration::from_secs(2), 1, RunLogger::new("dispatch-test", logs.clone()));
    let query = build_query(&asset("a", "MONDO:0005148", "TopAnswer")).unwrap();
    let mut plan = QueryPlan::new();
    plan.insert(query.clone()).unwrap();

    let responses = dispatcher.run(&dispatch_case(), &plan).await;
    let response = &responses[&query.hash][&agent()];
    assert_eq!(response.status_code, 418);
    let verdict = response.failure_verdict().unwrap();
    assert_eq!(verdict.kind(), VerdictKind::Error);
    assert_ne!(verdict.message(), Some("Status code: 418"));
    let errors = logs.events_at(LogLevel::Error);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].test_case_id, Some(dispatch_case()));
}

#[tokio::test]
async fn dispatcher_respects_concurrency_bound() {
    let (url, stub, shutdown) = spawn_agent().await;
    let logger = RunLogger::new("dispatch-test", Arc::new(MemoryLogSink::new()));
    let dispatcher = dispatcher(url, Duration::from_secs(5), 2, logger);
    let mut plan = QueryPlan::new();
    for index in 0 .. 6 {
        plan.insert(build_query(&asset("busy", &format!("BUSY:{index}"), "TopAnswer")).unwrap())
            .unwrap();
    }

    let responses = dispatcher.run(&dispatch_case(), &plan).await;
    assert_eq!(responses.len(), 6);
    assert_eq!(stub.requests.load(Ordering::SeqCst), 6);
    let peak = stub.max_in_flight.load(Ordering::SeqCst);
    assert!((1 ..= 2).contains(&peak), "peak in-flight {peak}");
    let _ = shutdown.send(());
}

// ============================================================================
// SECTION: Runner
// ============================================================================

#[tokio::test]
async fn equivalent_assets_share_one_request() {
    let harness = default_harness().await;
    let suite = suite(vec![test_case(
        "TestCase_1",
        Some(TestObjective::AcceptanceTest),
        vec![
            asset("Asset_1", "MONDO:0005148", "Acceptable"),
            asset("Asset_2", "MONDO:0005148", "Acceptable"),
        ],
    )]);

    let outcome = harness.runner.run(&suite).await;
    assert_eq!(harness.stub.requests.load(Ordering::SeqCst), 1);
    assert_eq!(count(&outcome, ExpectedOutput::Acceptable, VerdictKind::Passed), 2);
    assert_eq!(tags(&outcome), vec!["PASSED", "PASSED"]);
    assert_eq!(outcome.summary.passed, 2);
    assert_eq!(*harness.sink.row_counts.lock().unwrap(), vec![2]);
}

#[tokio::test]
async fn service_unavailable_is_counted_failed() {
    let harness = default_harness().await;
    let suite = suite(vec![test_case(
        "TestCase_1",
        Some(TestObjective::AcceptanceTest),
        vec![asset("Asset_1", "DOWN:1", "TopAnswer")],
    )]);

    let outcome = harness.runner.run(&suite).await;
    assert_eq!(count(&outcome, ExpectedOutput::TopAnswer, VerdictKind::Failed), 1);
    assert_eq!(tags(&outcome), vec!["FAILED"]);
    assert_eq!(outcome.summary.failed, 1);
}

#[tokio::test]
async fn timed_out_query_does_not_hold_back_siblings() {
    let harness = harness(Arc::new(IdentityNormalizer), Duration::from_millis(300), 2).await;
    let suite = suite(vec![test_case(
        "TestCase_1",
        Some(TestObjective::AcceptanceTest),
        vec![asset("Asset_1", "SLOW:1", "TopAnswer"), asset("Asset_2", "MONDO:0005148", "TopAnswer")],
    )]);

    let outcome = harness.runner.run(&suite).await;
    assert_eq!(count(&outcome, ExpectedOutput::TopAnswer, VerdictKind::Error), 1);
    assert_eq!(count(&outcome, ExpectedOutput::TopAnswer, VerdictKind::Passed), 1);
    assert_eq!(tags(&outcome), vec!["Test Error", "PASSED"]);
    assert_eq!(outcome.summary.failed, 1);
    assert_eq!(outcome.summary.passed, 1);
}

#[tokio::test]
async fn overly_generic_assets_are_never_dispatched() {
    let harness = default_harness().await;
    let suite = suite(vec![test_case(
        "TestCase_1",
        Some(TestObjective::AcceptanceTest),
        vec![asset("Asset_1", "MONDO:0005148", "OverlyGeneric")],
    )]);

    let outcome = harness.runner.run(&suite).await;
    assert_eq!(harness.stub.requests.load(Ordering::SeqCst), 0);
    assert!(outcome.report.rows().is_empty());
    assert_eq!(outcome.summary.total(), 0);
    let warnings = harness.logs.events_at(LogLevel::Warning);
    assert!(warnings.iter().any(|event| event.message.contains("OverlyGeneric")));
}

#[tokio::test]
async fn empty_results_and_never_show_are_graded() {
    let harness = default_harness().await;
    let suite = suite(vec![test_case(
        "TestCase_1",
        Some(TestObjective::AcceptanceTest),
        vec![asset("Asset_1", "EMPTY:1", "TopAnswer"), asset("Asset_2", "MONDO:0005148", "NeverShow")],
    )]);

    let outcome = harness.runner.run(&suite).await;
    assert_eq!(count(&outcome, ExpectedOutput::TopAnswer, VerdictKind::NoResults), 1);
    assert_eq!(count(&outcome, ExpectedOutput::NeverShow, VerdictKind::Failed), 1);
    assert_eq!(outcome.summary.skipped, 1);
    assert_eq!(outcome.summary.failed, 1);
}

#[tokio::test]
async fn unsupported_objective_counts_as_failure() {
    let harness = default_harness().await;
    let suite = suite(vec![
        test_case(
            "TestCase_1",
            Some(TestObjective::Other("PerformanceTest".to_string())),
            vec![asset("Asset_1", "MONDO:0005148", "TopAnswer")],
        ),
        test_case(
            "TestCase_2",
            Some(TestObjective::QuantitativeTest),
            vec![asset("Asset_2", "MONDO:0005148", "TopAnswer")],
        ),
        test_case("TestCase_3", None, vec![asset("Asset_3", "MONDO:0005148", "TopAnswer")]),
        test_case("TestCase_4", Some(TestObjective::AcceptanceTest), Vec::new()),
    ]);

    let outcome = harness.runner.run(&suite).await;
    assert_eq!(harness.stub.requests.load(Ordering::SeqCst), 0);
    assert_eq!(outcome.summary.failed, 1);
    assert_eq!(outcome.summary.total(), 1);
    assert_eq!(harness.logs.events_at(LogLevel::Error).len(), 1);
    assert_eq!(harness.logs.events_at(LogLevel::Warning).len(), 2);
    assert_eq!(*harness.sink.row_counts.lock().unwrap(), vec![0]);
}

#[tokio::test]
async fn normalized_input_is_sent_and_misses_fall_back() {
    let normalizer = MappingNormalizer {
        mappings: BTreeMap::from([("MESH:D003924".to_string(), "MONDO:0005148".to_string())]),
    };
    let harness = harness(Arc::new(normalizer), Duration::from_secs(5), 1).await;
    let suite = suite(vec![test_case(
        "TestCase_1",
        Some(TestObjective::AcceptanceTest),
        vec![asset("Asset_1", "MESH:D003924", "TopAnswer")],
    )]);

    let outcome = harness.runner.run(&suite).await;
    assert_eq!(*harness.stub.inputs.lock().unwrap(), vec!["MONDO:0005148".to_string()]);
    assert_eq!(tags(&outcome), vec!["PASSED"]);
    let warnings = harness.logs.events_at(LogLevel::Warning);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains(EXPECTED_OUTPUT));
}

#[tokio::test]
async fn normalizer_outage_uses_raw_identifiers() {
    let harness = harness(Arc::new(FailingNormalizer), Duration::from_secs(5), 1).await;
    let suite = suite(vec![test_case(
        "TestCase_1",
        Some(TestObjective::AcceptanceTest),
        vec![asset("Asset_1", "MONDO:0005148", "Acceptable")],
    )]);

    let outcome = harness.runner.run(&suite).await;
    assert_eq!(*harness.stub.inputs.lock().unwrap(), vec!["MONDO:0005148".to_string()]);
    assert_eq!(outcome.summary.passed, 1);
    let warnings = harness.logs.events_at(LogLevel::Warning);
    assert!(warnings.iter().any(|event| event.message.contains("normalization failed")));
}

#[tokio::test]
async fn checkpoints_follow_every_processed_case() {
    let harness = default_harness().await;
    let suite = suite(vec![
        test_case(
            "TestCase_1",
            Some(TestObjective::AcceptanceTest),
            vec![asset("Asset_1", "MONDO:0005148", "TopAnswer")],
        ),
        test_case(
            "TestCase_2",
            Some(TestObjective::AcceptanceTest),
            vec![asset("Asset_2", "MONDO:0007739", "TopAnswer"), asset("Asset_3", "DOWN:2", "TopAnswer")],
        ),
    ]);

    let outcome = harness.runner.run(&suite).await;
    assert_eq!(*harness.sink.row_counts.lock().unwrap(), vec![1, 3]);
    assert_eq!(outcome.report.rows().len(), 3);
    assert_eq!(harness.stub.requests.load(Ordering::SeqCst), 3);
}
