// crates/harness-core/src/lib.rs
// ============================================================================
// Module: Translator Harness Core Library
// Description: Public API surface for the acceptance test harness core.
// Purpose: Expose suite types, query planning, verdicts, and aggregation.
// Dependencies: crate::{model, query, verdict, stats, report, collector}
// ============================================================================

//! ## Overview
//! The harness core holds everything that does not touch the network: the
//! suite model, canonical query construction and deduplication, verdicts and
//! classification, the statistics table, the flat report, and the run log.
//! Network collaborators are reached through [`Normalizer`] and live in
//! `harness-runner`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod classify;
pub mod collector;
pub mod hashing;
pub mod identifiers;
pub mod interfaces;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod query;
pub mod report;
pub mod stats;
pub mod verdict;


// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use classify::RankClassifier;
pub use classify::ResultClassifier;
pub use collector::ResultCollector;
pub use hashing::QueryHash;
pub use identifiers::AgentId;
pub use identifiers::TestAssetId;
pub use identifiers::TestCaseId;
pub use interfaces::ArtifactError;
pub use interfaces::IdentityNormalizer;
pub use interfaces::NoopReportSink;
pub use interfaces::NormalizeError;
pub use interfaces::Normalizer;
pub use interfaces::ReportSink;
pub use logging::LogContext;
pub use logging::LogLevel;
pub use logging::RunLogEvent;
pub use logging::RunLogSink;
pub use logging::RunLogger;
pub use model::AssetRejection;
pub use model::ExpectedOutput;
pub use model::TestAsset;
pub use model::TestCase;
pub use model::TestObjective;
pub use model::TestSuite;
pub use normalize::NormalizationCache;
pub use query::CanonicalQuery;
pub use query::QueryError;
pub use query::QueryPlan;
pub use query::build_query;
pub use report::FlatReport;
pub use report::ReportRow;
pub use report::RunSummary;
pub use stats::StatisticsTable;
pub use stats::StatsError;
pub use verdict::AgentResponse;
pub use verdict::DispatchFailure;
pub use verdict::DispatchResult;
pub use verdict::Verdict;
pub use verdict::VerdictKind;
