// crates/harness-runner/src/lib.rs
// ============================================================================
// Module: Translator Harness Runner Library
// Description: Network-facing pieces of the acceptance test harness.
// Purpose: Expose the dispatcher, normalizer client, suite loader, and runner.
// Dependencies: harness-core, reqwest, tokio
// ============================================================================

//! ## Overview
//! `harness-runner` connects the pure core to the network: it loads suites,
//! normalizes identifiers through the node normalization service, fans
//! queries out to the target agent under a concurrency bound, and drives the
//! per-test-case pipeline that feeds the result collector.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod dispatch;
pub mod node_normalizer;
pub mod run;
pub mod suite;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use dispatch::DispatchError;
pub use dispatch::DispatchTarget;
pub use dispatch::QueryDispatcher;
pub use node_normalizer::NodeNormalizer;
pub use run::RunOutcome;
pub use run::TestRunner;
pub use suite::SuiteError;
pub use suite::SuiteLoader;
pub use suite::SuiteSource;
pub use suite::parse_suite;
