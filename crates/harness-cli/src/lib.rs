// crates/harness-cli/src/lib.rs
// ============================================================================
// Module: Translator Harness CLI Library
// Description: Artifact writers and log sink setup shared by the CLI binary.
// Purpose: Keep filesystem side effects testable outside the binary.
// Dependencies: harness-config, harness-core, serde_json
// ============================================================================

//! ## Overview
//! The `translator-harness` binary wires configuration into the runner. This
//! library holds the pieces that touch the filesystem: the report sink that
//! checkpoints statistics and CSV after every test case, the run summary
//! writer, and run log sink construction.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod artifacts;
pub mod log_sink;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use artifacts::FileReportSink;
pub use artifacts::write_summary;
pub use log_sink::open_log_sink;
