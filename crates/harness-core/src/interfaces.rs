// crates/harness-core/src/interfaces.rs
// ============================================================================
// Module: Harness Interfaces
// Description: Collaborator traits for identifier normalization and artifacts.
// Purpose: Keep external services and storage behind explicit boundaries.
// Dependencies: async-trait, thiserror
// ============================================================================

//! ## Overview
//! The engine talks to two external collaborators besides the target service:
//! a [`Normalizer`] that canonicalizes CURIEs, and a [`ReportSink`] that
//! persists statistics and report snapshots. Both report failures through
//! typed errors; the engine decides how to recover.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::report::FlatReport;
use crate::stats::StatisticsTable;

// ============================================================================
// SECTION: Normalization
// ============================================================================

/// Canonicalizes raw identifiers.
#[async_trait]
pub trait Normalizer: Send + Sync {
    /// Returns canonical identifiers for the CURIEs it could resolve.
    ///
    /// Unresolvable CURIEs are simply absent from the returned map.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError`] when the lookup as a whole fails.
    async fn normalize(&self, curies: &[String]) -> Result<BTreeMap<String, String>, NormalizeError>;
}

/// Normalization failures.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// The normalization service could not be reached.
    #[error("normalizer unavailable: {0}")]
    Unavailable(String),
    /// The normalization service answered with an unusable payload.
    #[error("normalizer response invalid: {0}")]
    InvalidResponse(String),
}

/// Normalizer that maps every identifier to itself.
pub struct IdentityNormalizer;

#[async_trait]
impl Normalizer for IdentityNormalizer {
    async fn normalize(&self, curies: &[String]) -> Result<BTreeMap<String, String>, NormalizeError> {
        Ok(curies.iter().map(|curie| (curie.clone(), curie.clone())).collect())
    }
}

// ============================================================================
// SECTION: Artifacts
// ============================================================================

/// Persists aggregate snapshots.
pub trait ReportSink: Send + Sync {
    /// Writes the current statistics and report.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError`] when persistence fails.
    fn checkpoint(&self, stats: &StatisticsTable, report: &FlatReport) -> Result<(), ArtifactError>;
}

/// Artifact persistence failures.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// Serializing an artifact failed.
    #[error("artifact serialization failed: {0}")]
    Serialize(String),
    /// Writing an artifact failed.
    #[error("artifact write failed: {0}")]
    Io(String),
}

/// Sink that discards snapshots.
pub struct NoopReportSink;

impl ReportSink for NoopReportSink {
    fn checkpoint(&self, _stats: &StatisticsTable, _report: &FlatReport) -> Result<(), ArtifactError> {
        Ok(())
    }
}
