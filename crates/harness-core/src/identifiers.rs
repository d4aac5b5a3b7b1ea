// crates/harness-core/src/identifiers.rs
// ============================================================================
// Module: Harness Identifiers
// Description: Opaque identifiers for test cases, test assets, and agents.
// Purpose: Keep suite identity and agent labels strongly typed.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Identifiers are opaque strings that serialize transparently. Test case and
//! asset identifiers come straight from the suite document; agent identifiers
//! are derived from infores CURIEs (`infores:biothings-explorer`) and are
//! used as statistics keys and report column names.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Prefix carried by infores CURIEs.
pub const INFORES_PREFIX: &str = "infores:";

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Test case identifier from the suite document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestCaseId(String);

impl TestCaseId {
    /// Creates a new test case identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TestCaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for TestCaseId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Test asset identifier from the suite document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestAssetId(String);

impl TestAssetId {
    /// Creates a new test asset identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TestAssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for TestAssetId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Agent label for a target system under evaluation.
///
/// # Invariants
/// - Never carries the `infores:` prefix.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    /// Creates a new agent identifier from a bare label.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derives an agent identifier from an infores CURIE.
    ///
    /// Returns `None` when the label is empty once the prefix is removed.
    #[must_use]
    pub fn from_infores(infores: &str) -> Option<Self> {
        let trimmed = infores.trim();
        let label = trimmed.strip_prefix(INFORES_PREFIX).unwrap_or(trimmed);
        if label.is_empty() { None } else { Some(Self::new(label)) }
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for AgentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
