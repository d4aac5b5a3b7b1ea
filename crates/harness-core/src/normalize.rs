// crates/harness-core/src/normalize.rs
// ============================================================================
// Module: Normalization Cache
// Description: Run-scoped memo of raw to canonical identifiers.
// Purpose: Merge normalizer answers across test cases and resolve misses.
// Dependencies: std
// ============================================================================

//! ## Overview
//! The cache lives for one harness invocation and is never evicted; its size
//! is bounded by the number of distinct CURIEs in the suite. Lookups that miss
//! fall back to the raw identifier and tell the caller so it can warn.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

// ============================================================================
// SECTION: Cache
// ============================================================================

/// Outcome of resolving one identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// The cache held a canonical identifier.
    Canonical(String),
    /// No mapping was known; the raw identifier is passed through.
    Fallback(String),
}

impl Resolved {
    /// Returns the identifier to use.
    #[must_use]
    pub fn into_id(self) -> String {
        match self {
            Self::Canonical(id) | Self::Fallback(id) => id,
        }
    }
}

/// Raw to canonical identifier memo.
#[derive(Debug, Clone, Default)]
pub struct NormalizationCache {
    /// Known mappings.
    entries: BTreeMap<String, String>,
}

impl NormalizationCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges new mappings, overwriting only the keys present in `mappings`.
    pub fn merge(&mut self, mappings: BTreeMap<String, String>) {
        self.entries.extend(mappings);
    }

    /// Returns true when the identifier has a mapping.
    #[must_use]
    pub fn contains(&self, raw: &str) -> bool {
        self.entries.contains_key(raw)
    }

    /// Resolves an identifier, falling back to the raw value.
    #[must_use]
    pub fn resolve(&self, raw: &str) -> Resolved {
        self.entries
            .get(raw)
            .map_or_else(|| Resolved::Fallback(raw.to_string()), |id| Resolved::Canonical(id.clone()))
    }

    /// Returns the number of cached mappings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
