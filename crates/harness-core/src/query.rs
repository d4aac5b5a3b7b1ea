// crates/harness-core/src/query.rs
// ============================================================================
// Module: Canonical Query Builder
// Description: TRAPI query construction and content-addressed query plans.
// Purpose: Collapse assets with identical query intent into one dispatch.
// Dependencies: serde, serde_json, crate::hashing
// ============================================================================

//! ## Overview
//! A [`QueryKey`] captures exactly the fields that change what the target
//! service is asked: normalized input CURIE, input category, predicate, and
//! output category. Asset identifiers, names, and expected outputs are not
//! part of the key, so two assets that differ only in display metadata or
//! grading expectation share one [`CanonicalQuery`].
//!
//! Invariants:
//! - A [`QueryPlan`] is append-only for the lifetime of one test case.
//! - Two different keys under one hash are rejected as a collision.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

use crate::hashing::HashError;
use crate::hashing::QueryHash;
use crate::hashing::hash_canonical_json;
use crate::model::TestAsset;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Category used when an asset omits an input or output category.
pub const DEFAULT_CATEGORY: &str = "biolink:NamedThing";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Query construction failures.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Asset is missing a field the query needs.
    #[error("asset is missing {0}")]
    MissingField(&'static str),
    /// Canonicalization of the query key failed.
    #[error(transparent)]
    Hash(#[from] HashError),
    /// Two distinct keys produced the same hash.
    #[error("query hash collision on {0}")]
    HashCollision(QueryHash),
}

// ============================================================================
// SECTION: Query Types
// ============================================================================

/// Fields that determine query semantics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryKey {
    /// Normalized input CURIE.
    pub input_id: String,
    /// Biolink category of the input node.
    pub input_category: String,
    /// Biolink predicate of the single edge.
    pub predicate: String,
    /// Biolink category of the output node.
    pub output_category: String,
}

impl QueryKey {
    /// Extracts the query key from an asset.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::MissingField`] when the input CURIE or predicate
    /// is absent.
    pub fn from_asset(asset: &TestAsset) -> Result<Self, QueryError> {
        let input_id = non_empty(asset.input_id.as_deref()).ok_or(QueryError::MissingField("input_id"))?;
        let predicate =
            non_empty(asset.predicate_id.as_deref()).ok_or(QueryError::MissingField("predicate_id"))?;
        Ok(Self {
            input_id: input_id.to_string(),
            input_category: non_empty(asset.input_category.as_deref())
                .unwrap_or(DEFAULT_CATEGORY)
                .to_string(),
            predicate: predicate.to_string(),
            output_category: non_empty(asset.output_category.as_deref())
                .unwrap_or(DEFAULT_CATEGORY)
                .to_string(),
        })
    }

    /// Renders the TRAPI message for this key.
    #[must_use]
    pub fn to_message(&self) -> Value {
        json!({
            "message": {
                "query_graph": {
                    "nodes": {
                        "n0": {
                            "ids": [self.input_id],
                            "categories": [self.input_category],
                        },
                        "n1": {
                            "categories": [self.output_category],
                        },
                    },
                    "edges": {
                        "e0": {
                            "subject": "n0",
                            "object": "n1",
                            "predicates": [self.predicate],
                            "knowledge_type": "inferred",
                        },
                    },
                },
            },
        })
    }
}

/// Content-addressed query ready for dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalQuery {
    /// Hash over [`QueryKey`].
    pub hash: QueryHash,
    /// Fields the hash was derived from.
    pub key: QueryKey,
    /// TRAPI request body.
    pub message: Value,
}

/// Builds the canonical query for an asset with a normalized input CURIE.
///
/// # Errors
///
/// Returns [`QueryError`] when required fields are missing or hashing fails.
pub fn build_query(asset: &TestAsset) -> Result<CanonicalQuery, QueryError> {
    let key = QueryKey::from_asset(asset)?;
    let hash = hash_canonical_json(&key)?;
    let message = key.to_message();
    Ok(CanonicalQuery {
        hash,
        key,
        message,
    })
}

/// Returns the value when it is present and non-empty.
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

// ============================================================================
// SECTION: Query Plan
// ============================================================================

/// Deduplicated set of queries for one test case.
#[derive(Debug, Clone, Default)]
pub struct QueryPlan {
    /// Queries keyed by content hash.
    queries: BTreeMap<QueryHash, CanonicalQuery>,
}

impl QueryPlan {
    /// Creates an empty plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a query, returning `true` when it was not already planned.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::HashCollision`] when the hash is already mapped
    /// to a different key.
    pub fn insert(&mut self, query: CanonicalQuery) -> Result<bool, QueryError> {
        match self.queries.entry(query.hash.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(query);
                Ok(true)
            }
            Entry::Occupied(existing) => {
                if existing.get().key == query.key {
                    Ok(false)
                } else {
                    Err(QueryError::HashCollision(query.hash))
                }
            }
        }
    }

    /// Returns the planned query for a hash.
    #[must_use]
    pub fn get(&self, hash: &QueryHash) -> Option<&CanonicalQuery> {
        self.queries.get(hash)
    }

    /// Iterates planned queries in hash order.
    pub fn queries(&self) -> impl Iterator<Item = &CanonicalQuery> {
        self.queries.values()
    }

    /// Returns the number of unique queries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    /// Returns true when nothing is planned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}
