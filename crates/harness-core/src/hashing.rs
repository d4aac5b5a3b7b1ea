// crates/harness-core/src/hashing.rs
// ============================================================================
// Module: Harness Canonical Hashing
// Description: RFC 8785 JSON canonicalization and content hashing.
// Purpose: Derive stable query hashes used to deduplicate dispatches.
// Dependencies: serde, serde_jcs, sha2
// ============================================================================

//! ## Overview
//! Query identity is the SHA-256 digest of the RFC 8785 (JCS) encoding of the
//! fields that shape a query. Canonicalization makes the digest independent of
//! map ordering and whitespace, so equivalent queries always collide on
//! purpose and distinct queries never do.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Query Hash
// ============================================================================

/// Content hash of a canonical query.
///
/// # Invariants
/// - Always 64 lowercase hex characters (SHA-256).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryHash(String);

impl QueryHash {
    /// Returns the hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns a short prefix suitable for log messages.
    #[must_use]
    pub fn short(&self) -> &str {
        self.0.get(.. 12).unwrap_or(&self.0)
    }
}

impl fmt::Display for QueryHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when computing canonical hashes.
#[derive(Debug, Error)]
pub enum HashError {
    /// JSON canonicalization failed.
    #[error("failed to canonicalize json: {0}")]
    Canonicalization(String),
}

// ============================================================================
// SECTION: Hashing Helpers
// ============================================================================

/// Returns canonical JSON bytes for a serializable value using RFC 8785.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn canonical_json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, HashError> {
    serde_jcs::to_vec(value).map_err(|err| HashError::Canonicalization(err.to_string()))
}

/// Hashes the canonical JSON form of a value.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn hash_canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<QueryHash, HashError> {
    let bytes = canonical_json_bytes(value)?;
    let digest = Sha256::digest(&bytes);
    Ok(QueryHash(hex_encode(&digest)))
}

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}
