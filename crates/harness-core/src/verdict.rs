// crates/harness-core/src/verdict.rs
// ============================================================================
// Module: Dispatch Results and Verdicts
// Description: Per-agent dispatch outcomes and closed verdict variants.
// Purpose: Give the aggregator an exhaustive set of outcomes to count.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! The dispatcher produces an [`AgentResponse`] per agent per unique query.
//! Responses that failed at the transport or HTTP layer never reach the
//! classifier; [`AgentResponse::failure_verdict`] turns them into a
//! [`Verdict`] directly. Every verdict reduces to a [`VerdictKind`], which is
//! the key space the statistics table is seeded with.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::identifiers::AgentId;

// ============================================================================
// SECTION: Status Codes
// ============================================================================

/// Status recorded when a request exceeded its timeout.
pub const STATUS_TIMED_OUT: u16 = 598;
/// Status recorded when no HTTP response arrived; the failure kind, not this
/// code, marks the response as a transport failure.
pub const STATUS_TRANSPORT_FAILURE: u16 = 418;
/// Message attached to timed-out dispatches.
pub const TIMED_OUT_MESSAGE: &str = "Timed out";
/// Diagnostic recorded when a success response does not decode as JSON.
pub const INVALID_BODY_MESSAGE: &str = "invalid response body";

// ============================================================================
// SECTION: Dispatch Results
// ============================================================================

/// How a dispatch failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchFailure {
    /// The request exceeded its timeout.
    TimedOut,
    /// No HTTP response arrived (connect, TLS, or body read failure).
    Transport,
    /// The agent answered with a non-success status.
    Status,
    /// A success response whose body is not JSON.
    InvalidBody,
}

/// Outcome of one request to one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    /// HTTP status, or a synthetic status for timeouts and transport failures.
    pub status_code: u16,
    /// Decoded response body (`null` when unavailable).
    pub body: Value,
    /// Failure description when the dispatch did not succeed.
    pub error: Option<String>,
    /// Failure kind; `None` for a usable response.
    #[serde(default)]
    pub failure: Option<DispatchFailure>,
}

impl AgentResponse {
    /// Builds a successful response.
    #[must_use]
    pub const fn success(status_code: u16, body: Value) -> Self {
        Self {
            status_code,
            body,
            error: None,
            failure: None,
        }
    }

    /// Builds a timed-out response.
    #[must_use]
    pub fn timed_out() -> Self {
        Self {
            status_code: STATUS_TIMED_OUT,
            body: Value::Null,
            error: Some(TIMED_OUT_MESSAGE.to_string()),
            failure: Some(DispatchFailure::TimedOut),
        }
    }

    /// Builds a response for a transport failure with no HTTP status.
    #[must_use]
    pub fn transport_failure(message: impl Into<String>) -> Self {
        Self {
            status_code: STATUS_TRANSPORT_FAILURE,
            body: Value::Null,
            error: Some(message.into()),
            failure: Some(DispatchFailure::Transport),
        }
    }

    /// Builds a response for a non-success HTTP status.
    #[must_use]
    pub fn http_failure(status_code: u16, body: Value) -> Self {
        Self {
            status_code,
            body,
            error: Some(status_message(status_code)),
            failure: Some(DispatchFailure::Status),
        }
    }

    /// Builds a response for a success status whose body is not JSON.
    #[must_use]
    pub fn invalid_body(status_code: u16) -> Self {
        Self {
            status_code,
            body: Value::Null,
            error: Some(INVALID_BODY_MESSAGE.to_string()),
            failure: Some(DispatchFailure::InvalidBody),
        }
    }

    /// Returns the TRAPI results list, or an empty slice when absent.
    #[must_use]
    pub fn results(&self) -> &[Value] {
        self.body
            .pointer("/message/results")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns the verdict for a failed dispatch, or `None` when the response
    /// should be handed to the classifier.
    #[must_use]
    pub fn failure_verdict(&self) -> Option<Verdict> {
        match self.failure? {
            DispatchFailure::TimedOut => Some(Verdict::Error {
                message: TIMED_OUT_MESSAGE.to_string(),
            }),
            DispatchFailure::Status => Some(Verdict::Failed {
                message: Some(status_message(self.status_code)),
            }),
            DispatchFailure::Transport | DispatchFailure::InvalidBody => Some(Verdict::Error {
                message: self.error.clone().unwrap_or_default(),
            }),
        }
    }
}

/// Formats the diagnostic for an unexpected HTTP status.
fn status_message(status_code: u16) -> String {
    format!("Status code: {status_code}")
}

/// Responses for one unique query, keyed by agent.
pub type DispatchResult = BTreeMap<AgentId, AgentResponse>;

// ============================================================================
// SECTION: Verdicts
// ============================================================================

/// Classification outcome for one asset against one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verdict {
    /// Expectation satisfied.
    Passed,
    /// Expectation not satisfied.
    Failed {
        /// Optional diagnostic.
        message: Option<String>,
    },
    /// Agent returned no results.
    NoResults,
    /// Grading could not be performed.
    Error {
        /// Diagnostic describing the failure.
        message: String,
    },
}

impl Verdict {
    /// Returns the verdict kind used as a statistics key.
    #[must_use]
    pub const fn kind(&self) -> VerdictKind {
        match self {
            Self::Passed => VerdictKind::Passed,
            Self::Failed {
                ..
            } => VerdictKind::Failed,
            Self::NoResults => VerdictKind::NoResults,
            Self::Error {
                ..
            } => VerdictKind::Error,
        }
    }

    /// Returns the attached diagnostic, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Failed {
                message,
            } => message.as_deref(),
            Self::Error {
                message,
            } => Some(message),
            Self::Passed | Self::NoResults => None,
        }
    }
}

/// Verdict discriminant without diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VerdictKind {
    /// Expectation satisfied.
    Passed,
    /// Expectation not satisfied.
    Failed,
    /// Agent returned no results.
    NoResults,
    /// Grading could not be performed.
    Error,
}

impl VerdictKind {
    /// All verdict kinds in report order.
    pub const ALL: [Self; 4] = [Self::Passed, Self::Failed, Self::NoResults, Self::Error];

    /// Returns the tag written to statistics and report rows.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Passed => "PASSED",
            Self::Failed => "FAILED",
            Self::NoResults => "No results",
            Self::Error => "Test Error",
        }
    }
}

impl fmt::Display for VerdictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
