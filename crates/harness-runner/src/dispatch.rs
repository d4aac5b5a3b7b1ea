// crates/harness-runner/src/dispatch.rs
// ============================================================================
// Module: Query Dispatcher
// Description: Bounded-concurrency fan-out of canonical queries to an agent.
// Purpose: Send every unique query once and capture failures per query.
// Dependencies: harness-core, reqwest, tokio
// ============================================================================

//! ## Overview
//! [`QueryDispatcher::run`] spawns one task per planned query into a
//! `JoinSet` before awaiting any of them. Each task takes a permit from the
//! dispatcher's semaphore, which is shared by every call for the lifetime of
//! the dispatcher and hands out permits in FIFO order. Transport problems are
//! converted into [`AgentResponse`] values inside the task; a task that
//! panics or is cancelled is logged and its query is left out of the result
//! map without disturbing its siblings.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use harness_core::AgentId;
use harness_core::AgentResponse;
use harness_core::DispatchResult;
use harness_core::LogContext;
use harness_core::QueryHash;
use harness_core::QueryPlan;
use harness_core::RunLogger;
use harness_core::TestCaseId;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

// ============================================================================
// SECTION: Target
// ============================================================================

/// Agent endpoint and dispatch limits.
#[derive(Debug, Clone)]
pub struct DispatchTarget {
    /// Endpoint receiving TRAPI queries.
    pub url: Url,
    /// Agent the endpoint belongs to.
    pub agent: AgentId,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Maximum in-flight requests.
    pub concurrency: usize,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Dispatcher construction failures.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Concurrency must allow at least one request.
    #[error("dispatch concurrency must be at least 1")]
    ZeroConcurrency,
    /// The HTTP client could not be built.
    #[error("dispatch client unavailable: {0}")]
    Client(String),
}

// ============================================================================
// SECTION: Dispatcher
// ============================================================================

/// Bounded-concurrency query dispatcher for one agent.
pub struct QueryDispatcher {
    /// Endpoint and limits.
    target: DispatchTarget,
    /// HTTP client with the per-request timeout applied.
    client: Client,
    /// Permits bounding in-flight requests.
    permits: Arc<Semaphore>,
    /// Run log handle.
    logger: RunLogger,
}

impl QueryDispatcher {
    /// Builds a dispatcher for the target.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] when concurrency is zero or the HTTP client
    /// cannot be built.
    pub fn new(target: DispatchTarget, logger: RunLogger) -> Result<Self, DispatchError> {
        if target.concurrency == 0 {
            return Err(DispatchError::ZeroConcurrency);
        }
        let client = Client::builder()
            .timeout(target.timeout)
            .build()
            .map_err(|err| DispatchError::Client(err.to_string()))?;
        let permits = Arc::new(Semaphore::new(target.concurrency));
        Ok(Self {
            target,
            client,
            permits,
            logger,
        })
    }

    /// Returns the dispatch target.
    #[must_use]
    pub const fn target(&self) -> &DispatchTarget {
        &self.target
    }

    /// Sends every planned query of a test case and collects responses keyed
    /// by hash.
    ///
    /// Never fails as a whole; queries whose task did not complete are absent
    /// from the returned map.
    pub async fn run(
        &self,
        test_case_id: &TestCaseId,
        plan: &QueryPlan,
    ) -> BTreeMap<QueryHash, DispatchResult> {
        let mut tasks = JoinSet::new();
        for query in plan.queries() {
            let client = self.client.clone();
            let permits = Arc::clone(&self.permits);
            let url = self.target.url.clone();
            let hash = query.hash.clone();
            let message = query.message.clone();
            let logger = self.logger.clone();
            let test_case_id = test_case_id.clone();
            tasks.spawn(async move {
                let context = LogContext::case(&test_case_id);
                let Ok(_permit) = permits.acquire_owned().await else {
                    logger.error(
                        context,
                        format!("query {} dropped: dispatch permits closed", hash.short()),
                    );
                    return (hash, None);
                };
                logger.debug(context, format!("sending query {}", hash.short()));
                let response = send_query(&client, url, &message).await;
                if let Some(error) = &response.error {
                    logger.error(
                        context,
                        format!("query {} failed: {error}", hash.short()),
                    );
                }
                (hash, Some(response))
            });
        }

        let mut responses = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((hash, Some(response))) => {
                    let result: DispatchResult =
                        BTreeMap::from([(self.target.agent.clone(), response)]);
                    responses.insert(hash, result);
                }
                Ok((_, None)) => {}
                Err(err) => {
                    self.logger.error(
                        LogContext::case(test_case_id),
                        format!("dispatch task did not complete: {err}"),
                    );
                }
            }
        }
        responses
    }
}

/// Posts one query and folds every outcome into an [`AgentResponse`].
async fn send_query(client: &Client, url: Url, message: &Value) -> AgentResponse {
    let response = match client.post(url).json(message).send().await {
        Ok(response) => response,
        Err(err) if err.is_timeout() => return AgentResponse::timed_out(),
        Err(err) => return AgentResponse::transport_failure(err.to_string()),
    };
    let status = response.status().as_u16();
    let bytes = match response.bytes().await {
        Ok(bytes) => bytes,
        Err(err) if err.is_timeout() => return AgentResponse::timed_out(),
        Err(err) => return AgentResponse::transport_failure(err.to_string()),
    };
    let body = serde_json::from_slice::<Value>(&bytes);
    if status >= 300 {
        return AgentResponse::http_failure(status, body.unwrap_or(Value::Null));
    }
    body.map_or_else(|_| AgentResponse::invalid_body(status), |body| AgentResponse::success(status, body))
}
