// crates/harness-runner/src/node_normalizer.rs
// ============================================================================
// Module: Node Normalizer Client
// Description: HTTP client for the Translator node normalization service.
// Purpose: Map raw CURIEs to their preferred identifiers.
// Dependencies: harness-core, reqwest, serde
// ============================================================================

//! ## Overview
//! Sends one `get_normalized_nodes` request per call with gene/protein and
//! drug/chemical conflation enabled. CURIEs the service does not know come
//! back as `null` and are left out of the returned map, as are entries
//! without an `id.identifier`. Only a reply that is not a JSON object fails
//! the whole call.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use harness_core::NormalizeError;
use harness_core::Normalizer;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use url::Url;

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Normalization request body.
#[derive(Serialize)]
struct NormalizeRequest<'a> {
    /// CURIEs to normalize.
    curies: &'a [String],
    /// Conflate genes and proteins.
    conflate: bool,
    /// Conflate drugs and chemicals.
    drug_chemical_conflate: bool,
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Node normalization service client.
pub struct NodeNormalizer {
    /// Full `get_normalized_nodes` endpoint.
    endpoint: String,
    /// HTTP client configured with the request timeout.
    client: Client,
}

impl NodeNormalizer {
    /// Builds a client for the service rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::Unavailable`] when the HTTP client cannot be
    /// built.
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, NormalizeError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| NormalizeError::Unavailable(err.to_string()))?;
        let endpoint = format!("{}/get_normalized_nodes", base_url.as_str().trim_end_matches('/'));
        Ok(Self {
            endpoint,
            client,
        })
    }

    /// Returns the normalization endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Normalizer for NodeNormalizer {
    async fn normalize(&self, curies: &[String]) -> Result<BTreeMap<String, String>, NormalizeError> {
        if curies.is_empty() {
            return Ok(BTreeMap::new());
        }
        let request = NormalizeRequest {
            curies,
            conflate: true,
            drug_chemical_conflate: true,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|err| NormalizeError::Unavailable(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(NormalizeError::Unavailable(format!("status {status}")));
        }
        let nodes: BTreeMap<String, Value> = response
            .json()
            .await
            .map_err(|err| NormalizeError::InvalidResponse(err.to_string()))?;
        Ok(nodes
            .into_iter()
            .filter_map(|(curie, node)| preferred_identifier(&node).map(|id| (curie, id)))
            .collect())
    }
}

/// Reads `id.identifier` from one normalized node entry.
fn preferred_identifier(node: &Value) -> Option<String> {
    node.pointer("/id/identifier").and_then(Value::as_str).filter(|id| !id.is_empty()).map(str::to_string)
}
