// crates/harness-runner/src/suite.rs
// ============================================================================
// Module: Suite Loader
// Description: Reads test suites from disk or the suite repository.
// Purpose: Turn a suite reference into a parsed TestSuite.
// Dependencies: harness-core, reqwest, serde_json
// ============================================================================

//! ## Overview
//! Suites are JSON documents. Local files are read directly; named suites are
//! fetched from `<base>/<repo>/main/test_suites/<name>.json`, where the base
//! defaults to GitHub's raw content host. Both paths enforce the loader's
//! size limit while reading: an oversized file is rejected from its metadata
//! and a download is abandoned as soon as its declared length or the bytes
//! received so far exceed the limit.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use harness_core::TestSuite;
use reqwest::Client;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Raw content host serving suite repositories.
pub const DEFAULT_SUITE_HOST: &str = "https://raw.githubusercontent.com";
/// Maximum suite document size in bytes.
pub const MAX_SUITE_BYTES: usize = 64 * 1024 * 1024;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Where a suite comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuiteSource {
    /// Local JSON file.
    File(PathBuf),
    /// Named suite in a repository (`owner/name`).
    Remote {
        /// Repository hosting `test_suites/`.
        repo: String,
        /// Suite name without extension.
        name: String,
    },
}

/// Suite loading failures.
#[derive(Debug, Error)]
pub enum SuiteError {
    /// Reading a local suite failed.
    #[error("suite io error: {0}")]
    Io(String),
    /// Downloading a remote suite failed.
    #[error("suite download failed: {0}")]
    Download(String),
    /// Suite exceeds the size limit (in bytes).
    #[error("suite exceeds {0} bytes")]
    TooLarge(usize),
    /// Suite JSON did not match the expected shape.
    #[error("suite parse error: {0}")]
    Parse(String),
}

// ============================================================================
// SECTION: Loader
// ============================================================================

/// Loads suites from files or a raw content host.
pub struct SuiteLoader {
    /// Raw content host without a trailing slash.
    host: String,
    /// HTTP client for remote suites.
    client: Client,
    /// Largest accepted suite document in bytes.
    max_bytes: usize,
}

impl SuiteLoader {
    /// Builds a loader against the default host.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::Download`] when the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, SuiteError> {
        Self::with_host(DEFAULT_SUITE_HOST, timeout)
    }

    /// Builds a loader against a custom host.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::Download`] when the HTTP client cannot be built.
    pub fn with_host(host: &str, timeout: Duration) -> Result<Self, SuiteError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| SuiteError::Download(err.to_string()))?;
        Ok(Self {
            host: host.trim_end_matches('/').to_string(),
            client,
            max_bytes: MAX_SUITE_BYTES,
        })
    }

    /// Overrides the suite size limit.
    #[must_use]
    pub const fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Returns the download URL for a named suite.
    #[must_use]
    pub fn suite_url(&self, repo: &str, name: &str) -> String {
        format!("{}/{repo}/main/test_suites/{name}.json", self.host)
    }

    /// Loads and parses a suite.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError`] when the suite cannot be read or parsed.
    pub async fn load(&self, source: &SuiteSource) -> Result<TestSuite, SuiteError> {
        let bytes = match source {
            SuiteSource::File(path) => self.read_file(path)?,
            SuiteSource::Remote {
                repo,
                name,
            } => self.download(repo, name).await?,
        };
        parse_suite_with_limit(&bytes, self.max_bytes)
    }

    /// Reads a local suite after checking its size.
    fn read_file(&self, path: &Path) -> Result<Vec<u8>, SuiteError> {
        let metadata = fs::metadata(path).map_err(|err| SuiteError::Io(err.to_string()))?;
        if exceeds(metadata.len(), self.max_bytes) {
            return Err(SuiteError::TooLarge(self.max_bytes));
        }
        fs::read(path).map_err(|err| SuiteError::Io(err.to_string()))
    }

    /// Fetches a named suite.
    async fn download(&self, repo: &str, name: &str) -> Result<Vec<u8>, SuiteError> {
        let mut response = self
            .client
            .get(self.suite_url(repo, name))
            .send()
            .await
            .map_err(|err| SuiteError::Download(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(SuiteError::Download(format!("status {status}")));
        }
        if response.content_length().is_some_and(|len| exceeds(len, self.max_bytes)) {
            return Err(SuiteError::TooLarge(self.max_bytes));
        }
        let mut bytes = Vec::new();
        while let Some(chunk) =
            response.chunk().await.map_err(|err| SuiteError::Download(err.to_string()))?
        {
            if bytes.len() + chunk.len() > self.max_bytes {
                return Err(SuiteError::TooLarge(self.max_bytes));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}

/// Parses a suite document.
///
/// # Errors
///
/// Returns [`SuiteError`] when the document is too large or malformed.
pub fn parse_suite(bytes: &[u8]) -> Result<TestSuite, SuiteError> {
    parse_suite_with_limit(bytes, MAX_SUITE_BYTES)
}

/// Parses a suite document under an explicit size limit.
fn parse_suite_with_limit(bytes: &[u8], max_bytes: usize) -> Result<TestSuite, SuiteError> {
    if bytes.len() > max_bytes {
        return Err(SuiteError::TooLarge(max_bytes));
    }
    serde_json::from_slice(bytes).map_err(|err| SuiteError::Parse(err.to_string()))
}

/// Returns true when a byte length is over the limit.
fn exceeds(len: u64, max_bytes: usize) -> bool {
    !usize::try_from(len).is_ok_and(|len| len <= max_bytes)
}
