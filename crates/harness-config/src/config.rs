// crates/harness-config/src/config.rs
// ============================================================================
// Module: Translator Harness Configuration
// Description: Configuration loading and validation for the harness.
// Purpose: Provide strict config parsing with hard limits and sane defaults.
// Dependencies: harness-core, serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The file is optional: when no path is given, the environment does not name
//! one, and the default file is absent, every section takes its defaults and
//! the CLI supplies the rest. Validation runs on every successful load and
//! again after command-line overrides are applied.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use harness_core::AgentId;
use harness_core::LogLevel;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "translator-harness.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "TRANSLATOR_HARNESS_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default number of in-flight queries per test case.
pub const DEFAULT_CONCURRENCY: usize = 1;
/// Maximum number of in-flight queries per test case.
pub const MAX_CONCURRENCY: usize = 256;
/// Default per-query timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 600_000;
/// Minimum per-request timeout in milliseconds.
pub const MIN_TIMEOUT_MS: u64 = 1_000;
/// Maximum per-request timeout in milliseconds.
pub const MAX_TIMEOUT_MS: u64 = 3_600_000;
/// Default normalizer request timeout in milliseconds.
pub const DEFAULT_NORMALIZER_TIMEOUT_MS: u64 = 30_000;
/// Default infores CURIE of the target agent.
pub const DEFAULT_INFORES: &str = "infores:biothings-explorer";
/// Default node normalizer base URL.
pub const DEFAULT_NORMALIZER_URL: &str = "https://nodenorm.transltr.io";
/// Default repository hosting test suites.
pub const DEFAULT_TEST_REPO: &str = "NCATSTranslator/Tests";

// ============================================================================
// SECTION: Config Types
// ============================================================================

/// Top-level harness configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HarnessConfig {
    /// Target agent settings.
    #[serde(default)]
    pub target: TargetConfig,
    /// Identifier normalization settings.
    #[serde(default)]
    pub normalizer: NormalizerConfig,
    /// Suite source settings.
    #[serde(default)]
    pub suite: SuiteConfig,
    /// Artifact output settings.
    #[serde(default)]
    pub output: OutputConfig,
    /// Run log settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl HarnessConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails. A missing
    /// default file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved.path)?;
        if !resolved.explicit && !resolved.path.exists() {
            return Ok(Self::default());
        }
        let bytes = fs::read(&resolved.path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.target.validate()?;
        self.normalizer.validate()?;
        self.suite.validate()?;
        self.output.validate()?;
        self.logging.validate()
    }
}

/// Target agent configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    /// Endpoint receiving TRAPI queries.
    #[serde(default)]
    pub url: Option<String>,
    /// Infores CURIE naming the agent.
    #[serde(default = "default_infores")]
    pub infores: String,
    /// Maximum in-flight queries per test case.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Per-query timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            url: None,
            infores: default_infores(),
            concurrency: DEFAULT_CONCURRENCY,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl TargetConfig {
    /// Returns the parsed target URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when no URL is configured or it does
    /// not parse as an http(s) URL.
    pub fn endpoint(&self) -> Result<Url, ConfigError> {
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| ConfigError::Invalid("target.url must be set".to_string()))?;
        parse_http_url("target.url", url)
    }

    /// Returns the agent identifier derived from the infores CURIE.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the infores label is empty.
    pub fn agent(&self) -> Result<AgentId, ConfigError> {
        AgentId::from_infores(&self.infores).ok_or_else(|| {
            ConfigError::Invalid("target.infores must name an agent".to_string())
        })
    }

    /// Returns the per-query timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validates target configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.url {
            parse_http_url("target.url", url)?;
        }
        self.agent()?;
        if !(1 ..= MAX_CONCURRENCY).contains(&self.concurrency) {
            return Err(ConfigError::Invalid(format!(
                "target.concurrency must be between 1 and {MAX_CONCURRENCY}"
            )));
        }
        validate_timeout("target.timeout_ms", self.timeout_ms)
    }
}

/// Identifier normalization configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NormalizerConfig {
    /// Whether identifiers are normalized before query construction.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Node normalizer base URL.
    #[serde(default = "default_normalizer_url")]
    pub url: String,
    /// Normalizer request timeout in milliseconds.
    #[serde(default = "default_normalizer_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: default_normalizer_url(),
            timeout_ms: DEFAULT_NORMALIZER_TIMEOUT_MS,
        }
    }
}

impl NormalizerConfig {
    /// Returns the parsed normalizer base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the URL is not http(s).
    pub fn endpoint(&self) -> Result<Url, ConfigError> {
        parse_http_url("normalizer.url", &self.url)
    }

    /// Returns the normalizer request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validates normalizer configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }
        self.endpoint()?;
        validate_timeout("normalizer.timeout_ms", self.timeout_ms)
    }
}

/// Suite source configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SuiteConfig {
    /// Suite name under `test_suites/` in the test repository.
    #[serde(default)]
    pub name: Option<String>,
    /// Local suite file; takes precedence over `name`.
    #[serde(default)]
    pub file: Option<PathBuf>,
    /// Repository (`owner/name`) hosting the suites.
    #[serde(default = "default_test_repo")]
    pub test_repo: String,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            name: None,
            file: None,
            test_repo: default_test_repo(),
        }
    }
}

impl SuiteConfig {
    /// Validates suite configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(name) = &self.name {
            let trimmed = name.trim();
            if trimmed.is_empty() || trimmed.contains(['/', '\\']) {
                return Err(ConfigError::Invalid(
                    "suite.name must be a non-empty name without separators".to_string(),
                ));
            }
        }
        if let Some(file) = &self.file {
            validate_path_string("suite.file", &file.to_string_lossy())?;
        }
        let mut parts = self.test_repo.split('/');
        let well_formed = matches!(
            (parts.next(), parts.next(), parts.next()),
            (Some(owner), Some(repo), None) if !owner.is_empty() && !repo.is_empty()
        );
        if !well_formed {
            return Err(ConfigError::Invalid("suite.test_repo must be owner/name".to_string()));
        }
        Ok(())
    }
}

/// Artifact output configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Run summary JSON path.
    #[serde(default)]
    pub output_json_path: Option<PathBuf>,
    /// Statistics table JSON path.
    #[serde(default)]
    pub stats_json_path: Option<PathBuf>,
    /// Flat report CSV path.
    #[serde(default)]
    pub report_csv_path: Option<PathBuf>,
}

impl OutputConfig {
    /// Validates output configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        for (field, path) in [
            ("output.output_json_path", &self.output_json_path),
            ("output.stats_json_path", &self.stats_json_path),
            ("output.report_csv_path", &self.report_csv_path),
        ] {
            if let Some(path) = path {
                validate_path_string(field, &path.to_string_lossy())?;
            }
        }
        Ok(())
    }
}

/// Run log configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Most verbose level emitted.
    #[serde(default)]
    pub level: LogLevel,
    /// Optional JSON-lines log file; stderr when unset.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    /// Validates logging configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match &self.file {
            Some(file) => validate_path_string("logging.file", &file.to_string_lossy()),
            None => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Config path and whether the caller named it.
struct ResolvedPath {
    /// Path to read.
    path: PathBuf,
    /// True when the path came from the CLI or the environment.
    explicit: bool,
}

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<ResolvedPath, ConfigError> {
    if let Some(path) = path {
        return Ok(ResolvedPath {
            path: path.to_path_buf(),
            explicit: true,
        });
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(ResolvedPath {
            path: PathBuf::from(env_path),
            explicit: true,
        });
    }
    Ok(ResolvedPath {
        path: PathBuf::from(DEFAULT_CONFIG_NAME),
        explicit: false,
    })
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Parses an http(s) URL.
fn parse_http_url(field: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|err| ConfigError::Invalid(format!("{field} is not a valid url: {err}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ConfigError::Invalid(format!("{field} has unsupported scheme {scheme}"))),
    }
}

/// Validates a timeout against the shared bounds.
fn validate_timeout(field: &str, timeout_ms: u64) -> Result<(), ConfigError> {
    if (MIN_TIMEOUT_MS ..= MAX_TIMEOUT_MS).contains(&timeout_ms) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{field} must be between {MIN_TIMEOUT_MS} and {MAX_TIMEOUT_MS}"
        )))
    }
}

/// Default infores for serde.
fn default_infores() -> String {
    DEFAULT_INFORES.to_string()
}

/// Default concurrency for serde.
const fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

/// Default target timeout for serde.
const fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Default normalizer URL for serde.
fn default_normalizer_url() -> String {
    DEFAULT_NORMALIZER_URL.to_string()
}

/// Default normalizer timeout for serde.
const fn default_normalizer_timeout_ms() -> u64 {
    DEFAULT_NORMALIZER_TIMEOUT_MS
}

/// Default test repository for serde.
fn default_test_repo() -> String {
    DEFAULT_TEST_REPO.to_string()
}

/// Serde default helper for enabled flags.
const fn default_true() -> bool {
    true
}
