// crates/harness-cli/src/main.rs
// ============================================================================
// Module: Translator Harness CLI Entry Point
// Description: Command dispatcher for acceptance test runs and config checks.
// Purpose: Wire configuration, suite loading, and the runner into one command.
// Dependencies: clap, harness-config, harness-core, harness-runner, tokio
// ============================================================================

//! ## Overview
//! `translator-harness run` loads configuration, applies command-line
//! overrides, fetches the suite, and drives it through the runner on a
//! single-threaded runtime. Statistics and the CSV report are checkpointed
//! after every test case; the run summary is written once at the end and
//! echoed to stdout. `translator-harness config validate` checks a config file
//! without running anything.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use harness_cli::FileReportSink;
use harness_cli::open_log_sink;
use harness_cli::write_summary;
use harness_config::ConfigError;
use harness_config::HarnessConfig;
use harness_core::IdentityNormalizer;
use harness_core::LogContext;
use harness_core::LogLevel;
use harness_core::Normalizer;
use harness_core::RankClassifier;
use harness_core::RunLogger;
use harness_runner::DispatchTarget;
use harness_runner::NodeNormalizer;
use harness_runner::QueryDispatcher;
use harness_runner::SuiteLoader;
use harness_runner::SuiteSource;
use harness_runner::TestRunner;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Timeout for downloading a suite document.
const SUITE_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "translator-harness", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run an acceptance test suite against an agent.
    Run(Box<RunCommand>),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a harness configuration file.
    Validate(ConfigValidateCommand),
}

/// Arguments for config validation.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path (defaults to translator-harness.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for a suite run; every flag overrides its config field.
#[derive(Args, Debug)]
struct RunCommand {
    /// Optional config file path (defaults to translator-harness.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// URL of the agent to run tests against.
    #[arg(long, value_name = "URL")]
    url: Option<String>,
    /// Infores CURIE of the agent.
    #[arg(long, value_name = "CURIE")]
    infores: Option<String>,
    /// Suite name under `test_suites/` of the test repository.
    #[arg(long, value_name = "NAME")]
    suite: Option<String>,
    /// Local suite file; takes precedence over `--suite`.
    #[arg(long, value_name = "PATH")]
    suite_file: Option<PathBuf>,
    /// Repository (`owner/name`) hosting the suites.
    #[arg(long, value_name = "REPO")]
    test_repo: Option<String>,
    /// Maximum in-flight queries.
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,
    /// Per-query timeout in milliseconds.
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,
    /// Node normalizer base URL.
    #[arg(long, value_name = "URL")]
    normalizer_url: Option<String>,
    /// Use identifiers exactly as written in the suite.
    #[arg(long, action = ArgAction::SetTrue)]
    skip_normalization: bool,
    /// Path for the run summary JSON.
    #[arg(long, value_name = "PATH")]
    output_json_path: Option<PathBuf>,
    /// Path for the statistics JSON.
    #[arg(long, value_name = "PATH")]
    stats_json_path: Option<PathBuf>,
    /// Path for the CSV report.
    #[arg(long, value_name = "PATH")]
    report_csv_path: Option<PathBuf>,
    /// Most verbose log level to emit.
    #[arg(long, value_enum, ignore_case = true, value_name = "LEVEL")]
    log_level: Option<LogLevelArg>,
    /// Append JSON-line logs to this file instead of stderr.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

/// Log level selection.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LogLevelArg {
    /// Errors only.
    Error,
    /// Errors and warnings.
    #[value(alias = "warn")]
    Warning,
    /// Progress messages.
    Info,
    /// Per-query detail.
    Debug,
}

impl From<LogLevelArg> for LogLevel {
    fn from(value: LogLevelArg) -> Self {
        match value {
            LogLevelArg::Error => Self::Error,
            LogLevelArg::Warning => Self::Warning,
            LogLevelArg::Info => Self::Info,
            LogLevelArg::Debug => Self::Debug,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

/// Wraps a configuration error.
fn config_error(err: &ConfigError) -> CliError {
    CliError::new(format!("configuration error: {err}"))
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(command) => command_run(&command).await,
        Commands::Config {
            command,
        } => match command {
            ConfigCommand::Validate(command) => command_config_validate(&command),
        },
    }
}

// ============================================================================
// SECTION: Config Command
// ============================================================================

/// Executes the config validation command.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let _config = HarnessConfig::load(command.config.as_deref()).map_err(|err| config_error(&err))?;
    write_stdout_line("configuration is valid")
        .map_err(|err| CliError::new(format!("failed to write stdout: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Run Command
// ============================================================================

/// Executes a suite run.
async fn command_run(command: &RunCommand) -> CliResult<ExitCode> {
    let mut config = HarnessConfig::load(command.config.as_deref()).map_err(|err| config_error(&err))?;
    apply_overrides(command, &mut config);
    config.validate().map_err(|err| config_error(&err))?;
    let endpoint = config.target.endpoint().map_err(|err| config_error(&err))?;
    let agent = config.target.agent().map_err(|err| config_error(&err))?;
    let source = suite_source(&config)?;

    let sink = open_log_sink(&config.logging)
        .map_err(|err| CliError::new(format!("failed to open log file: {err}")))?;
    let logger = RunLogger::with_random_run_id(sink);

    let loader = SuiteLoader::new(SUITE_DOWNLOAD_TIMEOUT)
        .map_err(|err| CliError::new(format!("failed to load suite: {err}")))?;
    let suite = loader
        .load(&source)
        .await
        .map_err(|err| CliError::new(format!("failed to load suite: {err}")))?;
    if suite.test_cases.is_empty() {
        logger.warn(LogContext::default(), "no tests to run, exiting");
        return Ok(ExitCode::SUCCESS);
    }

    let target = DispatchTarget {
        url: endpoint,
        agent,
        timeout: config.target.timeout(),
        concurrency: config.target.concurrency,
    };
    let dispatcher = QueryDispatcher::new(target, logger.clone())
        .map_err(|err| CliError::new(format!("failed to start dispatcher: {err}")))?;
    let normalizer: Arc<dyn Normalizer> = if config.normalizer.enabled {
        let base = config.normalizer.endpoint().map_err(|err| config_error(&err))?;
        Arc::new(
            NodeNormalizer::new(&base, config.normalizer.timeout())
                .map_err(|err| CliError::new(format!("failed to start normalizer: {err}")))?,
        )
    } else {
        Arc::new(IdentityNormalizer)
    };
    let report_sink = Arc::new(FileReportSink::new(
        config.output.stats_json_path.clone(),
        config.output.report_csv_path.clone(),
    ));
    let runner = TestRunner::new(
        dispatcher,
        normalizer,
        Arc::new(RankClassifier::default()),
        report_sink,
        logger.clone(),
    );

    let outcome = runner.run(&suite).await;
    logger.info(LogContext::default(), "finishing up test run");
    if let Some(path) = &config.output.output_json_path {
        write_summary(path, &outcome.summary)
            .map_err(|err| CliError::new(format!("failed to write summary: {err}")))?;
    }
    let line = serde_json::to_string(&outcome.summary)
        .map_err(|err| CliError::new(format!("failed to render summary: {err}")))?;
    write_stdout_line(&line).map_err(|err| CliError::new(format!("failed to write stdout: {err}")))?;
    logger.info(LogContext::default(), "all tests have completed");
    Ok(ExitCode::SUCCESS)
}

/// Applies command-line overrides on top of file configuration.
fn apply_overrides(command: &RunCommand, config: &mut HarnessConfig) {
    if let Some(url) = &command.url {
        config.target.url = Some(url.clone());
    }
    if let Some(infores) = &command.infores {
        config.target.infores.clone_from(infores);
    }
    if let Some(concurrency) = command.concurrency {
        config.target.concurrency = concurrency;
    }
    if let Some(timeout_ms) = command.timeout_ms {
        config.target.timeout_ms = timeout_ms;
    }
    if let Some(suite) = &command.suite {
        config.suite.name = Some(suite.clone());
    }
    if let Some(file) = &command.suite_file {
        config.suite.file = Some(file.clone());
    }
    if let Some(repo) = &command.test_repo {
        config.suite.test_repo.clone_from(repo);
    }
    if let Some(url) = &command.normalizer_url {
        config.normalizer.url.clone_from(url);
    }
    if command.skip_normalization {
        config.normalizer.enabled = false;
    }
    for (target, value) in [
        (&mut config.output.output_json_path, &command.output_json_path),
        (&mut config.output.stats_json_path, &command.stats_json_path),
        (&mut config.output.report_csv_path, &command.report_csv_path),
        (&mut config.logging.file, &command.log_file),
    ] {
        if let Some(path) = value {
            *target = Some(path.clone());
        }
    }
    if let Some(level) = command.log_level {
        config.logging.level = level.into();
    }
}

/// Picks the suite source, preferring a local file.
fn suite_source(config: &HarnessConfig) -> CliResult<SuiteSource> {
    if let Some(file) = &config.suite.file {
        return Ok(SuiteSource::File(file.clone()));
    }
    config
        .suite
        .name
        .as_ref()
        .map(|name| SuiteSource::Remote {
            repo: config.suite.test_repo.clone(),
            name: name.clone(),
        })
        .ok_or_else(|| CliError::new("no suite selected: pass --suite or --suite-file".to_string()))
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
