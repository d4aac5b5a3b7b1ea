// crates/harness-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing and config overrides.
// Purpose: Ensure command-line flags land on the right config fields.
// Dependencies: harness-cli main helpers
// ============================================================================

//! ## Overview
//! Validates flag parsing, the override merge, and suite source selection.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use clap::Parser;
use harness_config::HarnessConfig;
use harness_core::LogLevel;
use harness_runner::SuiteSource;

use super::Cli;
use super::Commands;
use super::ConfigCommand;
use super::RunCommand;
use super::apply_overrides;
use super::suite_source;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn parse_run(args: &[&str]) -> RunCommand {
    let cli = Cli::try_parse_from(std::iter::once("translator-harness").chain(args.iter().copied()))
        .expect("parse args");
    match cli.command {
        Commands::Run(command) => *command,
        Commands::Config {
            ..
        } => panic!("expected run command"),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn run_flags_override_config_fields() {
    let command = parse_run(&[
        "run",
        "--url",
        "http://127.0.0.1:9000/query",
        "--infores",
        "infores:aragorn",
        "--suite",
        "sprint_4_tests",
        "--concurrency",
        "8",
        "--timeout-ms",
        "5000",
        "--stats-json-path",
        "out/stats.json",
        "--log-level",
        "DEBUG",
    ]);
    let mut config = HarnessConfig::default();
    apply_overrides(&command, &mut config);

    assert_eq!(config.target.url.as_deref(), Some("http://127.0.0.1:9000/query"));
    assert_eq!(config.target.agent().expect("agent").as_str(), "aragorn");
    assert_eq!(config.target.concurrency, 8);
    assert_eq!(config.target.timeout_ms, 5000);
    assert_eq!(config.suite.name.as_deref(), Some("sprint_4_tests"));
    assert_eq!(config.output.stats_json_path, Some(PathBuf::from("out/stats.json")));
    assert_eq!(config.output.report_csv_path, None);
    assert_eq!(config.logging.level, LogLevel::Debug);
    assert!(config.normalizer.enabled);
    config.validate().expect("overridden config validates");
}

#[test]
fn skip_normalization_disables_normalizer() {
    let command = parse_run(&["run", "--skip-normalization"]);
    let mut config = HarnessConfig::default();
    apply_overrides(&command, &mut config);
    assert!(!config.normalizer.enabled);
}

#[test]
fn absent_flags_keep_config_values() {
    let command = parse_run(&["run"]);
    let mut config = HarnessConfig::from_toml_str(
        r#"
[target]
url = "http://agent.example/query"
concurrency = 4
"#,
    )
    .expect("config");
    apply_overrides(&command, &mut config);
    assert_eq!(config.target.url.as_deref(), Some("http://agent.example/query"));
    assert_eq!(config.target.concurrency, 4);
}

#[test]
fn warn_alias_maps_to_warning() {
    let command = parse_run(&["run", "--log-level", "warn"]);
    let mut config = HarnessConfig::default();
    apply_overrides(&command, &mut config);
    assert_eq!(config.logging.level, LogLevel::Warning);
}

#[test]
fn suite_file_takes_precedence_over_name() {
    let command = parse_run(&["run", "--suite", "sprint_4_tests", "--suite-file", "local.json"]);
    let mut config = HarnessConfig::default();
    apply_overrides(&command, &mut config);
    let source = suite_source(&config).expect("source");
    assert_eq!(source, SuiteSource::File(PathBuf::from("local.json")));
}

#[test]
fn suite_name_uses_configured_repo() {
    let command = parse_run(&["run", "--suite", "smoke", "--test-repo", "acme/suites"]);
    let mut config = HarnessConfig::default();
    apply_overrides(&command, &mut config);
    let source = suite_source(&config).expect("source");
    assert_eq!(
        source,
        SuiteSource::Remote {
            repo: "acme/suites".to_string(),
            name: "smoke".to_string(),
        }
    );
}

#[test]
fn missing_suite_is_an_error() {
    let config = HarnessConfig::default();
    let err = suite_source(&config).expect_err("no suite configured");
    assert!(err.to_string().contains("no suite selected"));
}

#[test]
fn config_validate_parses() {
    let cli = Cli::try_parse_from(["translator-harness", "config", "validate", "--config", "a.toml"])
        .expect("parse args");
    match cli.command {
        Commands::Config {
            command: ConfigCommand::Validate(command),
        } => assert_eq!(command.config, Some(PathBuf::from("a.toml"))),
        Commands::Run(_) => panic!("expected config command"),
    }
}

#[test]
fn unknown_log_level_is_rejected() {
    let result = Cli::try_parse_from(["translator-harness", "run", "--log-level", "loud"]);
    assert!(result.is_err());
}
