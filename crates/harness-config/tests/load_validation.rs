//! Config load validation tests for harness-config.
// crates/harness-config/tests/load_validation.rs
// =============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards (path, size, encoding).
// Purpose: Ensure config input handling is strict.
// =============================================================================

use std::io::Write;
use std::path::Path;

use harness_config::ConfigError;
use harness_config::DEFAULT_TIMEOUT_MS;
use harness_config::HarnessConfig;
use harness_core::LogLevel;
use tempfile::NamedTempFile;

type TestResult = Result<(), String>;

fn assert_invalid(result: Result<HarnessConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config load".to_string()),
    }
}

fn write_config(content: &str) -> Result<NamedTempFile, String> {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(content.as_bytes()).map_err(|err| err.to_string())?;
    Ok(file)
}

#[test]
fn load_rejects_path_too_long() -> TestResult {
    let long_path = "a".repeat(5_000);
    let path = Path::new(&long_path);
    assert_invalid(HarnessConfig::load(Some(path)), "config path exceeds max length")?;
    Ok(())
}

#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    let path = Path::new(&long_component);
    assert_invalid(HarnessConfig::load(Some(path)), "config path component too long")?;
    Ok(())
}

#[test]
fn load_rejects_missing_explicit_file() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("absent.toml");
    assert_invalid(HarnessConfig::load(Some(&path)), "config io error")?;
    Ok(())
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    let payload = vec![b'#'; 1_048_577];
    file.write_all(&payload).map_err(|err| err.to_string())?;
    assert_invalid(HarnessConfig::load(Some(file.path())), "config file exceeds size limit")?;
    Ok(())
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(&[0xFF, 0xFE, 0xFF]).map_err(|err| err.to_string())?;
    assert_invalid(HarnessConfig::load(Some(file.path())), "config file must be utf-8")?;
    Ok(())
}

#[test]
fn load_rejects_malformed_toml() -> TestResult {
    let file = write_config("[target\nurl = 1")?;
    assert_invalid(HarnessConfig::load(Some(file.path())), "config parse error")?;
    Ok(())
}

#[test]
fn load_reads_every_section() -> TestResult {
    let file = write_config(
        r#"
[target]
url = "https://bte.example.org/v1/query"
infores = "infores:aragorn"
concurrency = 8
timeout_ms = 120000

[normalizer]
enabled = false

[suite]
name = "sprint_4_tests"
test_repo = "example/Tests"

[output]
stats_json_path = "out/stats.json"
report_csv_path = "out/report.csv"

[logging]
level = "debug"
"#,
    )?;
    let config = HarnessConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    let agent = config.target.agent().map_err(|err| err.to_string())?;
    if agent.as_str() != "aragorn" {
        return Err(format!("unexpected agent {agent}"));
    }
    if config.target.concurrency != 8 || config.target.timeout().as_secs() != 120 {
        return Err("target limits not loaded".to_string());
    }
    if config.normalizer.enabled || config.logging.level != LogLevel::Debug {
        return Err("normalizer or logging section not loaded".to_string());
    }
    if config.suite.name.as_deref() != Some("sprint_4_tests") || config.output.output_json_path.is_some()
    {
        return Err("suite or output section not loaded".to_string());
    }
    Ok(())
}

#[test]
fn empty_file_uses_defaults() -> TestResult {
    let file = write_config("")?;
    let config = HarnessConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    if config.target.url.is_some() || config.target.concurrency != 1 {
        return Err("unexpected target defaults".to_string());
    }
    if config.target.timeout_ms != DEFAULT_TIMEOUT_MS || config.logging.level != LogLevel::Warning {
        return Err("unexpected timeout or log defaults".to_string());
    }
    if config.suite.test_repo != "NCATSTranslator/Tests" {
        return Err("unexpected test repo default".to_string());
    }
    let agent = config.target.agent().map_err(|err| err.to_string())?;
    if agent.as_str() != "biothings-explorer" {
        return Err(format!("unexpected default agent {agent}"));
    }
    Ok(())
}
