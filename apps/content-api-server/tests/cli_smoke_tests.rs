#![allow(clippy::unwrap_used, clippy::expect_used)]

//! CLI smoke tests for the content-api-server binary.

use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

fn run_server(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_content-api-server"))
        .args(args)
        .env_remove("RUST_LOG")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to execute content-api-server")
}

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../modules/content-api/tests/fixtures/content.json")
}

fn write_config(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_cli_help_command() {
    let output = run_server(&["--help"]);
    assert!(output.status.success(), "Help command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage:"), "Should contain usage information");
    assert!(stdout.contains("run"), "Should contain 'run' subcommand");
    assert!(stdout.contains("check"), "Should contain 'check' subcommand");
    assert!(stdout.contains("--config"), "Should mention config option");
    assert!(stdout.contains("--fixtures"), "Should mention fixtures option");
}

#[test]
fn test_cli_version_command() {
    let output = run_server(&["--version"]);
    assert!(output.status.success(), "Version command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("content-api-server"));
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_invalid_command() {
    let output = run_server(&["frobnicate"]);
    assert!(!output.status.success(), "Invalid command should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("frobnicate"), "Should name the bad argument");
}

#[test]
fn test_cli_config_validation_missing_file() {
    let output = run_server(&["--config", "/definitely/not/here.yaml", "check"]);
    assert!(!output.status.success(), "Missing config should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("config file does not exist"),
        "Should explain the missing file: {stderr}"
    );
}

#[test]
fn test_cli_config_validation_invalid_yaml() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "server: [unclosed\n  bind_addr: nope");

    let output = run_server(&["--config", config.to_str().unwrap(), "check"]);
    assert!(!output.status.success(), "Should fail with invalid YAML");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to load configuration"), "{stderr}");
}

#[test]
fn test_cli_print_config_applies_overrides() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "content_api:\n  site: craftsite\n");

    let output = run_server(&[
        "--config",
        config.to_str().unwrap(),
        "--port",
        "9123",
        "--print-config",
    ]);
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["server"]["bind_addr"], "127.0.0.1:9123");
    assert_eq!(value["content_api"]["site"], "craftsite");
    assert_eq!(value["content_api"]["base_path"], "/api");
}

#[test]
fn test_cli_check_with_fixtures() {
    let fixtures = fixture_path();
    let output = run_server(&["--fixtures", fixtures.to_str().unwrap(), "check"]);
    assert!(
        output.status.success(),
        "Check should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Configuration is valid"));
}

#[test]
fn test_cli_check_with_missing_fixtures() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.json");
    let output = run_server(&["--fixtures", missing.to_str().unwrap(), "check"]);
    assert!(!output.status.success(), "Check should fail without fixtures");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("absent.json"), "{stderr}");
}

#[test]
fn test_cli_check_sample_config() {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..");
    let output = Command::new(env!("CARGO_BIN_EXE_content-api-server"))
        .args(["--config", "config/content-api.yaml", "check"])
        .current_dir(&root)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute content-api-server");

    assert!(
        output.status.success(),
        "Sample config should pass check: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn test_cli_check_rejects_unrooted_base_path() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "content_api:\n  base_path: api\n");

    let output = run_server(&["--config", config.to_str().unwrap(), "check"]);
    assert!(!output.status.success(), "Unrooted base_path should fail check");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("base_path"), "{stderr}");
    assert!(!stderr.contains("panicked"), "{stderr}");
}
