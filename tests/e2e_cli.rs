//! CLI end-to-end tests
//!
//! Tests for the tubecast command-line interface.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the tubecast binary
#[allow(deprecated)]
fn tubecast_cmd() -> Command {
    let mut cmd = Command::cargo_bin("tubecast").unwrap();
    // Keep the test environment from leaking in.
    cmd.env_remove("TUBECAST_CONFIG");
    cmd.env_remove("COOKIES_FILE");
    cmd
}

#[test]
fn no_args_shows_usage() {
    let mut cmd = tubecast_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn help_flag() {
    let mut cmd = tubecast_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("tubecast"))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn version_flag() {
    let mut cmd = tubecast_cmd();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tubecast"));
}

#[test]
fn start_help_describes_server() {
    let mut cmd = tubecast_cmd();
    cmd.args(["start", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Start the streaming server"));
}

#[test]
fn check_tools_lists_required_tools() {
    let mut cmd = tubecast_cmd();
    cmd.arg("check-tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("yt-dlp"))
        .stdout(predicate::str::contains("ffmpeg"));
}

#[test]
fn validate_without_config_uses_defaults() {
    let mut cmd = tubecast_cmd();
    cmd.arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("using defaults"));
}

#[test]
fn validate_accepts_a_config_file() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.json");
    fs::write(
        &config_path,
        format!(
            r#"{{
                "cache": {{"dir": "{}"}},
                "channels": [
                    {{"name": "alpha", "url": "https://www.youtube.com/@alpha/videos"}}
                ]
            }}"#,
            dir.path().join("cache").display()
        ),
    )
    .unwrap();

    let mut cmd = tubecast_cmd();
    cmd.arg("validate")
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("alpha"));
}

#[test]
fn validate_rejects_malformed_json() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.json");
    fs::write(&config_path, "{not json").unwrap();

    let mut cmd = tubecast_cmd();
    cmd.arg("validate").arg(&config_path).assert().failure();
}

#[test]
fn validate_fails_for_missing_file() {
    let mut cmd = tubecast_cmd();
    cmd.args(["validate", "/nonexistent/config.json"])
        .assert()
        .failure();
}

#[test]
fn fetch_unknown_channel_fails() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.json");
    fs::write(
        &config_path,
        format!(
            r#"{{
                "cache": {{"dir": "{}"}},
                "channels": [
                    {{"name": "alpha", "url": "https://www.youtube.com/@alpha/videos"}}
                ]
            }}"#,
            dir.path().join("cache").display()
        ),
    )
    .unwrap();

    let mut cmd = tubecast_cmd();
    cmd.args(["--config"])
        .arg(&config_path)
        .args(["fetch", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not configured"));
}

#[test]
fn fetch_rejects_invalid_channel_name() {
    let mut cmd = tubecast_cmd();
    cmd.args(["fetch", "Not A Channel"]).assert().failure();
}
