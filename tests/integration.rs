//! Binary-level tests for the fatal error tier: configuration problems,
//! exhausted connectivity, and an unreachable browser must all abort the
//! run with a non-zero exit. Nothing here needs a real Chrome or a real
//! portal — the HTTP boundary is served by wiremock.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn clh_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("clh");
    path
}

fn write_config(root: &Path, probe_url: &str, endpoint: &str, max_attempts: u32) -> PathBuf {
    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[connectivity]
probe_url = "{probe_url}"
timeout_secs = 2
interval_secs = 0
max_attempts = {max_attempts}

[browser]
endpoint = "{endpoint}"
download_dir = "{root}/downloads"
nav_timeout_secs = 2

[output]
records = "{root}/records.json"

[portals.shc]
kind = "sindh-high-court"
"#,
        probe_url = probe_url,
        endpoint = endpoint,
        max_attempts = max_attempts,
        root = root.display(),
    );

    let config_path = config_dir.join("clh.toml");
    fs::write(&config_path, config_content).unwrap();
    config_path
}

fn run_clh(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = clh_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run clh binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("does-not-exist.toml");

    let (_, stderr, success) = run_clh(&config_path, &["sources"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"), "got: {}", stderr);
}

#[test]
fn unknown_portal_kind_fails() {
    let tmp = TempDir::new().unwrap();
    let config_dir = tmp.path().join("config");
    fs::create_dir_all(&config_dir).unwrap();
    let config_path = config_dir.join("clh.toml");
    fs::write(
        &config_path,
        r#"[output]
records = "records.json"

[portals.x]
kind = "imaginary-court"
"#,
    )
    .unwrap();

    let (_, stderr, success) = run_clh(&config_path, &["sources"]);
    assert!(!success);
    assert!(stderr.contains("Unknown portal kind"), "got: {}", stderr);
}

#[test]
fn unknown_portal_name_fails() {
    let tmp = TempDir::new().unwrap();
    let config_path = write_config(tmp.path(), "http://127.0.0.1:1", "http://127.0.0.1:1", 1);

    let (_, stderr, success) = run_clh(&config_path, &["harvest", "nope"]);
    assert!(!success);
    assert!(stderr.contains("Unknown portal"), "got: {}", stderr);
}

#[tokio::test]
async fn exhausted_connectivity_probe_aborts_harvest() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let config_path = write_config(tmp.path(), &server.uri(), "http://127.0.0.1:1", 3);

    let (stdout, stderr, success) =
        tokio::task::spawn_blocking(move || run_clh(&config_path, &["harvest", "shc"]))
            .await
            .unwrap();
    assert!(!success, "stdout={}, stderr={}", stdout, stderr);
    assert!(stderr.contains("after 3 attempts"), "got: {}", stderr);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
    // Nothing was harvested.
    assert!(!tmp.path().join("records.json").exists());
}

#[tokio::test]
async fn unreachable_browser_aborts_harvest() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    // Probe succeeds; the CDP endpoint does not exist.
    let config_path = write_config(tmp.path(), &server.uri(), "http://127.0.0.1:1", 1);

    let (stdout, stderr, success) =
        tokio::task::spawn_blocking(move || run_clh(&config_path, &["harvest", "shc"]))
            .await
            .unwrap();
    assert!(!success, "stdout={}, stderr={}", stdout, stderr);
    assert!(
        stderr.contains("Failed to start browser session"),
        "got: {}",
        stderr
    );
    assert!(!tmp.path().join("records.json").exists());
}

#[tokio::test]
async fn sources_reports_portal_health() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let config_dir = tmp.path().join("config");
    fs::create_dir_all(&config_dir).unwrap();
    let config_path = config_dir.join("clh.toml");
    fs::write(
        &config_path,
        format!(
            r#"[output]
records = "records.json"

[portals.shc]
kind = "sindh-high-court"
url = "{}"
"#,
            server.uri()
        ),
    )
    .unwrap();

    let (stdout, stderr, success) =
        tokio::task::spawn_blocking(move || run_clh(&config_path, &["sources"]))
            .await
            .unwrap();
    assert!(success, "stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("shc"));
    assert!(stdout.contains("Sindh High Court"));
    assert!(stdout.contains("OK"), "got: {}", stdout);
}
