use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub connectivity: ConnectivityConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub portals: BTreeMap<String, PortalConfig>,
}

/// Startup reachability probe settings.
#[derive(Debug, Deserialize, Clone)]
pub struct ConnectivityConfig {
    #[serde(default = "default_probe_url")]
    pub probe_url: String,
    #[serde(default = "default_probe_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_probe_interval")]
    pub interval_secs: u64,
    #[serde(default = "default_probe_attempts")]
    pub max_attempts: u32,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            probe_url: default_probe_url(),
            timeout_secs: default_probe_timeout(),
            interval_secs: default_probe_interval(),
            max_attempts: default_probe_attempts(),
        }
    }
}

fn default_probe_url() -> String {
    "http://www.google.com".to_string()
}
fn default_probe_timeout() -> u64 {
    5
}
fn default_probe_interval() -> u64 {
    10
}
fn default_probe_attempts() -> u32 {
    10
}

/// Browser session settings.
///
/// The harness attaches to a Chrome instance already running with
/// `--remote-debugging-port`; it does not launch one.
#[derive(Debug, Deserialize, Clone)]
pub struct BrowserConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
    /// Bounded wait applied to every element/list readiness check.
    #[serde(default = "default_nav_timeout")]
    pub nav_timeout_secs: u64,
    /// Extra pause after the case list becomes present, for late
    /// client-side rendering.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            download_dir: default_download_dir(),
            nav_timeout_secs: default_nav_timeout(),
            settle_ms: default_settle_ms(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:9222".to_string()
}
fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}
fn default_nav_timeout() -> u64 {
    20
}
fn default_settle_ms() -> u64 {
    500
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    /// Path of the persisted JSON array of case records. One growing file
    /// per run target; rewritten in full on every appended record.
    pub records: PathBuf,
}

/// One configured court portal.
#[derive(Debug, Deserialize, Clone)]
pub struct PortalConfig {
    /// Portal layout kind, e.g. `sindh-high-court`.
    pub kind: String,
    /// Optional override of the layout's built-in list URL.
    #[serde(default)]
    pub url: Option<String>,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.connectivity.max_attempts == 0 {
        anyhow::bail!("connectivity.max_attempts must be >= 1");
    }
    if config.connectivity.timeout_secs == 0 {
        anyhow::bail!("connectivity.timeout_secs must be >= 1");
    }
    if config.browser.nav_timeout_secs == 0 {
        anyhow::bail!("browser.nav_timeout_secs must be >= 1");
    }
    if config.portals.is_empty() {
        anyhow::bail!("no portals configured; add at least one [portals.<name>] entry");
    }
    for (name, portal) in &config.portals {
        if !crate::portal::KNOWN_KINDS.contains(&portal.kind.as_str()) {
            anyhow::bail!(
                "Unknown portal kind '{}' for portal '{}'. Available: {}",
                portal.kind,
                name,
                crate::portal::KNOWN_KINDS.join(", ")
            );
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn minimal_config_gets_defaults() {
        let f = write_config(
            r#"
[output]
records = "SindhHighCourt.json"

[portals.shc]
kind = "sindh-high-court"
"#,
        );
        let cfg = load_config(f.path()).unwrap();
        assert_eq!(cfg.connectivity.max_attempts, 10);
        assert_eq!(cfg.connectivity.interval_secs, 10);
        assert_eq!(cfg.browser.endpoint, "http://localhost:9222");
        assert_eq!(cfg.browser.nav_timeout_secs, 20);
        assert_eq!(cfg.output.records, PathBuf::from("SindhHighCourt.json"));
        assert!(cfg.portals.contains_key("shc"));
    }

    #[test]
    fn rejects_unknown_portal_kind() {
        let f = write_config(
            r#"
[output]
records = "out.json"

[portals.x]
kind = "made-up-court"
"#,
        );
        let err = load_config(f.path()).unwrap_err().to_string();
        assert!(err.contains("Unknown portal kind"), "got: {}", err);
    }

    #[test]
    fn rejects_empty_portal_table() {
        let f = write_config(
            r#"
[output]
records = "out.json"
"#,
        );
        let err = load_config(f.path()).unwrap_err().to_string();
        assert!(err.contains("no portals configured"), "got: {}", err);
    }

    #[test]
    fn rejects_zero_attempts() {
        let f = write_config(
            r#"
[connectivity]
max_attempts = 0

[output]
records = "out.json"

[portals.shc]
kind = "sindh-high-court"
"#,
        );
        assert!(load_config(f.path()).is_err());
    }
}
