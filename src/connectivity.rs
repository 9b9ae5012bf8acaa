//! Startup reachability gate.
//!
//! The harness refuses to start a browser run while the network is down:
//! a bounded-timeout probe is retried at a fixed interval, and exhausting
//! the attempt budget aborts the whole run.

use anyhow::{bail, Result};
use std::time::Duration;
use tracing::{info, warn};

use crate::config::ConnectivityConfig;

/// Block until `probe_url` answers with a 2xx status, or fail after
/// `max_attempts` probes. Each probe is bounded by `timeout_secs`; failed
/// attempts are separated by `interval_secs`.
pub async fn ensure_connectivity(cfg: &ConnectivityConfig) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(cfg.timeout_secs))
        .build()?;

    for attempt in 1..=cfg.max_attempts {
        match client.get(&cfg.probe_url).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!("Internet is reachable ({})", cfg.probe_url);
                return Ok(());
            }
            Ok(resp) => {
                warn!(
                    "Connectivity probe returned {} ({}/{})",
                    resp.status(),
                    attempt,
                    cfg.max_attempts
                );
            }
            Err(e) => {
                warn!(
                    "Connectivity probe failed: {} ({}/{})",
                    e, attempt, cfg.max_attempts
                );
            }
        }
        if attempt < cfg.max_attempts {
            tokio::time::sleep(Duration::from_secs(cfg.interval_secs)).await;
        }
    }

    bail!(
        "Internet connection could not be established after {} attempts",
        cfg.max_attempts
    )
}
