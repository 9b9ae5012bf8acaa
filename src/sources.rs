//! Portal listing and health checks for `clh sources`.

use anyhow::Result;
use std::time::Duration;

use crate::config::Config;
use crate::harvest::resolve_portals;

pub async fn list_sources(config: &Config) -> Result<()> {
    let registry = resolve_portals(config)?;
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    println!("{:<12} {:<20} {:<52} STATUS", "PORTAL", "COURT", "URL");
    for portal in registry.portals() {
        let status = match portal.health(&client).await {
            Ok(()) => "OK".to_string(),
            Err(e) => format!("UNREACHABLE ({})", e),
        };
        println!(
            "{:<12} {:<20} {:<52} {}",
            portal.name(),
            portal.court(),
            portal.url(),
            status
        );
    }

    Ok(())
}
