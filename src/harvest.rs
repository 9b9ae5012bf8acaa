//! Harvest pipeline orchestration.
//!
//! Coordinates the full run: connectivity gate → browser session → portal
//! navigation → row loop → summary. The browser session is owned here for
//! the run's duration and released on every exit path. Per-row failures
//! never abort the run; they are logged, recorded as outcomes, and the
//! loop moves on to the next row.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::browser::{CdpClient, PageSession};
use crate::config::Config;
use crate::connectivity::ensure_connectivity;
use crate::fetch::{fetch, filename_from_url};
use crate::models::{CaseRecord, HarvestReport, RowOutcome};
use crate::portal::{Portal, PortalRegistry};
use crate::progress::{HarvestProgressEvent, HarvestProgressReporter, ProgressMode};
use crate::sink::RecordSink;

/// Options forwarded from the `clh harvest` command line.
pub struct HarvestOptions {
    /// Process at most this many rows.
    pub limit: Option<usize>,
    /// Count rows only; no clicks, downloads, or record writes.
    pub dry_run: bool,
    /// Override of the configured records path.
    pub out: Option<PathBuf>,
    pub progress: ProgressMode,
}

pub async fn run_harvest(config: &Config, source: &str, opts: &HarvestOptions) -> Result<HarvestReport> {
    let registry = PortalRegistry::from_config(&config.portals)?;
    let portal = registry.find(source).ok_or_else(|| {
        let known: Vec<&str> = registry.portals().iter().map(|p| p.name()).collect();
        anyhow::anyhow!(
            "Unknown portal: '{}'. Configured: {}",
            source,
            known.join(", ")
        )
    })?;

    ensure_connectivity(&config.connectivity).await?;

    let download_dir = &config.browser.download_dir;
    if !opts.dry_run {
        std::fs::create_dir_all(download_dir).with_context(|| {
            format!("Failed to create download directory {}", download_dir.display())
        })?;
    }

    let client = CdpClient::connect(&config.browser.endpoint)
        .await
        .context("Failed to start browser session")?;
    if !opts.dry_run {
        client
            .set_download_behavior(download_dir)
            .await
            .context("Failed to configure download behavior")?;
    }
    let page = client.new_page().await.context("Failed to open page")?;

    let records_path = opts.out.clone().unwrap_or_else(|| config.output.records.clone());
    let sink = RecordSink::new(&records_path);

    let result = harvest_session(&page, portal, config, &sink, opts).await;

    // Release the session on every exit path, including failures above.
    if let Err(e) = client.close_page(page.target_id()).await {
        warn!("Failed to close page: {}", e);
    }
    drop(client);

    let report = result?;
    print_summary(&report, &records_path, download_dir, opts.dry_run);
    Ok(report)
}

/// Drive one portal in an open page: navigate, wait for the list, walk rows.
async fn harvest_session(
    page: &PageSession,
    portal: &dyn Portal,
    config: &Config,
    sink: &RecordSink,
    opts: &HarvestOptions,
) -> Result<HarvestReport> {
    let timeout = Duration::from_secs(config.browser.nav_timeout_secs);
    let reporter = opts.progress.reporter();
    let started_at = Utc::now();

    page.navigate(portal.url(), timeout)
        .await
        .with_context(|| format!("Failed to open portal {}", portal.url()))?;

    // The first case row is the observable readiness signal; the short
    // settle pause covers rendering that completes after the row appears.
    reporter.report(HarvestProgressEvent::Listing {
        source: portal.name().to_string(),
    });
    page.wait_for_selector(portal.row_selector(), timeout)
        .await
        .context("Case list did not become ready")?;
    if config.browser.settle_ms > 0 {
        tokio::time::sleep(Duration::from_millis(config.browser.settle_ms)).await;
    }

    // Row count is captured once; it is not re-queried after navigation,
    // so it reflects the initial list size.
    let rows_found = page.query_selector_all(portal.row_selector()).await?.len();
    let row_count = match opts.limit {
        Some(limit) => rows_found.min(limit),
        None => rows_found,
    };

    if opts.dry_run {
        return Ok(HarvestReport {
            source: portal.name().to_string(),
            portal_url: portal.url().to_string(),
            started_at,
            finished_at: Utc::now(),
            rows_found,
            outcomes: Vec::new(),
        });
    }

    let http = reqwest::Client::new();
    let mut outcomes = Vec::with_capacity(row_count);

    for row in 1..=row_count {
        reporter.report(HarvestProgressEvent::Row {
            source: portal.name().to_string(),
            n: row,
            total: row_count,
        });

        match scrape_row(page, portal, row, timeout, &config.browser.download_dir, &http, sink)
            .await
        {
            Ok(record) => outcomes.push(RowOutcome::Harvested(record)),
            Err(e) => {
                warn!("Error processing row {}: {:#}. Skipping...", row, e);
                outcomes.push(RowOutcome::Skipped {
                    row,
                    reason: format!("{:#}", e),
                });
            }
        }
    }

    Ok(HarvestReport {
        source: portal.name().to_string(),
        portal_url: portal.url().to_string(),
        started_at,
        finished_at: Utc::now(),
        rows_found,
        outcomes,
    })
}

/// Process one case row: open its detail view, extract the record, fetch
/// the judgment document, persist, and return to the list.
///
/// Any error here is scoped to the row. The row's position is not
/// re-validated afterwards; if navigation state was left inconsistent,
/// subsequent rows may fail too, and that is accepted.
async fn scrape_row(
    page: &PageSession,
    portal: &dyn Portal,
    row: usize,
    timeout: Duration,
    download_dir: &Path,
    http: &reqwest::Client,
    sink: &RecordSink,
) -> Result<CaseRecord> {
    let cell = portal.case_cell(row);
    let node = page.wait_for_selector(&cell, timeout).await?;
    page.click_node(node, &cell).await?;

    let detail = portal.detail();
    page.wait_for_selector(&detail.case_no, timeout)
        .await
        .context("Case detail view did not appear")?;

    let case_no = page.text(&detail.case_no).await?;
    let case_title = page.text(&detail.case_title).await?;
    let author_judge = page.text(&detail.author_judge).await?;
    let judgment_date = page.text(&detail.judgment_date).await?;
    let case_citation = page.text(&detail.case_citation).await?;

    let download_url = page.attribute(&detail.download_link, "href").await?;
    let derived_name = filename_from_url(&download_url).unwrap_or_default();
    let dest = download_dir.join(&derived_name);

    let written = fetch(http, &download_url, &dest).await?;
    let case_file = written
        .as_deref()
        .and_then(Path::file_name)
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or(derived_name);

    let record = CaseRecord {
        case_no,
        case_title,
        author_judge,
        judgment_date,
        case_citation,
        court_type: portal.court().to_string(),
        url: download_url,
        case_file,
    };

    sink.append(&record)?;

    page.go_back(timeout).await?;
    page.wait_for_selector(portal.list_selector(), timeout)
        .await
        .context("Case list did not reappear after navigating back")?;

    Ok(record)
}

fn print_summary(report: &HarvestReport, records_path: &Path, download_dir: &Path, dry_run: bool) {
    if dry_run {
        println!("harvest {} (dry-run)", report.source);
        println!("  portal: {}", report.portal_url);
        println!("  rows found: {}", report.rows_found);
        return;
    }

    println!("harvest {}", report.source);
    println!("  portal: {}", report.portal_url);
    println!("  rows found: {}", report.rows_found);
    println!("  harvested: {}", report.harvested());
    println!("  skipped: {}", report.skipped());
    for (row, reason) in report.skipped_rows() {
        println!("  skipped row {}: {}", row, reason);
    }
    println!("  records: {}", records_path.display());
    println!("  downloads: {}", download_dir.display());
    println!("ok");
}

/// Quick sanity check used by `clh sources` before a run: the portal must
/// be resolvable from config. Returns the resolved registry.
pub fn resolve_portals(config: &Config) -> Result<PortalRegistry> {
    let registry = PortalRegistry::from_config(&config.portals)?;
    if registry.portals().is_empty() {
        bail!("no portals configured");
    }
    Ok(registry)
}
