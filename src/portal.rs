//! Court portal layouts.
//!
//! A [`Portal`] bundles everything site-specific: the list URL, the court
//! label, and the positional selectors for the case list and detail view.
//! The harvest loop only talks to this trait, so adding a second court is
//! a new implementation plus a registry arm; the row loop is untouched.
//!
//! Selectors are positional (table row/column indices) and are a contract
//! with the target site's current markup; a markup change shifts fields
//! into the wrong cells silently rather than loudly.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::config::PortalConfig;

/// Portal kinds accepted in `[portals.<name>] kind = "..."`.
pub const KNOWN_KINDS: &[&str] = &["sindh-high-court"];

/// Named selectors for the six fields of a case-detail view.
///
/// All refer to the detail table's first data row.
#[derive(Debug, Clone)]
pub struct DetailSelectors {
    pub case_no: String,
    pub case_title: String,
    pub author_judge: String,
    pub judgment_date: String,
    pub case_citation: String,
    /// Anchor element whose `href` is the judgment document.
    pub download_link: String,
}

/// A court's case-law portal layout.
#[async_trait]
pub trait Portal: Send + Sync {
    /// Configured portal name (registry key), e.g. `shc`.
    fn name(&self) -> &str;

    /// Court label recorded in every case record.
    fn court(&self) -> &str;

    /// URL of the case-list page.
    fn url(&self) -> &str;

    /// Container that signals the list view is rendered (also used when
    /// waiting for the list to reappear after navigating back).
    fn list_selector(&self) -> &str;

    /// All case rows in the list view.
    fn row_selector(&self) -> &str;

    /// The clickable case cell of the 1-based row `row`.
    fn case_cell(&self, row: usize) -> String;

    /// Field selectors for the detail view.
    fn detail(&self) -> DetailSelectors;

    /// Probe the portal over plain HTTP. 2xx = healthy.
    async fn health(&self, client: &reqwest::Client) -> Result<()> {
        let resp = client.get(self.url()).send().await?;
        if !resp.status().is_success() {
            bail!("portal answered {}", resp.status());
        }
        Ok(())
    }
}

/// Sindh High Court judgments portal (`caselaw.shc.gov.pk`).
pub struct SindhHighCourt {
    name: String,
    url: String,
}

impl SindhHighCourt {
    pub const DEFAULT_URL: &'static str = "https://caselaw.shc.gov.pk/caselaw/public/rpt-afr";

    pub fn new(name: String, url: Option<String>) -> Self {
        Self {
            name,
            url: url.unwrap_or_else(|| Self::DEFAULT_URL.to_string()),
        }
    }
}

#[async_trait]
impl Portal for SindhHighCourt {
    fn name(&self) -> &str {
        &self.name
    }

    fn court(&self) -> &str {
        "Sindh High Court"
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn list_selector(&self) -> &str {
        "#tblExport"
    }

    fn row_selector(&self) -> &str {
        "#tblExport tbody tr"
    }

    fn case_cell(&self, row: usize) -> String {
        format!("#tblExport tbody tr:nth-child({}) td:nth-child(3)", row)
    }

    fn detail(&self) -> DetailSelectors {
        let cell = |col: usize| {
            format!(
                "#appjudgment table tbody tr:nth-child(1) td:nth-child({})",
                col
            )
        };
        DetailSelectors {
            case_no: cell(2),
            case_title: cell(3),
            author_judge: cell(4),
            judgment_date: cell(5),
            case_citation: cell(6),
            download_link: "#appjudgment table tbody tr:nth-child(1) td:nth-child(8) a"
                .to_string(),
        }
    }
}

/// Registry of configured portals, resolved from the config file.
pub struct PortalRegistry {
    portals: Vec<Box<dyn Portal>>,
}

impl PortalRegistry {
    /// Build the registry from `[portals.*]` config entries.
    ///
    /// Unknown kinds are a config error (also rejected at config load).
    pub fn from_config(portals: &BTreeMap<String, PortalConfig>) -> Result<Self> {
        let mut registry = Self {
            portals: Vec::new(),
        };
        for (name, cfg) in portals {
            match cfg.kind.as_str() {
                "sindh-high-court" => registry.portals.push(Box::new(SindhHighCourt::new(
                    name.clone(),
                    cfg.url.clone(),
                ))),
                other => bail!(
                    "Unknown portal kind '{}'. Available: {}",
                    other,
                    KNOWN_KINDS.join(", ")
                ),
            }
        }
        Ok(registry)
    }

    pub fn portals(&self) -> &[Box<dyn Portal>] {
        &self.portals
    }

    /// Find a portal by its configured name.
    pub fn find(&self, name: &str) -> Option<&dyn Portal> {
        self.portals
            .iter()
            .find(|p| p.name() == name)
            .map(|p| p.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shc() -> SindhHighCourt {
        SindhHighCourt::new("shc".to_string(), None)
    }

    #[test]
    fn case_cell_is_one_based_third_column() {
        assert_eq!(
            shc().case_cell(4),
            "#tblExport tbody tr:nth-child(4) td:nth-child(3)"
        );
    }

    #[test]
    fn detail_selectors_target_first_data_row() {
        let detail = shc().detail();
        assert_eq!(
            detail.case_no,
            "#appjudgment table tbody tr:nth-child(1) td:nth-child(2)"
        );
        assert_eq!(
            detail.case_citation,
            "#appjudgment table tbody tr:nth-child(1) td:nth-child(6)"
        );
        assert!(detail.download_link.ends_with("td:nth-child(8) a"));
    }

    #[test]
    fn registry_resolves_configured_portals() {
        let mut portals = BTreeMap::new();
        portals.insert(
            "shc".to_string(),
            PortalConfig {
                kind: "sindh-high-court".to_string(),
                url: None,
            },
        );
        let registry = PortalRegistry::from_config(&portals).unwrap();
        let portal = registry.find("shc").unwrap();
        assert_eq!(portal.court(), "Sindh High Court");
        assert_eq!(portal.url(), SindhHighCourt::DEFAULT_URL);
        assert!(registry.find("other").is_none());
    }

    #[test]
    fn registry_honors_url_override() {
        let mut portals = BTreeMap::new();
        portals.insert(
            "mirror".to_string(),
            PortalConfig {
                kind: "sindh-high-court".to_string(),
                url: Some("http://localhost:8080/rpt-afr".to_string()),
            },
        );
        let registry = PortalRegistry::from_config(&portals).unwrap();
        assert_eq!(
            registry.find("mirror").unwrap().url(),
            "http://localhost:8080/rpt-afr"
        );
    }

    #[test]
    fn registry_rejects_unknown_kind() {
        let mut portals = BTreeMap::new();
        portals.insert(
            "x".to_string(),
            PortalConfig {
                kind: "nope".to_string(),
                url: None,
            },
        );
        assert!(PortalRegistry::from_config(&portals).is_err());
    }
}
