//! Core data models used throughout the harness.
//!
//! These types represent the case records that flow through the harvest
//! pipeline and the per-run report assembled from row outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One published judgment, as extracted from a portal's case-detail view.
///
/// Serialized field names match the external record format of the persisted
/// result set; records have no identity beyond their position in that array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    #[serde(rename = "caseNo")]
    pub case_no: String,
    #[serde(rename = "caseTitle")]
    pub case_title: String,
    #[serde(rename = "authorJudge")]
    pub author_judge: String,
    #[serde(rename = "judgmentDate")]
    pub judgment_date: String,
    #[serde(rename = "caseCitation")]
    pub case_citation: String,
    #[serde(rename = "courtType")]
    pub court_type: String,
    #[serde(rename = "URL")]
    pub url: String,
    /// Local filename of the downloaded judgment. May reference a file that
    /// does not exist when the download failed (the record is still written).
    #[serde(rename = "caseFile")]
    pub case_file: String,
}

/// Outcome of processing a single case row.
///
/// A skipped row never aborts the run; it is recorded here and logged, and
/// the loop moves on to the next row.
#[derive(Debug, Clone)]
pub enum RowOutcome {
    Harvested(CaseRecord),
    Skipped { row: usize, reason: String },
}

impl RowOutcome {
    pub fn is_harvested(&self) -> bool {
        matches!(self, RowOutcome::Harvested(_))
    }
}

/// Per-run report collected by the row loop.
#[derive(Debug)]
pub struct HarvestReport {
    /// Portal name as configured (e.g. `shc`).
    pub source: String,
    /// Portal list URL the run targeted.
    pub portal_url: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Row count captured once at list entry; not re-queried afterwards.
    pub rows_found: usize,
    /// One entry per processed row, in original row order.
    pub outcomes: Vec<RowOutcome>,
}

impl HarvestReport {
    pub fn harvested(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_harvested()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.harvested()
    }

    /// Skipped rows as `(row, reason)` pairs, in row order.
    pub fn skipped_rows(&self) -> Vec<(usize, &str)> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                RowOutcome::Skipped { row, reason } => Some((*row, reason.as_str())),
                RowOutcome::Harvested(_) => None,
            })
            .collect()
    }
}
