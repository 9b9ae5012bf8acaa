//! Persisted result set.
//!
//! Case records accumulate in a single JSON array on disk. Every append is
//! a read-modify-write of the whole file: load, push, rewrite pretty-
//! printed. The write is not atomic with respect to interruption, and the
//! sink is single-writer only: there is no locking, and a sequential
//! caller is the only supported scenario.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::models::CaseRecord;

/// Appends case records to one JSON array file for the run's duration.
pub struct RecordSink {
    path: PathBuf,
}

impl RecordSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `record`, rewriting the whole file.
    ///
    /// A prior file that is valid JSON but not an array, or that fails to
    /// parse, is discarded and replaced by a fresh single-element array
    /// (lossy recovery, logged).
    pub fn append(&self, record: &CaseRecord) -> Result<()> {
        let mut records = self.load_existing();
        records.push(serde_json::to_value(record)?);

        let rendered = serde_json::to_string_pretty(&Value::Array(records))?;
        std::fs::write(&self.path, rendered)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        info!("Record appended to {}", self.path.display());
        Ok(())
    }

    fn load_existing(&self) -> Vec<Value> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => {
                info!(
                    "{} does not exist; a new file will be created",
                    self.path.display()
                );
                return Vec::new();
            }
        };

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Array(records)) => records,
            Ok(_) => {
                warn!(
                    "Existing JSON in {} is not an array; overwriting it",
                    self.path.display()
                );
                Vec::new()
            }
            Err(e) => {
                warn!("Error reading {}: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }
}
