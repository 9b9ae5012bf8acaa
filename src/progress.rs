//! Harvest progress reporting.
//!
//! Reports observable progress during `clh harvest` so users see which row
//! is being worked and how much is left. Progress is emitted on **stderr**
//! so stdout remains parseable for scripts.

use std::io::Write;

/// A single progress event for a harvest run.
#[derive(Clone, Debug)]
pub enum HarvestProgressEvent {
    /// Waiting for the portal's case list to render (no total yet).
    Listing { source: String },
    /// Row loop: row `n` of `total` is being processed.
    Row {
        source: String,
        n: usize,
        total: usize,
    },
}

/// Reports harvest progress. Implementations write to stderr (human or JSON).
pub trait HarvestProgressReporter: Send + Sync {
    /// Emit a progress event. Called from the row loop.
    fn report(&self, event: HarvestProgressEvent);
}

/// Human-friendly progress on stderr: "harvest shc  row 3 / 40".
pub struct StderrProgress;

impl HarvestProgressReporter for StderrProgress {
    fn report(&self, event: HarvestProgressEvent) {
        let line = match &event {
            HarvestProgressEvent::Listing { source } => {
                format!("harvest {}  waiting for case list...\n", source)
            }
            HarvestProgressEvent::Row { source, n, total } => {
                format!("harvest {}  row {} / {}\n", source, n, total)
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl HarvestProgressReporter for JsonProgress {
    fn report(&self, event: HarvestProgressEvent) {
        let obj = match &event {
            HarvestProgressEvent::Listing { source } => serde_json::json!({
                "event": "progress",
                "source": source,
                "phase": "listing"
            }),
            HarvestProgressEvent::Row { source, n, total } => serde_json::json!({
                "event": "progress",
                "source": source,
                "phase": "row",
                "n": n,
                "total": total
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl HarvestProgressReporter for NoProgress {
    fn report(&self, _event: HarvestProgressEvent) {}
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Build a reporter for this mode.
    pub fn reporter(&self) -> Box<dyn HarvestProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

impl std::str::FromStr for ProgressMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(ProgressMode::Off),
            "human" => Ok(ProgressMode::Human),
            "json" => Ok(ProgressMode::Json),
            other => Err(format!(
                "invalid progress mode '{}': expected off, human, or json",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn progress_mode_parses_known_values() {
        assert_eq!(ProgressMode::from_str("off").unwrap(), ProgressMode::Off);
        assert_eq!(ProgressMode::from_str("human").unwrap(), ProgressMode::Human);
        assert_eq!(ProgressMode::from_str("json").unwrap(), ProgressMode::Json);
        assert!(ProgressMode::from_str("loud").is_err());
    }
}
