// ABOUTME: Run record writer producing per-run summary and log files
// ABOUTME: Creates a timestamped directory holding summary.json and run.log

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use super::error::Result;
use crate::engine::RunSummary;

/// Persists a finished run under
/// `<log_root>/<workflow-stem>_<UTC timestamp>/`: `summary.json` holds the
/// task id to outcome mapping, `run.log` the timestamped execution events.
pub struct RunWriter {
    log_root: PathBuf,
}

impl RunWriter {
    pub fn new<P: AsRef<Path>>(log_root: P) -> Self {
        Self {
            log_root: log_root.as_ref().to_path_buf(),
        }
    }

    pub async fn persist(&self, stem: &str, summary: &RunSummary) -> Result<PathBuf> {
        let timestamp = summary.started_at.format("%Y%m%dT%H%M%SZ");
        let run_dir = self.log_root.join(format!("{stem}_{timestamp}"));
        fs::create_dir_all(&run_dir).await?;

        let json = serde_json::to_string_pretty(&summary.outcomes)?;
        fs::write(run_dir.join("summary.json"), json).await?;
        debug!("Summary written to {}", run_dir.join("summary.json").display());

        let mut log = String::new();
        for event in &summary.events {
            let _ = writeln!(log, "{event}");
        }
        fs::write(run_dir.join("run.log"), log).await?;

        info!("Run record written to {}", run_dir.display());
        Ok(run_dir)
    }
}
