use std::path::{Path, PathBuf};

use crate::error::ProbeError;
use crate::probe::model::RunSummary;

pub const SUMMARY_FILE: &str = "summary.json";
pub const EVENTS_FILE: &str = "events.jsonl";

/// Root directory holding one subdirectory per run.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create a fresh run directory.
    ///
    /// Names sort by start time; the UUID suffix keeps concurrent runs
    /// started in the same millisecond apart.
    pub fn create_run_dir(&self) -> Result<PathBuf, ProbeError> {
        let dir = self.root.join(run_dir_name());
        std::fs::create_dir_all(&dir).map_err(|e| ProbeError::Artifact {
            path: dir.clone(),
            source: e,
        })?;
        Ok(dir)
    }

    /// Path of a run directory relative to the store root, `/`-separated.
    pub fn relative(&self, dir: &Path) -> String {
        dir.strip_prefix(&self.root)
            .unwrap_or(dir)
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }
}

pub fn run_dir_name() -> String {
    let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%3fZ");
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", stamp, &id[..8])
}

/// Write `summary.json` (pretty-printed) into `dir`.
pub fn write_summary(dir: &Path, summary: &RunSummary) -> Result<PathBuf, ProbeError> {
    let path = dir.join(SUMMARY_FILE);
    let json = serde_json::to_string_pretty(summary).map_err(|e| ProbeError::JsonSerialize {
        context: "RunSummary".into(),
        source: e,
    })?;
    std::fs::write(&path, json).map_err(|e| ProbeError::Artifact {
        path: path.clone(),
        source: e,
    })?;
    Ok(path)
}

pub fn read_summary(path: &Path) -> Result<RunSummary, ProbeError> {
    let content = std::fs::read_to_string(path).map_err(|e| ProbeError::Artifact {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| ProbeError::JsonParse {
        context: format!("{}", path.display()),
        source: e,
    })
}
