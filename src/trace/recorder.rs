use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::browser::driver::{PageDriver, TraceOptions};
use crate::error::ProbeError;

/// File name of the replayable session trace inside a run directory.
pub const TRACE_FILE: &str = "trace.zip";

/// Wraps a probe session in one start/stop trace capture.
pub struct TraceRecorder {
    path: PathBuf,
    options: TraceOptions,
}

impl TraceRecorder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            options: TraceOptions::default(),
        }
    }

    pub fn with_options(mut self, options: TraceOptions) -> Self {
        self.options = options;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Start capture, run `session`, then stop capture exactly once.
    ///
    /// The archive is written whether `session` produced results, produced
    /// nothing, or failed. A failing session's error takes precedence over a
    /// failing stop; otherwise a stop failure is returned.
    pub fn record<D, T, F>(&self, driver: &mut D, session: F) -> Result<T, ProbeError>
    where
        D: PageDriver + ?Sized,
        F: FnOnce(&mut D) -> Result<T, ProbeError>,
    {
        driver.trace_start(&self.options)?;
        let outcome = session(driver);
        let stopped = driver.trace_stop(&self.path);

        match (outcome, stopped) {
            (Ok(value), Ok(())) => {
                info!(trace = %self.path.display(), "trace written");
                Ok(value)
            }
            (Ok(_), Err(stop_err)) => Err(stop_err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(stop_err)) => {
                warn!(error = %stop_err, "trace stop failed after session error");
                Err(err)
            }
        }
    }
}
