use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::{fs::OpenOptions, io::Write, sync::Mutex};

use tracing::warn;

use crate::trace::event::ProbeEvent;

/// Append-only JSONL sink for probe events.
///
/// Never fails the run: open and write errors are downgraded to warnings and
/// the logger becomes a no-op.
pub struct EventLog {
    file: Option<Mutex<std::fs::File>>,
    step: AtomicU64,
}

impl EventLog {
    pub fn open(path: &Path) -> Self {
        let file = OpenOptions::new().create(true).append(true).open(path);

        match file {
            Ok(f) => Self {
                file: Some(Mutex::new(f)),
                step: AtomicU64::new(0),
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not open event log");
                Self::disabled()
            }
        }
    }

    pub fn disabled() -> Self {
        Self {
            file: None,
            step: AtomicU64::new(0),
        }
    }

    /// Monotonic step counter for the next event.
    pub fn next_step(&self) -> u64 {
        self.step.fetch_add(1, Ordering::Relaxed)
    }

    pub fn log(&self, event: &ProbeEvent) {
        let Some(file_mutex) = &self.file else {
            return;
        };

        let json = match serde_json::to_string(event) {
            Ok(j) => j,
            Err(e) => {
                warn!(error = %e, "failed to serialize probe event");
                return;
            }
        };

        let mut file = match file_mutex.lock() {
            Ok(f) => f,
            Err(e) => {
                warn!(error = %e, "event log lock poisoned");
                return;
            }
        };

        if let Err(e) = writeln!(file, "{}", json) {
            warn!(error = %e, "failed to write probe event");
        }
    }
}
