use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProbeError;

// ============================================================================
// PageDriver trait — the seam to the browser automation library
// ============================================================================

/// Operations the probe core needs from a live page.
///
/// Every call is synchronous and strictly ordered: the driver owns exactly one
/// page and the core never issues two commands concurrently. `BrowserSession`
/// is the production implementation; tests use an in-memory fake.
pub trait PageDriver {
    /// Navigate and wait for `domcontentloaded`.
    fn navigate(&mut self, url: &str) -> Result<(), ProbeError>;

    /// Reload the current page and wait for `domcontentloaded`.
    fn reload(&mut self) -> Result<(), ProbeError>;

    /// Evaluate a JavaScript expression in the page and return its JSON value.
    fn evaluate(&mut self, script: &str) -> Result<Value, ProbeError>;

    /// Number of elements matching a CSS selector.
    fn count(&mut self, selector: &str) -> Result<u32, ProbeError>;

    /// Fill the first element matching `selector`.
    fn fill(&mut self, selector: &str, value: &str) -> Result<(), ProbeError>;

    /// Reset the first element matching `selector` to an empty value
    /// (unchecks checkboxes, deselects selects).
    fn clear(&mut self, selector: &str) -> Result<(), ProbeError>;

    /// Click the first element matching `selector`.
    fn click(&mut self, selector: &str) -> Result<(), ProbeError>;

    /// Press a key on the focused element.
    fn press(&mut self, key: &str) -> Result<(), ProbeError>;

    /// Fixed, non-polling delay inside the page.
    fn wait(&mut self, ms: u64) -> Result<(), ProbeError>;

    fn current_url(&mut self) -> Result<String, ProbeError>;

    /// Attach a network listener; events are buffered driver-side until
    /// `observe_stop` is called with the returned id.
    fn observe_start(&mut self, kind: NetworkEventKind) -> Result<u64, ProbeError>;

    /// Detach the listener and return everything it saw.
    fn observe_stop(&mut self, id: u64) -> Result<Vec<NetworkEvent>, ProbeError>;

    fn trace_start(&mut self, options: &TraceOptions) -> Result<(), ProbeError>;

    /// Stop capture and write the replayable trace archive to `path`.
    fn trace_stop(&mut self, path: &Path) -> Result<(), ProbeError>;
}

// ============================================================================
// Network events
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkEventKind {
    Request,
    Response,
}

/// One outgoing request or incoming response seen by a listener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkEvent {
    pub kind: NetworkEventKind,
    pub method: String,
    pub url: String,
    /// Present on responses only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl NetworkEvent {
    pub fn is_post(&self) -> bool {
        self.method.eq_ignore_ascii_case("POST")
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, Some(s) if (200..300).contains(&s))
    }

    /// True when scheme, host, and port match `origin`'s.
    pub fn is_same_origin(&self, origin: &url::Url) -> bool {
        match url::Url::parse(&self.url) {
            Ok(u) => u.origin() == origin.origin(),
            Err(_) => false,
        }
    }
}

// ============================================================================
// Trace capture options
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceOptions {
    pub screenshots: bool,
    pub snapshots: bool,
    pub sources: bool,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            screenshots: true,
            snapshots: true,
            sources: true,
        }
    }
}
