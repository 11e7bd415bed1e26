use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, Command, Stdio};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::browser::driver::{NetworkEvent, NetworkEventKind, PageDriver, TraceOptions};
use crate::error::ProbeError;

/// Where to find the automation driver and how to launch it.
///
/// The script is not bundled. It must speak the NDJSON protocol of
/// `BrowserRequest`/`BrowserResponse`, including the `observe_*` and
/// `trace_*` commands, and print `{"ok":true,"ready":true}` once launched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    #[serde(default = "default_node")]
    pub node: String,

    #[serde(default = "default_script")]
    pub script: String,

    #[serde(default = "default_true")]
    pub headless: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            node: default_node(),
            script: default_script(),
            headless: true,
        }
    }
}

fn default_node() -> String { "node".to_string() }
fn default_script() -> String { "node/form-driver/browser_server.js".to_string() }
fn default_true() -> bool { true }

/// Request sent to the driver over stdin (one JSON line).
#[derive(Debug, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum BrowserRequest {
    Navigate { url: String },
    Reload,
    Evaluate { script: String },
    Count { selector: String },
    Fill { selector: String, value: String },
    Clear { selector: String },
    Click { selector: String },
    Press { key: String },
    Wait { duration_ms: u64 },
    CurrentUrl,
    ObserveStart { kind: NetworkEventKind },
    ObserveStop { id: u64 },
    TraceStart {
        screenshots: bool,
        snapshots: bool,
        sources: bool,
    },
    TraceStop { path: String },
    Quit,
}

impl BrowserRequest {
    pub fn navigate(url: &str) -> Self {
        BrowserRequest::Navigate { url: url.to_string() }
    }

    pub fn evaluate(script: &str) -> Self {
        BrowserRequest::Evaluate { script: script.to_string() }
    }

    pub fn count(selector: &str) -> Self {
        BrowserRequest::Count { selector: selector.to_string() }
    }

    pub fn fill(selector: &str, value: &str) -> Self {
        BrowserRequest::Fill {
            selector: selector.to_string(),
            value: value.to_string(),
        }
    }

    pub fn clear(selector: &str) -> Self {
        BrowserRequest::Clear { selector: selector.to_string() }
    }

    pub fn click(selector: &str) -> Self {
        BrowserRequest::Click { selector: selector.to_string() }
    }

    pub fn press(key: &str) -> Self {
        BrowserRequest::Press { key: key.to_string() }
    }

    pub fn wait(duration_ms: u64) -> Self {
        BrowserRequest::Wait { duration_ms }
    }

    pub fn trace_start(options: &TraceOptions) -> Self {
        BrowserRequest::TraceStart {
            screenshots: options.screenshots,
            snapshots: options.snapshots,
            sources: options.sources,
        }
    }

    pub fn trace_stop(path: &Path) -> Self {
        BrowserRequest::TraceStop {
            path: path.display().to_string(),
        }
    }

    /// Name used in protocol error messages.
    pub fn command_name(&self) -> &'static str {
        match self {
            BrowserRequest::Navigate { .. } => "navigate",
            BrowserRequest::Reload => "reload",
            BrowserRequest::Evaluate { .. } => "evaluate",
            BrowserRequest::Count { .. } => "count",
            BrowserRequest::Fill { .. } => "fill",
            BrowserRequest::Clear { .. } => "clear",
            BrowserRequest::Click { .. } => "click",
            BrowserRequest::Press { .. } => "press",
            BrowserRequest::Wait { .. } => "wait",
            BrowserRequest::CurrentUrl => "current_url",
            BrowserRequest::ObserveStart { .. } => "observe_start",
            BrowserRequest::ObserveStop { .. } => "observe_stop",
            BrowserRequest::TraceStart { .. } => "trace_start",
            BrowserRequest::TraceStop { .. } => "trace_stop",
            BrowserRequest::Quit => "quit",
        }
    }
}

/// Response received from the driver over stdout (one JSON line).
#[derive(Debug, Deserialize)]
pub struct BrowserResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub ready: Option<bool>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub events: Option<Vec<NetworkEvent>>,
}

/// A browser context owned by one driver subprocess.
///
/// Commands are sent as NDJSON over stdin, responses read from stdout. One
/// session serves exactly one analyze or run invocation.
pub struct BrowserSession {
    child: Child,
    stdin: std::process::ChildStdin,
    reader: BufReader<std::process::ChildStdout>,
    closed: bool,
}

impl BrowserSession {
    /// Spawn the driver and wait for its ready line.
    pub fn launch(config: &DriverConfig) -> Result<Self, ProbeError> {
        let mut command = Command::new(&config.node);
        command.arg(&config.script);
        if !config.headless {
            command.arg("--headed");
        }

        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| ProbeError::SubprocessSpawn {
                script: config.script.clone(),
                source: e,
            })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            ProbeError::SessionIO("Failed to capture stdin of browser driver".into())
        })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            ProbeError::SessionIO("Failed to capture stdout of browser driver".into())
        })?;

        let mut reader = BufReader::new(stdout);

        let mut line = String::new();
        reader
            .read_line(&mut line)
            .map_err(|e| ProbeError::SessionIO(format!("Failed to read ready signal: {}", e)))?;

        let response: BrowserResponse =
            serde_json::from_str(line.trim()).map_err(|e| ProbeError::JsonParse {
                context: "browser driver ready signal".into(),
                source: e,
            })?;

        if !response.ok || response.ready != Some(true) {
            return Err(ProbeError::SessionProtocol {
                command: "launch".into(),
                error: "Did not receive ready signal from browser driver".into(),
            });
        }

        debug!(script = %config.script, "browser driver ready");

        Ok(BrowserSession {
            child,
            stdin,
            reader,
            closed: false,
        })
    }

    fn send(&mut self, request: &BrowserRequest) -> Result<BrowserResponse, ProbeError> {
        let json = serde_json::to_string(request).map_err(|e| ProbeError::JsonSerialize {
            context: "BrowserRequest".into(),
            source: e,
        })?;
        trace!(request = %json, "-> driver");

        writeln!(self.stdin, "{}", json).map_err(|e| {
            ProbeError::SessionIO(format!("Failed to write to browser driver stdin: {}", e))
        })?;

        self.stdin.flush().map_err(|e| {
            ProbeError::SessionIO(format!("Failed to flush browser driver stdin: {}", e))
        })?;

        let mut line = String::new();
        self.reader.read_line(&mut line).map_err(|e| {
            ProbeError::SessionIO(format!("Failed to read from browser driver stdout: {}", e))
        })?;

        if line.trim().is_empty() {
            return Err(ProbeError::SessionIO(
                "Empty response from browser driver (process may have died)".into(),
            ));
        }
        trace!(response = %line.trim(), "<- driver");

        serde_json::from_str(line.trim()).map_err(|e| ProbeError::JsonParse {
            context: "browser driver response".into(),
            source: e,
        })
    }

    /// Send a request and verify the driver reported success.
    fn send_ok(&mut self, request: &BrowserRequest) -> Result<BrowserResponse, ProbeError> {
        let response = self.send(request)?;
        if !response.ok {
            return Err(ProbeError::SessionProtocol {
                command: request.command_name().into(),
                error: response.error.unwrap_or_else(|| "Unknown error".into()),
            });
        }
        Ok(response)
    }

    fn missing(command: &str, field: &str) -> ProbeError {
        ProbeError::SessionProtocol {
            command: command.into(),
            error: format!("No {} in {} response", field, command),
        }
    }

    /// Close the browser and reap the subprocess. Safe to call twice.
    pub fn quit(&mut self) -> Result<(), ProbeError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        // The driver may already be gone; nothing useful to report then.
        let _ = self.send(&BrowserRequest::Quit);
        let _ = self.child.wait();
        Ok(())
    }
}

impl PageDriver for BrowserSession {
    fn navigate(&mut self, url: &str) -> Result<(), ProbeError> {
        self.send_ok(&BrowserRequest::navigate(url))?;
        Ok(())
    }

    fn reload(&mut self) -> Result<(), ProbeError> {
        self.send_ok(&BrowserRequest::Reload)?;
        Ok(())
    }

    fn evaluate(&mut self, script: &str) -> Result<Value, ProbeError> {
        let response = self.send_ok(&BrowserRequest::evaluate(script))?;
        Ok(response.value.unwrap_or(Value::Null))
    }

    fn count(&mut self, selector: &str) -> Result<u32, ProbeError> {
        let response = self.send_ok(&BrowserRequest::count(selector))?;
        response.count.ok_or_else(|| Self::missing("count", "count"))
    }

    fn fill(&mut self, selector: &str, value: &str) -> Result<(), ProbeError> {
        self.send_ok(&BrowserRequest::fill(selector, value))?;
        Ok(())
    }

    fn clear(&mut self, selector: &str) -> Result<(), ProbeError> {
        self.send_ok(&BrowserRequest::clear(selector))?;
        Ok(())
    }

    fn click(&mut self, selector: &str) -> Result<(), ProbeError> {
        self.send_ok(&BrowserRequest::click(selector))?;
        Ok(())
    }

    fn press(&mut self, key: &str) -> Result<(), ProbeError> {
        self.send_ok(&BrowserRequest::press(key))?;
        Ok(())
    }

    fn wait(&mut self, ms: u64) -> Result<(), ProbeError> {
        self.send_ok(&BrowserRequest::wait(ms))?;
        Ok(())
    }

    fn current_url(&mut self) -> Result<String, ProbeError> {
        let response = self.send_ok(&BrowserRequest::CurrentUrl)?;
        response.url.ok_or_else(|| Self::missing("current_url", "url"))
    }

    fn observe_start(&mut self, kind: NetworkEventKind) -> Result<u64, ProbeError> {
        let response = self.send_ok(&BrowserRequest::ObserveStart { kind })?;
        response.id.ok_or_else(|| Self::missing("observe_start", "id"))
    }

    fn observe_stop(&mut self, id: u64) -> Result<Vec<NetworkEvent>, ProbeError> {
        let response = self.send_ok(&BrowserRequest::ObserveStop { id })?;
        Ok(response.events.unwrap_or_default())
    }

    fn trace_start(&mut self, options: &TraceOptions) -> Result<(), ProbeError> {
        self.send_ok(&BrowserRequest::trace_start(options))?;
        Ok(())
    }

    fn trace_stop(&mut self, path: &Path) -> Result<(), ProbeError> {
        self.send_ok(&BrowserRequest::trace_stop(path))?;
        Ok(())
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        let _ = self.quit();
    }
}
