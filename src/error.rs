use std::path::PathBuf;

use thiserror::Error;

/// Failures that abort a probe session.
///
/// "No form on the page" and "selector matched nothing" are not errors: the
/// first is reported as `ok: false` in the summary, the second is a skipped
/// field.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Driver subprocess failed to spawn
    #[error("Failed to spawn {script} (is Node.js installed?): {source}")]
    SubprocessSpawn {
        script: String,
        #[source]
        source: std::io::Error,
    },

    /// Broken pipe, EOF, or other I/O failure talking to the driver
    #[error("Session I/O error: {0}")]
    SessionIO(String),

    /// Driver answered `ok: false` or omitted a required response field
    #[error("Session protocol error ({command}): {error}")]
    SessionProtocol { command: String, error: String },

    #[error("JSON parse error ({context}): {source}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON serialize error ({context}): {source}")]
    JsonSerialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// DOM probe script returned an unexpected shape
    #[error("Unexpected DOM structure: {0}")]
    DomStructure(String),

    /// Target URL is not an absolute http(s) URL
    #[error("Invalid target URL '{0}': provide an http/https URL")]
    InvalidUrl(String),

    /// Artifact directory or file could not be written
    #[error("Artifact I/O error at {}: {source}", path.display())]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Reject anything that is not an absolute http or https URL.
pub fn validate_target_url(raw: &str) -> Result<url::Url, ProbeError> {
    let parsed = url::Url::parse(raw).map_err(|_| ProbeError::InvalidUrl(raw.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        _ => Err(ProbeError::InvalidUrl(raw.to_string())),
    }
}
