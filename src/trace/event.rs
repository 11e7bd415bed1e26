use serde::Serialize;

use crate::probe::model::{ProbeCase, ProbeResult};

/// One line of a run's `events.jsonl`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeEvent {
    pub timestamp_ms: i64,
    pub step: u64,

    /// `session-start`, `probe`, `drift`, `session-end`
    pub kind: String,

    pub case: Option<ProbeCase>,
    pub field: Option<String>,
    pub pass: Option<bool>,

    pub signals: Vec<String>,
    pub detail: Option<String>,
}

impl ProbeEvent {
    pub fn now(step: u64, kind: &str) -> Self {
        Self {
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
            step,
            kind: kind.to_string(),
            case: None,
            field: None,
            pass: None,
            signals: vec![],
            detail: None,
        }
    }

    /// Copy verdict and raw signals out of a finished probe.
    pub fn with_result(mut self, result: &ProbeResult) -> Self {
        self.case = Some(result.case);
        self.field = Some(result.field.clone());
        self.pass = Some(result.pass);
        if let Some(notes) = &result.notes {
            if let Ok(serde_json::Value::Object(map)) = serde_json::to_value(notes) {
                self.signals = map.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            }
        }
        self
    }

    pub fn with_detail(mut self, detail: impl ToString) -> Self {
        self.detail = Some(detail.to_string());
        self
    }
}
