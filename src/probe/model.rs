use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::form::model::FieldDescriptor;

/// Field identifier used by the single valid-submission result.
pub const ALL_FIELDS: &str = "*all*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProbeCase {
    RequiredEmpty,
    ValidSubmission,
}

impl ProbeCase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeCase::RequiredEmpty => "required-empty",
            ProbeCase::ValidSubmission => "valid-submission",
        }
    }
}

/// How the probe attempted to submit the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitMethod {
    /// Clicked the first submit-typed control inside the form
    Click,
    /// No submit control; pressed Enter on the focused element
    Enter,
}

impl SubmitMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmitMethod::Click => "click",
            SubmitMethod::Enter => "enter",
        }
    }
}

/// Raw signals behind a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProbeNotes {
    #[serde(rename_all = "camelCase")]
    RequiredEmpty {
        form_valid: bool,
        post_observed: bool,
        /// False when the field's selector matched nothing at clear time
        cleared: bool,
        submitted_via: SubmitMethod,
    },
    #[serde(rename_all = "camelCase")]
    ValidSubmission {
        network_matched: bool,
        navigated: bool,
        has_status: bool,
        submitted_via: SubmitMethod,
    },
}

/// One probe verdict. Immutable once pushed to a run's results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub field: String,
    pub case: ProbeCase,
    pub pass: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<ProbeNotes>,
}

/// Everything one `run` invocation produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// False only when no form was found
    pub ok: bool,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Field list from the initial inspection
    pub fields: Vec<FieldDescriptor>,
    pub fingerprint: String,
    pub results: Vec<ProbeResult>,
    pub trace: PathBuf,
    #[serde(default)]
    pub duration_ms: u128,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.pass).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.passed()
    }

    /// A form was found and every probe passed.
    pub fn all_passed(&self) -> bool {
        self.ok && self.failed() == 0
    }

    pub fn results_for(&self, case: ProbeCase) -> impl Iterator<Item = &ProbeResult> {
        self.results.iter().filter(move |r| r.case == case)
    }
}
