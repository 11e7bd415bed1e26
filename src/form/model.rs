use serde::{Deserialize, Serialize};

// ============================================================================
// FieldDescriptor — one visible, form-associated control
// ============================================================================

/// Validation-relevant view of a single `input`, `textarea`, or `select`.
///
/// Identity is positional: descriptors are re-derived on every inspection and
/// carry no identity across reloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    /// Lower-cased tag name
    pub tag: String,

    /// Lower-cased `type` attribute, `text` when absent
    #[serde(rename = "type")]
    pub input_type: String,

    pub id: Option<String>,
    pub name: Option<String>,

    /// Trimmed label text
    pub label: Option<String>,

    pub required: bool,
    pub min_length: Option<u32>,
    pub max_length: Option<u32>,

    /// Raw `pattern` attribute
    pub pattern: Option<String>,
}

/// Input types the executor knows how to synthesize values for.
pub const FILLABLE_TYPES: [&str; 3] = ["text", "email", "password"];

impl FieldDescriptor {
    /// CSS selector used to locate this control at fill time.
    ///
    /// Prefers `id`, falls back to `name`; `None` when the control has
    /// neither.
    pub fn selector(&self) -> Option<String> {
        if let Some(id) = &self.id {
            return Some(format!("[id=\"{}\"]", escape_attr(id)));
        }
        self.name
            .as_ref()
            .map(|name| format!("[name=\"{}\"]", escape_attr(name)))
    }

    /// Identifier reported in probe results: `name`, then `id`.
    pub fn identifier(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.id.clone())
            .unwrap_or_else(|| "(unknown)".to_string())
    }

    /// Text-like `<input>` the executor fills with a synthetic value.
    pub fn is_fillable(&self) -> bool {
        self.tag == "input" && FILLABLE_TYPES.contains(&self.input_type.as_str())
    }
}

fn escape_attr(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// SHA-1 over the canonical JSON of a field list.
///
/// Equal fingerprints mean the inspector saw the same controls in the same
/// order with the same attributes.
pub fn fields_fingerprint(fields: &[FieldDescriptor]) -> String {
    use sha1::{Digest, Sha1};

    let canonical = serde_json::to_string(fields).unwrap_or_default();
    let mut hasher = Sha1::new();
    hasher.update(canonical.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// Inspection results
// ============================================================================

/// Outcome of inspecting the first `<form>` of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormInspection {
    Found(Vec<FieldDescriptor>),
    NoForm { reason: String },
}

impl FormInspection {
    pub fn fields(&self) -> &[FieldDescriptor] {
        match self {
            FormInspection::Found(fields) => fields,
            FormInspection::NoForm { .. } => &[],
        }
    }
}

/// Result of the inspection-only `analyze` entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSummary {
    pub ok: bool,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub fields: Vec<FieldDescriptor>,
    pub fingerprint: String,
}

impl FieldSummary {
    pub fn from_inspection(url: &str, inspection: FormInspection) -> Self {
        match inspection {
            FormInspection::Found(fields) => Self {
                ok: true,
                url: url.to_string(),
                reason: None,
                fingerprint: fields_fingerprint(&fields),
                fields,
            },
            FormInspection::NoForm { reason } => Self {
                ok: false,
                url: url.to_string(),
                reason: Some(reason),
                fingerprint: fields_fingerprint(&[]),
                fields: Vec::new(),
            },
        }
    }
}
