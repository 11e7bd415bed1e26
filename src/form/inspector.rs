use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::browser::driver::PageDriver;
use crate::error::ProbeError;
use crate::form::model::{FieldDescriptor, FormInspection};

/// Reason reported when the page has no `<form>` at all.
pub const NO_FORM_REASON: &str = "No form found";

/// Collects raw facts about every control in the first form.
///
/// Reports computed style, bounding box and raw attribute strings only;
/// filtering and normalisation happen in `to_descriptor`.
pub const INSPECT_FORM_JS: &str = r#"(() => {
  const form = document.querySelector('form');
  if (!form) return { formFound: false, controls: [] };
  const controls = Array.from(form.querySelectorAll('input, textarea, select')).map((el) => {
    const st = getComputedStyle(el);
    const rect = el.getBoundingClientRect();
    const id = el.id || null;
    const forLabel = id ? document.querySelector(`label[for="${CSS.escape(id)}"]`) : null;
    const enclosing = el.closest('label');
    return {
      tag: el.tagName,
      type: el.getAttribute('type'),
      id,
      name: el.getAttribute('name'),
      labelFor: forLabel ? forLabel.textContent : null,
      labelEnclosing: enclosing ? enclosing.textContent : null,
      required: el.hasAttribute('required'),
      minlength: el.getAttribute('minlength'),
      maxlength: el.getAttribute('maxlength'),
      pattern: el.getAttribute('pattern'),
      visibility: st.visibility,
      display: st.display,
      width: rect.width,
      height: rect.height,
    };
  });
  return { formFound: true, controls };
})()"#;

/// Native constraint-validation state of the first form; `false` when the
/// form is gone.
pub const FORM_VALIDITY_JS: &str =
    "(() => { const f = document.querySelector('form'); return f ? f.checkValidity() : false; })()";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawForm {
    pub form_found: bool,
    #[serde(default)]
    pub controls: Vec<RawControl>,
}

/// One control as reported by `INSPECT_FORM_JS`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawControl {
    pub tag: String,
    #[serde(rename = "type")]
    pub type_attr: Option<String>,
    pub id: Option<String>,
    pub name: Option<String>,
    pub label_for: Option<String>,
    pub label_enclosing: Option<String>,
    #[serde(default)]
    pub required: bool,
    pub minlength: Option<String>,
    pub maxlength: Option<String>,
    pub pattern: Option<String>,
    pub visibility: Option<String>,
    pub display: Option<String>,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
}

impl RawControl {
    /// Not `visibility: hidden`, not `display: none`, and a non-empty box.
    pub fn is_visible(&self) -> bool {
        self.visibility.as_deref() != Some("hidden")
            && self.display.as_deref() != Some("none")
            && self.width > 0.0
            && self.height > 0.0
    }

    pub fn to_descriptor(&self) -> FieldDescriptor {
        let label = non_empty(self.label_for.as_deref().map(str::trim))
            .or_else(|| non_empty(self.label_enclosing.as_deref().map(str::trim)));

        FieldDescriptor {
            tag: self.tag.to_lowercase(),
            input_type: non_empty(self.type_attr.as_deref().map(str::trim))
                .map(|t| t.to_lowercase())
                .unwrap_or_else(|| "text".to_string()),
            id: non_empty(self.id.as_deref()),
            name: non_empty(self.name.as_deref()),
            label,
            required: self.required,
            min_length: parse_length(self.minlength.as_deref()),
            max_length: parse_length(self.maxlength.as_deref()),
            pattern: non_empty(self.pattern.as_deref()),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

fn parse_length(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|v| v.trim().parse::<u32>().ok())
}

/// Turn the script's JSON into an inspection result.
pub fn parse_inspection(value: Value) -> Result<FormInspection, ProbeError> {
    if !value.is_object() {
        return Err(ProbeError::DomStructure(format!(
            "form inspection returned {} instead of an object",
            value
        )));
    }

    let raw: RawForm = serde_json::from_value(value).map_err(|e| ProbeError::JsonParse {
        context: "form inspection result".into(),
        source: e,
    })?;

    if !raw.form_found {
        return Ok(FormInspection::NoForm {
            reason: NO_FORM_REASON.to_string(),
        });
    }

    let total = raw.controls.len();
    let fields: Vec<FieldDescriptor> = raw
        .controls
        .iter()
        .filter(|c| c.is_visible())
        .map(RawControl::to_descriptor)
        .collect();

    debug!(total, visible = fields.len(), "inspected first form");
    Ok(FormInspection::Found(fields))
}

/// Inspect the first form of the page the driver is currently on.
///
/// Pure read. Results can differ between calls on a dynamic page, so callers
/// that depend on fresh state must call again rather than reuse.
pub fn inspect_form<D: PageDriver + ?Sized>(driver: &mut D) -> Result<FormInspection, ProbeError> {
    let value = driver.evaluate(INSPECT_FORM_JS)?;
    parse_inspection(value)
}

/// Run native constraint validation on the first form.
pub fn form_is_valid<D: PageDriver + ?Sized>(driver: &mut D) -> Result<bool, ProbeError> {
    match driver.evaluate(FORM_VALIDITY_JS)? {
        Value::Bool(valid) => Ok(valid),
        other => Err(ProbeError::DomStructure(format!(
            "form validity check returned {} instead of a boolean",
            other
        ))),
    }
}
