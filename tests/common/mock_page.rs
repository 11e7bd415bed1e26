use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};

use form_probe::browser::driver::{NetworkEvent, NetworkEventKind, PageDriver, TraceOptions};
use form_probe::error::ProbeError;
use form_probe::form::inspector::{FORM_VALIDITY_JS, INSPECT_FORM_JS};
use form_probe::probe::executor::{STATUS_SELECTOR, SUBMIT_SELECTOR};

// =========================================================================
// MockControl — one control inside the fake form
// =========================================================================

#[derive(Debug, Clone)]
pub struct MockControl {
    pub tag: String,
    pub type_attr: Option<String>,
    pub id: Option<String>,
    pub name: Option<String>,
    pub label: Option<String>,
    pub required: bool,
    pub minlength: Option<String>,
    pub maxlength: Option<String>,
    pub pattern: Option<String>,
    pub visible: bool,
    pub value: String,
}

impl MockControl {
    pub fn input(type_attr: &str, name: &str) -> Self {
        Self {
            tag: "INPUT".into(),
            type_attr: Some(type_attr.into()),
            id: None,
            name: Some(name.into()),
            label: None,
            required: false,
            minlength: None,
            maxlength: None,
            pattern: None,
            visible: true,
            value: String::new(),
        }
    }

    pub fn select(name: &str) -> Self {
        Self {
            tag: "SELECT".into(),
            type_attr: None,
            ..Self::input("text", name)
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn without_name(mut self) -> Self {
        self.name = None;
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_minlength(mut self, min: &str) -> Self {
        self.minlength = Some(min.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    fn matches(&self, selector: &str) -> bool {
        let by_id = self
            .id
            .as_ref()
            .map(|id| selector == format!("[id=\"{}\"]", id))
            .unwrap_or(false);
        let by_name = self
            .name
            .as_ref()
            .map(|name| selector == format!("[name=\"{}\"]", name))
            .unwrap_or(false);
        by_id || by_name
    }

    fn is_valid(&self) -> bool {
        if self.required && self.value.is_empty() {
            return false;
        }
        match self.minlength.as_deref().and_then(|m| m.parse::<usize>().ok()) {
            Some(min) if !self.value.is_empty() => self.value.len() >= min,
            _ => true,
        }
    }

    fn to_raw(&self) -> Value {
        // <label for=id> when the control has an id, wrapping <label> otherwise
        let (label_for, label_enclosing) = match &self.id {
            Some(_) => (self.label.clone(), None),
            None => (None, self.label.clone()),
        };
        let (display, width, height) = match self.visible {
            true => ("inline-block", 180.0, 24.0),
            false => ("none", 0.0, 0.0),
        };
        json!({
            "tag": self.tag,
            "type": self.type_attr,
            "id": self.id,
            "name": self.name,
            "labelFor": label_for,
            "labelEnclosing": label_enclosing,
            "required": self.required,
            "minlength": self.minlength,
            "maxlength": self.maxlength,
            "pattern": self.pattern,
            "visibility": "visible",
            "display": display,
            "width": width,
            "height": height,
        })
    }
}

// =========================================================================
// MockPage — scripted page implementing PageDriver
// =========================================================================

/// What happens when the form is actually submitted.
#[derive(Debug, Clone, Default)]
pub struct SubmitEffect {
    /// Status of the response to the POST, if the server answers
    pub response_status: Option<u16>,
    /// Response URL override (defaults to the page URL)
    pub response_url: Option<String>,
    /// Page URL after submission
    pub navigate_to: Option<String>,
    /// Render a `role="status"` element
    pub show_status: bool,
}

pub struct MockPage {
    pub form: Option<Vec<MockControl>>,
    pub has_submit_button: bool,
    /// Form bypasses constraint validation and posts anyway
    pub novalidate: bool,
    pub on_submit: SubmitEffect,
    /// Append a new control to the form after the first reload
    pub drift_after_reload: bool,
    /// Command name that fails with a protocol error
    pub fail_on: Option<&'static str>,

    pub url: String,
    pub current_url: String,
    pub status_visible: bool,
    pub reloads: u32,

    observers: BTreeMap<u64, (NetworkEventKind, Vec<NetworkEvent>)>,
    next_observer: u64,
    pub observers_started: u32,
    pub observers_stopped: u32,

    pub calls: Vec<String>,
    pub fills: Vec<(String, String)>,
    pub trace_starts: u32,
    pub trace_options: Option<TraceOptions>,
    pub trace_stops: Vec<PathBuf>,
}

impl MockPage {
    pub fn with_form(controls: Vec<MockControl>) -> Self {
        Self {
            form: Some(controls),
            has_submit_button: true,
            novalidate: false,
            on_submit: SubmitEffect::default(),
            drift_after_reload: false,
            fail_on: None,
            url: String::new(),
            current_url: String::new(),
            status_visible: false,
            reloads: 0,
            observers: BTreeMap::new(),
            next_observer: 1,
            observers_started: 0,
            observers_stopped: 0,
            calls: Vec::new(),
            fills: Vec::new(),
            trace_starts: 0,
            trace_options: None,
            trace_stops: Vec::new(),
        }
    }

    pub fn without_form() -> Self {
        Self {
            form: None,
            ..Self::with_form(Vec::new())
        }
    }

    pub fn active_observers(&self) -> usize {
        self.observers.len()
    }

    pub fn called(&self, prefix: &str) -> usize {
        self.calls.iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn check(&mut self, command: &'static str, detail: String) -> Result<(), ProbeError> {
        self.calls.push(if detail.is_empty() {
            command.to_string()
        } else {
            format!("{} {}", command, detail)
        });
        if self.fail_on == Some(command) {
            return Err(ProbeError::SessionProtocol {
                command: command.into(),
                error: "injected failure".into(),
            });
        }
        Ok(())
    }

    fn reset_values(&mut self) {
        if let Some(form) = &mut self.form {
            for control in form.iter_mut() {
                control.value.clear();
            }
        }
        self.status_visible = false;
    }

    fn form_valid(&self) -> bool {
        match &self.form {
            Some(form) => form.iter().all(MockControl::is_valid),
            None => false,
        }
    }

    fn emit(&mut self, event: NetworkEvent) {
        for (kind, events) in self.observers.values_mut() {
            if *kind == event.kind {
                events.push(event.clone());
            }
        }
    }

    fn attempt_submit(&mut self) {
        if self.form.is_none() || !(self.form_valid() || self.novalidate) {
            return;
        }
        let target = self.current_url.clone();
        self.emit(NetworkEvent {
            kind: NetworkEventKind::Request,
            method: "POST".into(),
            url: target.clone(),
            status: None,
        });
        if let Some(status) = self.on_submit.response_status {
            let url = self.on_submit.response_url.clone().unwrap_or(target);
            self.emit(NetworkEvent {
                kind: NetworkEventKind::Response,
                method: "POST".into(),
                url,
                status: Some(status),
            });
        }
        if let Some(next) = self.on_submit.navigate_to.clone() {
            self.current_url = next;
        }
        if self.on_submit.show_status {
            self.status_visible = true;
        }
    }

    fn inspection_value(&self) -> Value {
        match &self.form {
            None => json!({ "formFound": false, "controls": [] }),
            Some(form) => {
                let mut controls: Vec<Value> = form.iter().map(MockControl::to_raw).collect();
                if self.drift_after_reload && self.reloads > 0 {
                    controls.push(MockControl::input("text", "late_field").to_raw());
                }
                json!({ "formFound": true, "controls": controls })
            }
        }
    }
}

impl PageDriver for MockPage {
    fn navigate(&mut self, url: &str) -> Result<(), ProbeError> {
        self.check("navigate", url.to_string())?;
        self.url = url.to_string();
        self.current_url = url.to_string();
        self.reset_values();
        Ok(())
    }

    fn reload(&mut self) -> Result<(), ProbeError> {
        self.check("reload", String::new())?;
        self.reloads += 1;
        self.reset_values();
        Ok(())
    }

    fn evaluate(&mut self, script: &str) -> Result<Value, ProbeError> {
        if script == INSPECT_FORM_JS {
            self.check("evaluate", "inspect".into())?;
            Ok(self.inspection_value())
        } else if script == FORM_VALIDITY_JS {
            self.check("evaluate", "validity".into())?;
            Ok(Value::Bool(self.form_valid()))
        } else {
            Err(ProbeError::SessionProtocol {
                command: "evaluate".into(),
                error: "unknown script".into(),
            })
        }
    }

    fn count(&mut self, selector: &str) -> Result<u32, ProbeError> {
        self.check("count", selector.to_string())?;
        if selector == SUBMIT_SELECTOR {
            return Ok(u32::from(self.form.is_some() && self.has_submit_button));
        }
        if selector == STATUS_SELECTOR {
            return Ok(u32::from(self.status_visible));
        }
        let n = self
            .form
            .as_ref()
            .map(|form| form.iter().filter(|c| c.matches(selector)).count())
            .unwrap_or(0);
        Ok(n as u32)
    }

    fn fill(&mut self, selector: &str, value: &str) -> Result<(), ProbeError> {
        self.check("fill", selector.to_string())?;
        self.fills.push((selector.to_string(), value.to_string()));
        if let Some(control) = self
            .form
            .as_mut()
            .and_then(|form| form.iter_mut().find(|c| c.matches(selector)))
        {
            control.value = value.to_string();
        }
        Ok(())
    }

    fn clear(&mut self, selector: &str) -> Result<(), ProbeError> {
        self.check("clear", selector.to_string())?;
        if let Some(control) = self
            .form
            .as_mut()
            .and_then(|form| form.iter_mut().find(|c| c.matches(selector)))
        {
            control.value.clear();
        }
        Ok(())
    }

    fn click(&mut self, selector: &str) -> Result<(), ProbeError> {
        self.check("click", selector.to_string())?;
        self.attempt_submit();
        Ok(())
    }

    fn press(&mut self, key: &str) -> Result<(), ProbeError> {
        self.check("press", key.to_string())?;
        if key == "Enter" {
            self.attempt_submit();
        }
        Ok(())
    }

    fn wait(&mut self, ms: u64) -> Result<(), ProbeError> {
        self.check("wait", ms.to_string())
    }

    fn current_url(&mut self) -> Result<String, ProbeError> {
        self.check("current_url", String::new())?;
        Ok(self.current_url.clone())
    }

    fn observe_start(&mut self, kind: NetworkEventKind) -> Result<u64, ProbeError> {
        self.check("observe_start", format!("{:?}", kind))?;
        let id = self.next_observer;
        self.next_observer += 1;
        self.observers.insert(id, (kind, Vec::new()));
        self.observers_started += 1;
        Ok(id)
    }

    fn observe_stop(&mut self, id: u64) -> Result<Vec<NetworkEvent>, ProbeError> {
        self.check("observe_stop", id.to_string())?;
        self.observers_stopped += 1;
        Ok(self
            .observers
            .remove(&id)
            .map(|(_, events)| events)
            .unwrap_or_default())
    }

    fn trace_start(&mut self, options: &TraceOptions) -> Result<(), ProbeError> {
        self.check("trace_start", String::new())?;
        self.trace_starts += 1;
        self.trace_options = Some(options.clone());
        Ok(())
    }

    fn trace_stop(&mut self, path: &Path) -> Result<(), ProbeError> {
        self.check("trace_stop", path.display().to_string())?;
        std::fs::write(path, b"PK\x03\x04mock-trace").map_err(|e| ProbeError::Artifact {
            path: path.to_path_buf(),
            source: e,
        })?;
        self.trace_stops.push(path.to_path_buf());
        Ok(())
    }
}

// =========================================================================
// Fixture pages
// =========================================================================

pub const PAGE_URL: &str = "http://localhost:3000/register.html";

/// Registration form: required email + password, optional nickname, submit
/// button, server answering 200.
pub fn registration_page() -> MockPage {
    let mut page = MockPage::with_form(vec![
        MockControl::input("email", "email")
            .with_id("email")
            .with_label("Email")
            .required(),
        MockControl::input("password", "password")
            .with_id("password")
            .with_label("Password")
            .with_minlength("6")
            .required(),
        MockControl::input("text", "nickname").with_label("Nickname"),
    ]);
    page.on_submit.response_status = Some(200);
    page
}
