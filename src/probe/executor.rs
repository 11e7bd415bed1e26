use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::browser::driver::{NetworkEvent, NetworkEventKind, PageDriver, TraceOptions};
use crate::browser::observer::observe_network;
use crate::error::ProbeError;
use crate::form::inspector::{form_is_valid, inspect_form};
use crate::form::model::{FieldDescriptor, fields_fingerprint};
use crate::form::values::{now_millis, valid_value_for};
use crate::probe::model::{ALL_FIELDS, ProbeCase, ProbeNotes, ProbeResult, SubmitMethod};
use crate::trace::event::ProbeEvent;
use crate::trace::logger::EventLog;

/// First submit-typed control inside a form.
pub const SUBMIT_SELECTOR: &str = r#"form :is(button[type="submit"], input[type="submit"])"#;

/// Inline feedback region some forms use instead of navigating.
pub const STATUS_SELECTOR: &str = r#"[role="status"]"#;

// ============================================================================
// Probe configuration
// ============================================================================

/// Independent evidence that a valid submission was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuccessSignal {
    /// Same-origin 2xx response during the settle window
    Network,
    /// Page URL changed
    Navigation,
    /// An element with `role="status"` is present
    Status,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default = "default_required_settle")]
    pub required_settle_ms: u64,

    #[serde(default = "default_submission_settle")]
    pub submission_settle_ms: u64,

    /// The valid-submission probe passes when any listed signal holds.
    #[serde(default = "default_success_signals")]
    pub success_signals: Vec<SuccessSignal>,

    /// Re-inspect after each reload and warn when the field list changed.
    #[serde(default = "default_true")]
    pub detect_drift: bool,

    /// What the session trace captures.
    #[serde(default)]
    pub trace: TraceOptions,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            required_settle_ms: default_required_settle(),
            submission_settle_ms: default_submission_settle(),
            success_signals: default_success_signals(),
            detect_drift: true,
            trace: TraceOptions::default(),
        }
    }
}

fn default_required_settle() -> u64 { 300 }
fn default_submission_settle() -> u64 { 1500 }
fn default_true() -> bool { true }
fn default_success_signals() -> Vec<SuccessSignal> {
    vec![SuccessSignal::Network, SuccessSignal::Navigation, SuccessSignal::Status]
}

impl ProbeConfig {
    pub fn submission_verdict(&self, network_matched: bool, navigated: bool, has_status: bool) -> bool {
        self.success_signals.iter().any(|signal| match signal {
            SuccessSignal::Network => network_matched,
            SuccessSignal::Navigation => navigated,
            SuccessSignal::Status => has_status,
        })
    }
}

// ============================================================================
// ProbeExecutor
// ============================================================================

/// Runs the required-empty and valid-submission probes against one page.
///
/// The field list is captured once by the caller and reused for every probe;
/// each probe reloads the page and re-fills it from that list.
pub struct ProbeExecutor<'a> {
    url: String,
    origin: Url,
    fields: Vec<FieldDescriptor>,
    fingerprint: String,
    config: &'a ProbeConfig,
    events: &'a EventLog,
}

impl<'a> ProbeExecutor<'a> {
    pub fn new(
        url: &str,
        fields: Vec<FieldDescriptor>,
        config: &'a ProbeConfig,
        events: &'a EventLog,
    ) -> Result<Self, ProbeError> {
        let origin = Url::parse(url).map_err(|_| ProbeError::InvalidUrl(url.to_string()))?;
        Ok(Self {
            url: url.to_string(),
            origin,
            fingerprint: fields_fingerprint(&fields),
            fields,
            config,
            events,
        })
    }

    /// One required-empty probe per required field, then one valid
    /// submission, in that order.
    pub fn run_all<D: PageDriver + ?Sized>(
        &self,
        driver: &mut D,
    ) -> Result<Vec<ProbeResult>, ProbeError> {
        let mut results = Vec::new();

        for field in self.fields.iter().filter(|f| f.required) {
            results.push(self.required_empty(driver, field)?);
        }
        results.push(self.valid_submission(driver)?);

        Ok(results)
    }

    /// Clear `field`, try to submit, and check the browser blocked it.
    ///
    /// Passes iff the form reports invalid and no POST left the page.
    pub fn required_empty<D: PageDriver + ?Sized>(
        &self,
        driver: &mut D,
        field: &FieldDescriptor,
    ) -> Result<ProbeResult, ProbeError> {
        self.reset(driver)?;

        let cleared = match field.selector() {
            Some(selector) if driver.count(&selector)? > 0 => {
                driver.clear(&selector)?;
                true
            }
            _ => {
                debug!(field = %field.identifier(), "field under test not found; nothing to clear");
                false
            }
        };

        let settle = self.config.required_settle_ms;
        let ((submitted_via, form_valid), posts) =
            observe_network(driver, NetworkEventKind::Request, NetworkEvent::is_post, |d| {
                let via = submit(d)?;
                let valid = form_is_valid(d)?;
                d.wait(settle)?;
                Ok((via, valid))
            })?;
        let post_observed = !posts.is_empty();

        let result = ProbeResult {
            field: field.identifier(),
            case: ProbeCase::RequiredEmpty,
            pass: !form_valid && !post_observed,
            notes: Some(ProbeNotes::RequiredEmpty {
                form_valid,
                post_observed,
                cleared,
                submitted_via,
            }),
        };
        self.record(&result);
        Ok(result)
    }

    /// Fill everything, submit, and look for any accepted-submission signal.
    pub fn valid_submission<D: PageDriver + ?Sized>(
        &self,
        driver: &mut D,
    ) -> Result<ProbeResult, ProbeError> {
        self.reset(driver)?;
        let before = driver.current_url()?;

        let origin = &self.origin;
        let settle = self.config.submission_settle_ms;
        let (submitted_via, matched) = observe_network(
            driver,
            NetworkEventKind::Response,
            |e| e.is_success() && e.is_same_origin(origin),
            |d| {
                let via = submit(d)?;
                d.wait(settle)?;
                Ok(via)
            },
        )?;

        let network_matched = !matched.is_empty();
        let after = driver.current_url()?;
        let navigated = urls_differ(&before, &after);
        let has_status = driver.count(STATUS_SELECTOR)? > 0;

        let result = ProbeResult {
            field: ALL_FIELDS.to_string(),
            case: ProbeCase::ValidSubmission,
            pass: self.config.submission_verdict(network_matched, navigated, has_status),
            notes: Some(ProbeNotes::ValidSubmission {
                network_matched,
                navigated,
                has_status,
                submitted_via,
            }),
        };
        self.record(&result);
        Ok(result)
    }

    /// Reload to a clean page and re-fill it from the cached field list.
    fn reset<D: PageDriver + ?Sized>(&self, driver: &mut D) -> Result<(), ProbeError> {
        driver.reload()?;
        if self.config.detect_drift {
            self.check_drift(driver)?;
        }
        self.fill_all_valid(driver)
    }

    fn check_drift<D: PageDriver + ?Sized>(&self, driver: &mut D) -> Result<(), ProbeError> {
        let current = inspect_form(driver)?;
        let fingerprint = fields_fingerprint(current.fields());
        if fingerprint != self.fingerprint {
            warn!(
                url = %self.url,
                expected = %self.fingerprint,
                actual = %fingerprint,
                "form changed since initial inspection; probing with cached field list"
            );
            self.events.log(
                &ProbeEvent::now(self.events.next_step(), "drift")
                    .with_detail(format!("{} -> {}", self.fingerprint, fingerprint)),
            );
        }
        Ok(())
    }

    /// Fill every text-like field; fields whose selector misses are skipped.
    pub fn fill_all_valid<D: PageDriver + ?Sized>(&self, driver: &mut D) -> Result<(), ProbeError> {
        let now = now_millis();
        for field in self.fields.iter().filter(|f| f.is_fillable()) {
            let Some(selector) = field.selector() else {
                debug!(field = %field.identifier(), "no id or name; skipping fill");
                continue;
            };
            if driver.count(&selector)? == 0 {
                debug!(%selector, "selector matched nothing; skipping fill");
                continue;
            }
            driver.fill(&selector, &valid_value_for(field, now))?;
        }
        Ok(())
    }

    fn record(&self, result: &ProbeResult) {
        info!(
            field = %result.field,
            case = result.case.as_str(),
            pass = result.pass,
            "probe finished"
        );
        self.events
            .log(&ProbeEvent::now(self.events.next_step(), "probe").with_result(result));
    }
}

/// Click the form's submit control, or press Enter when there is none.
pub fn submit<D: PageDriver + ?Sized>(driver: &mut D) -> Result<SubmitMethod, ProbeError> {
    if driver.count(SUBMIT_SELECTOR)? > 0 {
        driver.click(SUBMIT_SELECTOR)?;
        Ok(SubmitMethod::Click)
    } else {
        driver.press("Enter")?;
        Ok(SubmitMethod::Enter)
    }
}

/// Compare as parsed URLs so `http://h` and `http://h/` count as the same
/// page; fall back to string comparison when either side does not parse.
pub fn urls_differ(before: &str, after: &str) -> bool {
    match (Url::parse(before), Url::parse(after)) {
        (Ok(a), Ok(b)) => a != b,
        _ => before != after,
    }
}
