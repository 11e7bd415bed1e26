use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use tracing::info;

use crate::{
    artifact::EVENTS_FILE,
    browser::{
        driver::PageDriver,
        session::{BrowserSession, DriverConfig},
    },
    error::{ProbeError, validate_target_url},
    form::{
        inspector::inspect_form,
        model::{FieldSummary, FormInspection, fields_fingerprint},
    },
    probe::{
        executor::{ProbeConfig, ProbeExecutor},
        model::RunSummary,
    },
    trace::{
        event::ProbeEvent,
        logger::EventLog,
        recorder::{TRACE_FILE, TraceRecorder},
    },
};

pub mod artifact;
pub mod browser;
pub mod cli;
pub mod error;
pub mod form;
pub mod logging;
pub mod probe;
pub mod report;
pub mod trace;

/// Free-form per-run options. Not read by any probe yet; carried through to
/// the summary.
pub type RunOptions = BTreeMap<String, String>;

/// Inspect the first form at `url` without probing it.
pub fn analyze<D: PageDriver + ?Sized>(driver: &mut D, url: &str) -> Result<FieldSummary, ProbeError> {
    driver.navigate(url)?;
    let inspection = inspect_form(driver)?;
    let summary = FieldSummary::from_inspection(url, inspection);
    info!(url, ok = summary.ok, fields = summary.fields.len(), "analyzed form");
    Ok(summary)
}

/// Full probe session: inspect, probe, and trace into `out_dir`.
///
/// When the page has no form the session stops right after inspection with
/// `ok: false`; the trace is still written.
pub fn run<D: PageDriver + ?Sized>(
    driver: &mut D,
    url: &str,
    out_dir: &Path,
    config: &ProbeConfig,
    options: &RunOptions,
) -> Result<RunSummary, ProbeError> {
    let started = Instant::now();
    std::fs::create_dir_all(out_dir).map_err(|e| ProbeError::Artifact {
        path: out_dir.to_path_buf(),
        source: e,
    })?;

    let events = EventLog::open(&out_dir.join(EVENTS_FILE));
    events.log(&ProbeEvent::now(events.next_step(), "session-start").with_detail(url));

    driver.navigate(url)?;

    let recorder = TraceRecorder::new(out_dir.join(TRACE_FILE)).with_options(config.trace.clone());
    let (inspection, results) = recorder.record(driver, |d| {
        let inspection = inspect_form(d)?;
        let results = match &inspection {
            FormInspection::Found(fields) => {
                ProbeExecutor::new(url, fields.clone(), config, &events)?.run_all(d)?
            }
            FormInspection::NoForm { reason } => {
                info!(url, reason = %reason, "no form; skipping probes");
                Vec::new()
            }
        };
        Ok((inspection, results))
    })?;

    let (ok, reason, fields) = match inspection {
        FormInspection::Found(fields) => (true, None, fields),
        FormInspection::NoForm { reason } => (false, Some(reason), Vec::new()),
    };

    let summary = RunSummary {
        ok,
        url: url.to_string(),
        reason,
        fingerprint: fields_fingerprint(&fields),
        fields,
        results,
        trace: recorder.path().to_path_buf(),
        duration_ms: started.elapsed().as_millis(),
        options: options.clone(),
    };

    events.log(
        &ProbeEvent::now(events.next_step(), "session-end")
            .with_detail(format!("{} passed, {} failed", summary.passed(), summary.failed())),
    );
    info!(
        url,
        ok = summary.ok,
        passed = summary.passed(),
        failed = summary.failed(),
        "run complete"
    );
    Ok(summary)
}

/// `analyze` in a freshly launched browser context.
pub fn analyze_url(driver_config: &DriverConfig, url: &str) -> Result<FieldSummary, ProbeError> {
    validate_target_url(url)?;
    let mut session = BrowserSession::launch(driver_config)?;
    let summary = analyze(&mut session, url);
    session.quit()?;
    summary
}

/// `run` in a freshly launched browser context.
pub fn run_url(
    driver_config: &DriverConfig,
    url: &str,
    out_dir: &Path,
    config: &ProbeConfig,
    options: &RunOptions,
) -> Result<RunSummary, ProbeError> {
    validate_target_url(url)?;
    let mut session = BrowserSession::launch(driver_config)?;
    let summary = run(&mut session, url, out_dir, config, options);
    session.quit()?;
    summary
}
