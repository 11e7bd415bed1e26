use std::path::Path;

use crate::artifact::{ArtifactStore, read_summary, write_summary};
use crate::browser::session::DriverConfig;
use crate::probe::executor::ProbeConfig;
use crate::probe::model::RunSummary;
use crate::report::console::{format_console_report, format_field_summary};
use crate::report::junit::generate_junit_xml;
use crate::{RunOptions, analyze_url, run_url};

// ============================================================================
// analyze subcommand
// ============================================================================

/// Inspect the form and print its fields. Returns whether a form was found.
pub fn cmd_analyze(
    url: &str,
    format: &str,
    driver: &DriverConfig,
) -> Result<bool, Box<dyn std::error::Error>> {
    let summary = analyze_url(driver, url)?;

    let output = match format {
        "json" => format!("{}\n", serde_json::to_string_pretty(&summary)?),
        _ => format_field_summary(&summary),
    };
    print!("{}", output);

    Ok(summary.ok)
}

// ============================================================================
// run subcommand
// ============================================================================

/// Probe the form, persist artifacts, and report. Returns whether every
/// probe passed.
pub fn cmd_run(
    url: &str,
    artifacts_root: &str,
    format: &str,
    output: Option<&str>,
    options: Vec<(String, String)>,
    driver: &DriverConfig,
    probe: &ProbeConfig,
) -> Result<bool, Box<dyn std::error::Error>> {
    let store = ArtifactStore::new(artifacts_root);
    let run_dir = store.create_run_dir()?;
    tracing::info!(url, dir = %store.relative(&run_dir), "starting run");

    let options: RunOptions = options.into_iter().collect();
    let summary = run_url(driver, url, &run_dir, probe, &options)?;
    write_summary(&run_dir, &summary)?;

    emit(&render(&summary, format)?, output)?;
    eprintln!("Artifacts: {}", run_dir.display());

    Ok(summary.all_passed())
}

// ============================================================================
// report subcommand
// ============================================================================

pub fn cmd_report(summary_path: &str, format: &str) -> Result<bool, Box<dyn std::error::Error>> {
    let summary = read_summary(Path::new(summary_path))?;
    emit(&render(&summary, format)?, None)?;
    Ok(summary.all_passed())
}

// ============================================================================
// Helpers
// ============================================================================

/// Render a summary in the requested format (console by default).
pub fn render(summary: &RunSummary, format: &str) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match format {
        "json" => format!("{}\n", serde_json::to_string_pretty(summary)?),
        "junit" => generate_junit_xml(summary),
        _ => format_console_report(summary),
    })
}

fn emit(content: &str, output: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        Some(path) => std::fs::write(path, content)?,
        None => print!("{}", content),
    }
    Ok(())
}
