use crate::probe::model::RunSummary;
use crate::report::console::describe_notes;

// ============================================================================
// JUnit XML reporter — standard CI integration format
// ============================================================================

/// Generate a JUnit XML report, one `<testcase>` per probe.
///
/// A run that found no form is reported as a single failing case so CI does
/// not treat it as green.
pub fn generate_junit_xml(summary: &RunSummary) -> String {
    let time_attr = if summary.duration_ms > 0 {
        format!(" time=\"{:.3}\"", summary.duration_ms as f64 / 1000.0)
    } else {
        String::new()
    };

    let mut cases = String::new();
    let mut tests = summary.total();
    let mut failures = summary.failed();

    if !summary.ok {
        tests += 1;
        failures += 1;
        cases.push_str(&format!(
            "  <testcase name=\"inspect\" classname=\"form-probe\">\n    <failure message=\"{}\" type=\"NoFormFound\" />\n  </testcase>\n",
            escape_xml(summary.reason.as_deref().unwrap_or("no form found"))
        ));
    }

    for result in &summary.results {
        let name = format!("{} {}", result.case.as_str(), result.field);
        if result.pass {
            cases.push_str(&format!(
                "  <testcase name=\"{}\" classname=\"form-probe\" />\n",
                escape_xml(&name)
            ));
        } else {
            cases.push_str(&format!(
                "  <testcase name=\"{name}\" classname=\"form-probe\">\n    <failure message=\"probe failed\" type=\"ProbeFailure\">{body}</failure>\n  </testcase>\n",
                name = escape_xml(&name),
                body = escape_xml(&describe_notes(result)),
            ));
        }
    }

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<testsuite name=\"{name}\" tests=\"{tests}\" failures=\"{failures}\"{time}>\n{cases}</testsuite>\n",
        name = escape_xml(&summary.url),
        tests = tests,
        failures = failures,
        time = time_attr,
        cases = cases,
    )
}

/// Escape XML special characters.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
