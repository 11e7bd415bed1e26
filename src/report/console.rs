use crate::form::model::{FieldDescriptor, FieldSummary};
use crate::probe::model::{ProbeNotes, ProbeResult, RunSummary};

// ============================================================================
// Console reporter — formatted terminal output
// ============================================================================

/// Format a run summary for terminal output.
///
/// Produces output like:
/// ```text
/// === Form probe: http://localhost:3000/ ===
///
/// ✓ PASS  required-empty    email (form invalid, no POST, click)
/// ✗ FAIL  valid-submission  *all* (network=false navigated=false status=false, enter)
///
/// === Results: 1 passed, 1 failed (2 total) in 3.2s ===
/// ```
pub fn format_console_report(summary: &RunSummary) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== Form probe: {} ===\n\n", summary.url));

    if !summary.ok {
        out.push_str(&format!(
            "    [NO FORM] {}\n",
            summary.reason.as_deref().unwrap_or("no form found")
        ));
    }

    for result in &summary.results {
        let marker = if result.pass {
            "\u{2713} PASS"
        } else {
            "\u{2717} FAIL"
        };
        out.push_str(&format!(
            "{}  {:<17} {} ({})\n",
            marker,
            result.case.as_str(),
            result.field,
            describe_notes(result)
        ));
    }

    out.push_str(&format!(
        "\n=== Results: {} passed, {} failed ({} total)",
        summary.passed(),
        summary.failed(),
        summary.total()
    ));

    if summary.duration_ms > 0 {
        let secs = summary.duration_ms as f64 / 1000.0;
        out.push_str(&format!(" in {:.1}s", secs));
    }

    out.push_str(" ===\n");
    out.push_str(&format!("Trace: {}\n", summary.trace.display()));

    out
}

/// One-line explanation of a verdict's raw signals.
pub fn describe_notes(result: &ProbeResult) -> String {
    match &result.notes {
        Some(ProbeNotes::RequiredEmpty {
            form_valid,
            post_observed,
            cleared,
            submitted_via,
        }) => {
            let mut parts = vec![
                if *form_valid { "form valid" } else { "form invalid" }.to_string(),
                if *post_observed { "POST sent" } else { "no POST" }.to_string(),
            ];
            if !cleared {
                parts.push("field not found".to_string());
            }
            parts.push(submitted_via.as_str().to_string());
            parts.join(", ")
        }
        Some(ProbeNotes::ValidSubmission {
            network_matched,
            navigated,
            has_status,
            submitted_via,
        }) => format!(
            "network={} navigated={} status={}, {}",
            network_matched,
            navigated,
            has_status,
            submitted_via.as_str()
        ),
        None => "no notes".to_string(),
    }
}

/// Format an inspection-only summary as a field table.
pub fn format_field_summary(summary: &FieldSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== Form fields: {} ===\n", summary.url));

    if !summary.ok {
        out.push_str(&format!(
            "    [NO FORM] {}\n",
            summary.reason.as_deref().unwrap_or("no form found")
        ));
        return out;
    }

    for (i, field) in summary.fields.iter().enumerate() {
        out.push_str(&format!("{:>3}. {}\n", i + 1, describe_field(field)));
    }
    out.push_str(&format!(
        "({} fields, fingerprint {})\n",
        summary.fields.len(),
        &summary.fingerprint[..summary.fingerprint.len().min(12)]
    ));
    out
}

fn describe_field(field: &FieldDescriptor) -> String {
    let mut s = format!("<{} type={}>", field.tag, field.input_type);
    s.push_str(&format!(" {}", field.identifier()));
    if let Some(label) = &field.label {
        s.push_str(&format!(" \"{}\"", label));
    }
    if field.required {
        s.push_str(" required");
    }
    if let Some(min) = field.min_length {
        s.push_str(&format!(" minlength={}", min));
    }
    if let Some(max) = field.max_length {
        s.push_str(&format!(" maxlength={}", max));
    }
    if let Some(pattern) = &field.pattern {
        s.push_str(&format!(" pattern={}", pattern));
    }
    s
}
