use clap::Parser;
use pretty_assertions::assert_eq;

use form_probe::cli::config::{
    AppConfig, Cli, Commands, load_config, parse_key_value, resolve_driver_config,
};
use form_probe::logging::filter_for_verbosity;
use form_probe::probe::executor::SuccessSignal;

// =========================================================================
// Argument parsing
// =========================================================================

#[test]
fn parses_analyze() {
    let cli = Cli::parse_from(["form-probe", "analyze", "--url", "http://localhost:3000/"]);
    match cli.command {
        Commands::Analyze { url, format } => {
            assert_eq!(url, "http://localhost:3000/");
            assert_eq!(format, "console");
        }
        other => panic!("unexpected command: {:?}", other),
    }
}

#[test]
fn parses_run_with_options() {
    let cli = Cli::parse_from([
        "form-probe",
        "-vv",
        "run",
        "--url",
        "http://localhost:3000/register.html",
        "--artifacts-dir",
        "out",
        "--format",
        "junit",
        "--option",
        "locale=de",
        "--option",
        "query=a=b",
    ]);
    assert_eq!(cli.verbose, 2);
    match cli.command {
        Commands::Run {
            url,
            artifacts_dir,
            format,
            output,
            options,
        } => {
            assert_eq!(url, "http://localhost:3000/register.html");
            assert_eq!(artifacts_dir.as_deref(), Some("out"));
            assert_eq!(format, "junit");
            assert_eq!(output, None);
            assert_eq!(
                options,
                vec![
                    ("locale".to_string(), "de".to_string()),
                    ("query".to_string(), "a=b".to_string()),
                ]
            );
        }
        other => panic!("unexpected command: {:?}", other),
    }
}

#[test]
fn parses_report() {
    let cli = Cli::parse_from(["form-probe", "report", "--summary", "out/summary.json", "--format", "json"]);
    assert!(matches!(
        cli.command,
        Commands::Report { ref summary, ref format } if summary == "out/summary.json" && format == "json"
    ));
}

#[test]
fn run_requires_url() {
    assert!(Cli::try_parse_from(["form-probe", "run"]).is_err());
}

#[test]
fn rejects_malformed_option() {
    assert!(
        Cli::try_parse_from(["form-probe", "run", "--url", "http://x/", "--option", "novalue"]).is_err()
    );
}

#[test]
fn key_value_parsing() {
    assert_eq!(parse_key_value("a=1"), Ok(("a".to_string(), "1".to_string())));
    assert_eq!(parse_key_value("empty="), Ok(("empty".to_string(), String::new())));
    assert!(parse_key_value("=1").is_err());
    assert!(parse_key_value("bare").is_err());
}

// =========================================================================
// Config file
// =========================================================================

#[test]
fn missing_config_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.yaml");
    let config = load_config(path.to_str());

    assert_eq!(config.artifacts.root, "artifacts");
    assert_eq!(config.probe.required_settle_ms, 300);
    assert_eq!(config.probe.submission_settle_ms, 1500);
    assert_eq!(config.probe.success_signals.len(), 3);
    assert!(config.driver.headless);
}

#[test]
fn partial_config_keeps_other_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("form-probe.yaml");
    std::fs::write(
        &path,
        "driver:\n  script: drivers/server.js\nprobe:\n  submission_settle_ms: 2500\n  success_signals: [network]\n  trace:\n    screenshots: false\nartifacts:\n  root: runs\n",
    )
    .unwrap();

    let config = load_config(path.to_str());
    assert_eq!(config.driver.script, "drivers/server.js");
    assert_eq!(config.driver.node, "node");
    assert_eq!(config.probe.submission_settle_ms, 2500);
    assert_eq!(config.probe.required_settle_ms, 300);
    assert_eq!(config.probe.success_signals, vec![SuccessSignal::Network]);
    assert!(config.probe.detect_drift);
    assert!(!config.probe.trace.screenshots);
    assert!(config.probe.trace.snapshots);
    assert_eq!(config.artifacts.root, "runs");
}

#[test]
fn malformed_config_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("form-probe.yaml");
    std::fs::write(&path, "probe: [this, is, not, a, map]\n").unwrap();

    let config = load_config(path.to_str());
    assert_eq!(config.probe.submission_settle_ms, 1500);
    assert_eq!(config.artifacts.root, "artifacts");
}

#[test]
fn cli_flags_override_config_file() {
    let mut config = AppConfig::default();
    config.driver.node = "/opt/node/bin/node".into();
    config.driver.script = "from-config.js".into();

    let cli = Cli::parse_from([
        "form-probe",
        "analyze",
        "--url",
        "http://x/",
        "--driver",
        "from-cli.js",
        "--headed",
    ]);
    let driver = resolve_driver_config(&cli, &config);

    assert_eq!(driver.node, "/opt/node/bin/node");
    assert_eq!(driver.script, "from-cli.js");
    assert!(!driver.headless);
}

// =========================================================================
// Logging
// =========================================================================

#[test]
fn verbosity_maps_to_filter() {
    assert_eq!(filter_for_verbosity(0), "form_probe=warn");
    assert_eq!(filter_for_verbosity(1), "form_probe=info");
    assert_eq!(filter_for_verbosity(2), "form_probe=debug");
    assert_eq!(filter_for_verbosity(3), "form_probe=trace");
    assert_eq!(filter_for_verbosity(9), "form_probe=trace");
}
