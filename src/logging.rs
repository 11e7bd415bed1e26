use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter for a `-v` count when `RUST_LOG` is unset.
pub fn filter_for_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "form_probe=warn",
        1 => "form_probe=info",
        2 => "form_probe=debug",
        _ => "form_probe=trace",
    }
}

/// Install the global subscriber, writing to stderr so stdout stays
/// machine-readable. A second call is a no-op.
pub fn init_logging(verbose: u8) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_for_verbosity(verbose)));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}
