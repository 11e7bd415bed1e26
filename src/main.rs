use clap::Parser;
use form_probe::cli::commands::{cmd_analyze, cmd_report, cmd_run};
use form_probe::cli::config::{Cli, Commands, load_config, resolve_driver_config};
use form_probe::logging::init_logging;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref());
    let driver = resolve_driver_config(&cli, &config);

    let all_passed = match cli.command {
        Commands::Analyze { url, format } => cmd_analyze(&url, &format, &driver)?,
        Commands::Run {
            url,
            artifacts_dir,
            format,
            output,
            options,
        } => {
            // CLI > config > default
            let artifacts_root = artifacts_dir.unwrap_or_else(|| config.artifacts.root.clone());
            cmd_run(
                &url,
                &artifacts_root,
                &format,
                output.as_deref(),
                options,
                &driver,
                &config.probe,
            )?
        }
        Commands::Report { summary, format } => cmd_report(&summary, &format)?,
    };

    if !all_passed {
        std::process::exit(1);
    }

    Ok(())
}
