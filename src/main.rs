use std::process::ExitCode;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use jobmux_core::config::{Config, Settings};
use jobmux_core::JobError;

mod commands;
mod output;

use commands::App;

fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Config::parse_args();

    // Setup logging
    setup_logging(cli.debug);

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            // JobError messages already carry their causes
            if e.downcast_ref::<JobError>().is_some() {
                eprintln!("Error: {}", e);
            } else {
                eprintln!("Error: {:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Config) -> Result<u8> {
    // Load settings
    let mut settings = Settings::load(cli.config.as_ref())?;
    settings.merge_cli(&cli);
    settings.validate();

    let app = App::new(settings)?;
    let status = app.dispatch(&cli.command)?;
    Ok(u8::try_from(status).unwrap_or(1))
}

fn setup_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("jobmux=debug,jobmux_core=debug")
    } else {
        EnvFilter::new("jobmux=info,jobmux_core=info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();
}
