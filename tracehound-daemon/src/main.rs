use std::path::Path;

use clap::Parser;

use tracehound_daemon::cli::DaemonCli;
use tracehound_daemon::logging;
use tracehound_daemon::orchestrator::Orchestrator;
use tracehound_core::config::TracehoundConfig;

#[tokio::main]
async fn main() {
    let cli = DaemonCli::parse();

    // Load and validate configuration. Config errors are fatal (exit 1)
    // and reported on stderr before any subscriber is installed.
    let mut config = match TracehoundConfig::load(Path::new(&cli.config)).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("config error: {e}");
            std::process::exit(1);
        }
    };

    // CLI overrides take precedence over the config file.
    if let Some(level) = cli.log_level {
        config.general.log_level = level;
    }
    if let Some(format) = cli.log_format {
        config.general.log_format = format;
    }

    if let Err(e) = logging::init_tracing(&config.general) {
        eprintln!("logging error: {e}");
        std::process::exit(1);
    }

    if cli.validate {
        tracing::info!(config = %cli.config.display(), "configuration is valid");
        return;
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "tracehound-daemon starting");

    let mut orchestrator = match Orchestrator::build_from_config(config) {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            tracing::error!(error = %e, "failed to build orchestrator");
            std::process::exit(1);
        }
    };

    // A startup failure here includes the log file failing to open.
    if let Err(e) = orchestrator.run().await {
        tracing::error!(error = %e, "daemon terminated with error");
        std::process::exit(1);
    }

    tracing::info!("tracehound-daemon shut down");
}
