//! Synthetic log injector CLI.
//!
//! Appends realistic multi-language error bursts to a log file so the
//! tracehound daemon can be observed end to end.

use std::path::PathBuf;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use tracehound_injector::{InjectorConfig, LogInjector};

/// Append synthetic logs and error bursts to a file.
#[derive(Parser, Debug)]
#[command(name = "tracehound-inject")]
#[command(version, about, long_about = None)]
struct InjectCli {
    /// Log file to append to (created if missing).
    #[arg(short, long)]
    log_path: PathBuf,

    /// Write a single random burst and exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = InjectCli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_owned()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut injector = LogInjector::new(InjectorConfig::new(&cli.log_path));

    if cli.once {
        injector.run_once().await?;
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_cancel.cancel();
        }
    });

    tracing::info!(path = %cli.log_path.display(), "injector running, Ctrl+C to stop");
    injector.run(cancel).await?;
    tracing::info!("injector stopped");
    Ok(())
}
