//! CLI argument definitions for tracehound-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Tracehound log-tailing incident detector daemon.
///
/// Tails an application log file, reassembles multi-line error traces
/// with surrounding context, and delivers each incident to a remote
/// ingestion endpoint.
#[derive(Parser, Debug)]
#[command(name = "tracehound-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to tracehound.toml configuration file.
    #[arg(short, long, default_value = "/etc/tracehound/tracehound.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration file and exit without starting the daemon.
    #[arg(long)]
    pub validate: bool,
}
