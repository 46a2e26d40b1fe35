//! Module orchestration -- assembly, channel wiring, and lifecycle management.
//!
//! The [`Orchestrator`] is the central coordinator of `tracehound-daemon`.
//! It loads configuration, creates the incident channel, builds the two
//! pipeline modules, manages startup/shutdown ordering, and waits for
//! shutdown signals.
//!
//! # Startup Order (producers before consumers)
//!
//! 1. Detector (tails the file, produces IncidentEvents)
//! 2. Dispatch (consumes IncidentEvents, POSTs to the ingestion endpoint)
//!
//! # Shutdown Order (same as startup - producers first)
//!
//! 1. Detector (stop tailing; dropping its sender closes the channel)
//! 2. Dispatch (finish the in-flight POST, then exit)

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::mpsc;

use tracehound_core::config::TracehoundConfig;
use tracehound_core::pipeline::DynPipeline;

use tracehound_detector::config::DetectorConfig;
use tracehound_detector::pipeline::DetectorPipelineBuilder;
use tracehound_dispatch::config::DispatchConfig;
use tracehound_dispatch::pipeline::DispatchPipelineBuilder;

use crate::health::{DaemonHealth, ModuleHealth, aggregate_status};

/// Incident channel capacity. A full channel back-pressures the tailer.
const INCIDENT_CHANNEL_CAPACITY: usize = 100;

/// Maximum time to wait for graceful shutdown before giving up.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// The main daemon orchestrator.
pub struct Orchestrator {
    /// Loaded and validated configuration.
    config: TracehoundConfig,
    /// Registered modules in start order (producers first).
    modules: Vec<(&'static str, Box<dyn DynPipeline>)>,
    /// Daemon start time (for uptime reporting).
    start_time: Instant,
}

impl Orchestrator {
    /// Load configuration from a file and build the orchestrator.
    pub async fn build(config_path: &Path) -> Result<Self> {
        let config = TracehoundConfig::load(config_path).await?;
        Self::build_from_config(config)
    }

    /// Build from an already-loaded configuration.
    ///
    /// Useful for testing or when config has already been loaded.
    pub fn build_from_config(config: TracehoundConfig) -> Result<Self> {
        config.validate()?;

        tracing::debug!("creating incident channel");
        let (incident_tx, incident_rx) = mpsc::channel(INCIDENT_CHANNEL_CAPACITY);

        tracing::info!("initializing detector pipeline");
        let detector_config = DetectorConfig::from_core(&config.watcher);
        let (detector, _) = DetectorPipelineBuilder::new()
            .config(detector_config)
            .incident_sender(incident_tx)
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build detector pipeline: {}", e))?;

        tracing::info!("initializing dispatch pipeline");
        let dispatch_config = DispatchConfig::from_core(&config.delivery);
        let dispatch = DispatchPipelineBuilder::new()
            .config(dispatch_config)
            .incident_receiver(incident_rx)
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build dispatch pipeline: {}", e))?;

        let modules: Vec<(&'static str, Box<dyn DynPipeline>)> = vec![
            ("detector", Box::new(detector)),
            ("dispatch", Box::new(dispatch)),
        ];

        tracing::info!(modules = modules.len(), "orchestrator initialized");

        Ok(Self {
            config,
            modules,
            start_time: Instant::now(),
        })
    }

    /// Start all modules and block until a shutdown signal arrives.
    ///
    /// # Shutdown Triggers
    ///
    /// - `SIGTERM` (from systemd, Docker, or `kill`)
    /// - `SIGINT` (Ctrl+C)
    pub async fn run(&mut self) -> Result<()> {
        self.start_all().await?;

        tracing::info!(
            log_path = %self.config.watcher.log_path,
            server_url = %self.config.delivery.server_url,
            "tracehound running"
        );

        let signal = wait_for_shutdown_signal().await?;
        tracing::info!(signal = signal, "shutdown signal received");

        self.shutdown().await;
        Ok(())
    }

    /// Start modules in registration order, rolling back on failure.
    pub async fn start_all(&mut self) -> Result<()> {
        for i in 0..self.modules.len() {
            let name = self.modules[i].0;
            tracing::info!(module = name, "starting module");
            if let Err(e) = self.modules[i].1.start().await {
                tracing::error!(module = name, error = %e, "module failed to start");
                // Rollback: stop modules that did start, in order.
                for (started_name, started) in self.modules.iter_mut().take(i) {
                    if let Err(stop_err) = started.stop().await {
                        tracing::warn!(
                            module = *started_name,
                            error = %stop_err,
                            "rollback stop failed"
                        );
                    }
                }
                return Err(anyhow::anyhow!("failed to start {}: {}", name, e));
            }
        }
        Ok(())
    }

    /// Stop all modules in registration order (producers first, so the
    /// consumer can drain), bounded by the shutdown grace period.
    pub async fn shutdown(&mut self) {
        tracing::info!("stopping all modules");

        let stop_all = async {
            for (name, module) in &mut self.modules {
                if let Err(e) = module.stop().await {
                    tracing::warn!(module = *name, error = %e, "module stop failed");
                }
            }
        };

        if tokio::time::timeout(SHUTDOWN_GRACE, stop_all).await.is_err() {
            tracing::error!(
                grace_secs = SHUTDOWN_GRACE.as_secs(),
                "graceful shutdown timed out, exiting anyway"
            );
        }
    }

    /// Get the current aggregated health status.
    pub async fn health(&self) -> DaemonHealth {
        let mut modules = Vec::with_capacity(self.modules.len());
        for (name, module) in &self.modules {
            modules.push(ModuleHealth {
                name: (*name).to_owned(),
                status: module.health_check().await,
            });
        }

        DaemonHealth {
            status: aggregate_status(&modules),
            uptime_secs: self.start_time.elapsed().as_secs(),
            modules,
        }
    }

    /// Get a reference to the loaded configuration.
    pub fn config(&self) -> &TracehoundConfig {
        &self.config
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
///
/// Returns the name of the signal that triggered the shutdown.
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}
