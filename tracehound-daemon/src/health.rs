//! Aggregated daemon health reporting.
//!
//! Collects per-module `HealthStatus` values into a single daemon-level
//! view. Used by the orchestrator for periodic logging and by tests.

use serde::Serialize;

use tracehound_core::pipeline::HealthStatus;

/// Health of a single registered module.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleHealth {
    /// Module name ("detector", "dispatch").
    pub name: String,
    /// Current status reported by the module.
    pub status: HealthStatus,
}

/// Aggregated health of the whole daemon.
#[derive(Debug, Clone, Serialize)]
pub struct DaemonHealth {
    /// Worst status across all modules.
    pub status: HealthStatus,
    /// Seconds since the daemon started.
    pub uptime_secs: u64,
    /// Per-module breakdown.
    pub modules: Vec<ModuleHealth>,
}

/// Aggregate module statuses into a single daemon status.
///
/// Any unhealthy module makes the daemon unhealthy; any degraded module
/// makes it degraded; otherwise healthy.
pub fn aggregate_status(modules: &[ModuleHealth]) -> HealthStatus {
    let mut degraded_reason = None;

    for module in modules {
        match &module.status {
            HealthStatus::Unhealthy(reason) => {
                return HealthStatus::Unhealthy(format!("{}: {}", module.name, reason));
            }
            HealthStatus::Degraded(reason) => {
                if degraded_reason.is_none() {
                    degraded_reason = Some(format!("{}: {}", module.name, reason));
                }
            }
            HealthStatus::Healthy => {}
        }
    }

    match degraded_reason {
        Some(reason) => HealthStatus::Degraded(reason),
        None => HealthStatus::Healthy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(name: &str, status: HealthStatus) -> ModuleHealth {
        ModuleHealth {
            name: name.to_owned(),
            status,
        }
    }

    #[test]
    fn all_healthy_aggregates_healthy() {
        let modules = vec![
            module("detector", HealthStatus::Healthy),
            module("dispatch", HealthStatus::Healthy),
        ];
        assert_eq!(aggregate_status(&modules), HealthStatus::Healthy);
    }

    #[test]
    fn one_unhealthy_wins() {
        let modules = vec![
            module("detector", HealthStatus::Healthy),
            module(
                "dispatch",
                HealthStatus::Unhealthy("dispatcher terminated".to_owned()),
            ),
        ];
        let status = aggregate_status(&modules);
        assert!(status.is_unhealthy());
        assert!(status.to_string().contains("dispatch"));
    }

    #[test]
    fn degraded_beats_healthy_but_not_unhealthy() {
        let modules = vec![
            module("detector", HealthStatus::Degraded("slow".to_owned())),
            module(
                "dispatch",
                HealthStatus::Unhealthy("terminated".to_owned()),
            ),
        ];
        assert!(aggregate_status(&modules).is_unhealthy());

        let modules = vec![
            module("detector", HealthStatus::Degraded("slow".to_owned())),
            module("dispatch", HealthStatus::Healthy),
        ];
        assert!(matches!(
            aggregate_status(&modules),
            HealthStatus::Degraded(_)
        ));
    }

    #[test]
    fn empty_module_list_is_healthy() {
        assert_eq!(aggregate_status(&[]), HealthStatus::Healthy);
    }
}
