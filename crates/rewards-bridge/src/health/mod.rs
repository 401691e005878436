//! Bridge health: per-subsystem checks rolled up into one status.

pub mod checks;

pub use checks::SubsystemCheck;

/// Overall bridge health.
#[derive(Debug, Clone)]
pub struct BridgeHealth {
    pub healthy: bool,
    pub checks: Vec<SubsystemCheck>,
}

impl BridgeHealth {
    /// Names of failing subsystems.
    pub fn degraded_subsystems(&self) -> Vec<&'static str> {
        self.checks
            .iter()
            .filter(|c| !c.healthy)
            .map(|c| c.name)
            .collect()
    }
}

/// Healthy only if every check is healthy.
pub fn compute_health(checks: &[SubsystemCheck]) -> BridgeHealth {
    BridgeHealth {
        healthy: checks.iter().all(|c| c.healthy),
        checks: checks.to_vec(),
    }
}
