//! Individual health checks for each bridge subsystem.

use chrono::{DateTime, Duration, Utc};

/// Result of a single subsystem health check.
#[derive(Debug, Clone)]
pub struct SubsystemCheck {
    /// Subsystem name.
    pub name: &'static str,
    /// Whether the subsystem is healthy.
    pub healthy: bool,
    /// Detail message (reason for unhealthy, or status info).
    pub detail: String,
}

impl SubsystemCheck {
    /// Create a healthy check result.
    pub fn ok(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            healthy: true,
            detail: detail.into(),
        }
    }

    /// Create an unhealthy check result.
    pub fn unhealthy(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            healthy: false,
            detail: detail.into(),
        }
    }
}

/// Check that the rewards service is still alive.
pub fn check_rewards_service(alive: bool) -> SubsystemCheck {
    if alive {
        SubsystemCheck::ok("rewards_service", "connected")
    } else {
        SubsystemCheck::unhealthy("rewards_service", "dropped, serving cached data only")
    }
}

/// Check that someone is listening for change events.
pub fn check_event_subscribers(count: usize) -> SubsystemCheck {
    if count > 0 {
        SubsystemCheck::ok("event_bus", format!("{} subscriber(s)", count))
    } else {
        SubsystemCheck::unhealthy("event_bus", "no subscribers, UI will not refresh")
    }
}

/// Check that no outstanding request has waited longer than `stall_after`.
pub fn check_pending_requests(
    oldest_issued_at: Option<DateTime<Utc>>,
    pending: usize,
    stall_after: Duration,
    now: DateTime<Utc>,
) -> SubsystemCheck {
    match oldest_issued_at {
        Some(issued_at) if now - issued_at > stall_after => SubsystemCheck::unhealthy(
            "pending_requests",
            format!(
                "{} outstanding, oldest waiting {}s",
                pending,
                (now - issued_at).num_seconds()
            ),
        ),
        _ => SubsystemCheck::ok("pending_requests", format!("{} outstanding", pending)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stalled_request_unhealthy() {
        let now = Utc::now();
        let check = check_pending_requests(
            Some(now - Duration::seconds(600)),
            3,
            Duration::seconds(300),
            now,
        );
        assert!(!check.healthy);
        assert!(check.detail.contains("3 outstanding"));
    }

    #[test]
    fn test_fresh_or_empty_pending_is_healthy() {
        let now = Utc::now();
        assert!(check_pending_requests(None, 0, Duration::seconds(300), now).healthy);
        assert!(check_pending_requests(Some(now), 1, Duration::seconds(300), now).healthy);
    }

    #[test]
    fn test_dropped_service_unhealthy() {
        assert!(!check_rewards_service(false).healthy);
        assert!(check_event_subscribers(2).healthy);
        assert!(!check_event_subscribers(0).healthy);
    }
}
