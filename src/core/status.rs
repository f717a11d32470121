/// Per-service container status and its classification into display categories

use std::fmt;

/// Run state reported for services with no matching container
pub const NOT_RUNNING: &str = "NOT_RUNNING";

/// Coarse runtime state of a running container
pub const STATE_RUNNING: &str = "running";

/// Health of a container as reported by the runtime
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Health {
    Healthy,
    Starting,
    Unhealthy,
    /// Running, but the container defines no healthcheck (or inspection failed)
    NoHealthcheck,
    Unknown,
    /// Any other literal the runtime returned, kept verbatim
    Other(String),
}

impl From<&str> for Health {
    fn from(value: &str) -> Self {
        match value {
            "healthy" => Health::Healthy,
            "starting" => Health::Starting,
            "unhealthy" => Health::Unhealthy,
            "" | "no-healthcheck" => Health::NoHealthcheck,
            "unknown" => Health::Unknown,
            other => Health::Other(other.to_string()),
        }
    }
}

impl Health {
    pub fn as_str(&self) -> &str {
        match self {
            Health::Healthy => "healthy",
            Health::Starting => "starting",
            Health::Unhealthy => "unhealthy",
            Health::NoHealthcheck => "no-healthcheck",
            Health::Unknown => "unknown",
            Health::Other(value) => value,
        }
    }
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved status of one tracked service for a single poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerStatus {
    pub container_id: String,
    pub run_state: String,
    pub health: Health,
    pub is_running: bool,
}

impl ContainerStatus {
    /// Status for a service whose container is absent from the runtime listing
    pub fn not_found(container_id: &str) -> Self {
        Self {
            container_id: container_id.to_string(),
            run_state: NOT_RUNNING.to_string(),
            health: Health::Unknown,
            is_running: false,
        }
    }

    /// Status for a matched container before any health inspection
    pub fn observed(container_id: &str, state: &str) -> Self {
        Self {
            container_id: container_id.to_string(),
            run_state: state.to_string(),
            health: Health::Unknown,
            is_running: state == STATE_RUNNING,
        }
    }
}

/// Per-line display category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayCategory {
    Healthy,
    Starting,
    Unhealthy,
    Restarting,
    Paused,
    Stopped,
}

/// Aggregate counting bucket; every display category collapses into one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountBucket {
    Healthy,
    Starting,
    Stopped,
}

impl DisplayCategory {
    pub fn label(&self) -> &'static str {
        match self {
            DisplayCategory::Healthy => "HEALTHY",
            DisplayCategory::Starting => "STARTING",
            DisplayCategory::Unhealthy => "UNHEALTHY",
            DisplayCategory::Restarting => "RESTARTING",
            DisplayCategory::Paused => "PAUSED",
            DisplayCategory::Stopped => "STOPPED",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            DisplayCategory::Healthy => "✅",
            DisplayCategory::Starting => "⏳",
            DisplayCategory::Unhealthy => "⚠️",
            DisplayCategory::Restarting => "🔄",
            DisplayCategory::Paused => "⏸️",
            DisplayCategory::Stopped => "⚫",
        }
    }

    pub fn bucket(&self) -> CountBucket {
        match self {
            DisplayCategory::Healthy => CountBucket::Healthy,
            DisplayCategory::Starting => CountBucket::Starting,
            _ => CountBucket::Stopped,
        }
    }
}

impl fmt::Display for DisplayCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a status; rules are evaluated in order and the first match wins.
pub fn classify(status: &ContainerStatus) -> DisplayCategory {
    match (status.is_running, &status.health, status.run_state.as_str()) {
        (true, Health::Healthy | Health::NoHealthcheck, _) => DisplayCategory::Healthy,
        (true, Health::Starting, _) => DisplayCategory::Starting,
        (true, Health::Unhealthy, _) => DisplayCategory::Unhealthy,
        (_, _, "restarting") => DisplayCategory::Restarting,
        (_, _, "paused") => DisplayCategory::Paused,
        _ => DisplayCategory::Stopped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(run_state: &str, health: Health, is_running: bool) -> ContainerStatus {
        ContainerStatus {
            container_id: "cid".to_string(),
            run_state: run_state.to_string(),
            health,
            is_running,
        }
    }

    #[test]
    fn test_classify_running_states() {
        assert_eq!(classify(&status("running", Health::Healthy, true)), DisplayCategory::Healthy);
        assert_eq!(classify(&status("running", Health::NoHealthcheck, true)), DisplayCategory::Healthy);
        assert_eq!(classify(&status("running", Health::Starting, true)), DisplayCategory::Starting);
        assert_eq!(classify(&status("running", Health::Unhealthy, true)), DisplayCategory::Unhealthy);
    }

    #[test]
    fn test_classify_non_running_states() {
        assert_eq!(classify(&status("restarting", Health::Unknown, false)), DisplayCategory::Restarting);
        assert_eq!(classify(&status("paused", Health::Unknown, false)), DisplayCategory::Paused);
        assert_eq!(classify(&status("exited", Health::Unknown, false)), DisplayCategory::Stopped);
        assert_eq!(classify(&ContainerStatus::not_found("cid")), DisplayCategory::Stopped);
    }

    #[test]
    fn test_classify_rule_order() {
        // Running health rules are checked before the run-state rules
        assert_eq!(classify(&status("restarting", Health::Healthy, true)), DisplayCategory::Healthy);
        // An unrecognized health literal on a running container falls through to the state rules
        assert_eq!(
            classify(&status("running", Health::Other("none".to_string()), true)),
            DisplayCategory::Stopped
        );
        // Health is ignored when the container is not running
        assert_eq!(classify(&status("exited", Health::Healthy, false)), DisplayCategory::Stopped);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let samples = [
            status("running", Health::Healthy, true),
            status("running", Health::Starting, true),
            status("paused", Health::Unknown, false),
            ContainerStatus::not_found("cid"),
        ];
        for sample in &samples {
            assert_eq!(classify(sample), classify(sample));
        }
    }

    #[test]
    fn test_count_buckets() {
        assert_eq!(DisplayCategory::Healthy.bucket(), CountBucket::Healthy);
        assert_eq!(DisplayCategory::Starting.bucket(), CountBucket::Starting);
        for category in [
            DisplayCategory::Unhealthy,
            DisplayCategory::Restarting,
            DisplayCategory::Paused,
            DisplayCategory::Stopped,
        ] {
            assert_eq!(category.bucket(), CountBucket::Stopped);
        }
    }

    #[test]
    fn test_health_literals() {
        assert_eq!(Health::from("healthy"), Health::Healthy);
        assert_eq!(Health::from(""), Health::NoHealthcheck);
        assert_eq!(Health::from("degraded"), Health::Other("degraded".to_string()));
        assert_eq!(Health::from("degraded").to_string(), "degraded");
        assert_eq!(Health::NoHealthcheck.to_string(), "no-healthcheck");
    }

    #[test]
    fn test_observed_status() {
        let running = ContainerStatus::observed("cid", "running");
        assert!(running.is_running);
        assert_eq!(running.health, Health::Unknown);

        let exited = ContainerStatus::observed("cid", "exited");
        assert!(!exited.is_running);
        assert_eq!(exited.run_state, "exited");
    }
}
