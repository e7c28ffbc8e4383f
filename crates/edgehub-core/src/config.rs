use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

/// Immutable identity, transport and timing configuration for a [`crate::SessionController`].
///
/// Constructed once at startup and shared read-only across every session attempt.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub project_id: String,
    pub node_id: String,
    pub placement_url: Option<Url>,
    /// Fallback direct URL used when `project_id`/`node_id` are incomplete ("test mode").
    pub ws_url: Url,
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
    pub transport_type: String,
    pub heartbeat_period: Duration,
}

impl ControllerConfig {
    /// Identity is complete only when both halves of the tuple are non-empty; this is
    /// what gates whether placement lookup runs at all, per §4.1 step 1.
    pub fn has_identity(&self) -> bool {
        !self.project_id.is_empty() && !self.node_id.is_empty()
    }
}

/// The fixed, process-wide translation from a message's `group` field to a target
/// local-module-group name (§3). Lifted to configuration per the REDESIGN FLAGS in §9;
/// `GroupMap::default()` reproduces the source's hard-coded table as the factory default.
#[derive(Debug, Clone)]
pub struct GroupMap {
    targets: BTreeMap<String, String>,
}

impl Default for GroupMap {
    fn default() -> Self {
        let targets = [
            ("resource", "meta"),
            ("twin", "twin"),
            ("app", "sync"),
            ("func", "meta"),
            ("user", "bus"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self { targets }
    }
}

impl GroupMap {
    pub fn new(targets: BTreeMap<String, String>) -> Self {
        Self { targets }
    }

    pub fn target_group(&self, message_group: &str) -> Option<&str> {
        self.targets.get(message_group).map(String::as_str)
    }

    /// Every distinct target group, used to bracket a session with connection-state
    /// events (§4.1 step 3, §6).
    pub fn distinct_targets(&self) -> Vec<&str> {
        let mut targets: Vec<&str> = self.targets.values().map(String::as_str).collect();
        targets.sort_unstable();
        targets.dedup();
        targets
    }
}
