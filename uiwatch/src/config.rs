use crate::errors::AutomationError;
use crate::locator::DEFAULT_CAPTURE_DEPTH;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Monitor loop tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Pause between two poll cycles
    pub poll_interval_ms: u64,
    /// Upper bound for a single tree-wide search; 0 disables the bound
    pub search_timeout_ms: u64,
    /// Ancestor walk limit used when capturing a descriptor
    pub capture_max_depth: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            search_timeout_ms: 2000,
            capture_max_depth: DEFAULT_CAPTURE_DEPTH,
        }
    }
}

impl MonitorConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AutomationError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            AutomationError::InvalidArgument(format!("Cannot read {}: {e}", path.display()))
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn search_timeout(&self) -> Option<Duration> {
        (self.search_timeout_ms > 0).then(|| Duration::from_millis(self.search_timeout_ms))
    }
}
