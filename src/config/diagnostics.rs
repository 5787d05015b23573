use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DiagnosticsConfig {
    /// Log informational cache events (observer changes, updates) at debug level
    #[serde(default = "default_log_observer_events")]
    pub log_observer_events: bool,

    /// Upper bound on diagnostic listeners attached to one bridge
    #[serde(default = "default_max_listeners")]
    pub max_listeners: usize,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            log_observer_events: default_log_observer_events(),
            max_listeners: default_max_listeners(),
        }
    }
}

impl DiagnosticsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_listeners == 0 {
            return Err(Error::InvalidConfig("diagnostics.max_listeners must be at least 1".into()));
        }
        Ok(())
    }
}

fn default_log_observer_events() -> bool {
    true
}

fn default_max_listeners() -> usize {
    64
}
