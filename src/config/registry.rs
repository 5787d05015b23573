use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RegistryConfig {
    /// Subscriptions pre-allocated in the registry map
    #[serde(default = "default_initial_capacity")]
    pub initial_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            initial_capacity: default_initial_capacity(),
        }
    }
}

impl RegistryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.initial_capacity > MAX_INITIAL_CAPACITY {
            return Err(Error::InvalidConfig(format!(
                "registry.initial_capacity {} exceeds maximum of {}",
                self.initial_capacity, MAX_INITIAL_CAPACITY
            )));
        }
        Ok(())
    }
}

const MAX_INITIAL_CAPACITY: usize = 1 << 20;

fn default_initial_capacity() -> usize {
    64
}
