use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{ConciergeError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConciergeConfig {
    pub bus: BusConfig,
    pub coordinator: CoordinatorConfig,
    pub router: RouterConfig,
}

impl ConciergeConfig {
    pub async fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let content = fs::read_to_string(path).await?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let content =
            toml::to_string_pretty(self).map_err(|e| ConciergeError::Config(e.to_string()))?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Validate configuration values, collecting every violation.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.bus.queue_capacity == 0 {
            errors.push("bus.queue_capacity must be greater than 0");
        }
        if self.coordinator.barrier_timeout_secs == 0 {
            errors.push("coordinator.barrier_timeout_secs must be greater than 0");
        }
        if self.router.history_limit == 0 {
            errors.push("router.history_limit must be greater than 0");
        }
        if self.router.handoff_trigger.trim().is_empty() {
            errors.push("router.handoff_trigger must not be empty");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConciergeError::Config(errors.join("; ")))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Bounded per-instance delivery queue depth.
    pub queue_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            queue_capacity: crate::messaging::DEFAULT_QUEUE_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Upper bound on each directed sub-request awaited by the fan-in
    /// barrier. A subtask that misses it contributes a partial-plan line
    /// instead of hanging the coordinator.
    pub barrier_timeout_secs: u64,
}

impl CoordinatorConfig {
    pub fn barrier_timeout(&self) -> Duration {
        Duration::from_secs(self.barrier_timeout_secs)
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            barrier_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Per-session user-turn history retained for planning context.
    pub history_limit: usize,
    /// Phrase that marks a message as a composite request a specialist must
    /// hand back to the router.
    pub handoff_trigger: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            history_limit: 20,
            handoff_trigger: "travel plan".to_string(),
        }
    }
}
