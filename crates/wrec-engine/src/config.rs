use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Fixed playback delays, overridable per engine instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Settle delay after scrolling a step target into view.
    pub settle_ms: u64,
    /// Delay between typed characters during input replay.
    pub keystroke_ms: u64,
    /// Delay after the interaction, before the highlight is removed.
    pub post_action_ms: u64,
    /// Delay between consecutive steps.
    pub between_steps_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            settle_ms: 300,
            keystroke_ms: 50,
            post_action_ms: 200,
            between_steps_ms: 800,
        }
    }
}

impl TimingConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn keystroke(&self) -> Duration {
        Duration::from_millis(self.keystroke_ms)
    }

    pub fn post_action(&self) -> Duration {
        Duration::from_millis(self.post_action_ms)
    }

    pub fn between_steps(&self) -> Duration {
        Duration::from_millis(self.between_steps_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// The page's own origin; inbound messages from any other origin are
    /// dropped and outbound messages are scoped to it.
    pub origin: String,
    /// Source tag stamped on every outbound envelope.
    pub source: String,
    pub timing: TimingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost".to_string(),
            source: "wrec-recorder".to_string(),
            timing: TimingConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_origin(origin: &str) -> Self {
        Self {
            origin: origin.to_string(),
            ..Self::default()
        }
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }
}
