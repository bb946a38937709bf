//! Driver configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Simulation driver parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Largest delta a single tick may advance, in seconds. Larger deltas
    /// (e.g. after the driver stalls) are clamped down to this.
    pub max_step_seconds: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_step_seconds: 1.0,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("max_step_seconds must be finite and > 0, got {0}")]
    InvalidMaxStep(f64),
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.max_step_seconds.is_finite() || self.max_step_seconds <= 0.0 {
            return Err(ConfigError::InvalidMaxStep(self.max_step_seconds));
        }
        Ok(())
    }

    /// Clamp a raw driver delta into `[0, max_step_seconds]`; negative or
    /// non-finite input becomes zero.
    pub fn clamp_step(&self, delta: f64) -> f64 {
        if !delta.is_finite() || delta <= 0.0 {
            return 0.0;
        }
        delta.min(self.max_step_seconds)
    }
}
