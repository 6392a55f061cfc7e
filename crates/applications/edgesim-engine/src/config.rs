//! Engine configuration
//!
//! The two hooks (algorithm and stopping criterion) are code, so they are
//! passed to [`Simulator::new`](crate::simulator::Simulator::new) directly.
//! Everything else lives here and can be loaded from a JSON file:
//!
//! ```json
//! {
//!   "tick_duration": 1.0,
//!   "tick_unit": "seconds",
//!   "max_ticks": 500,
//!   "migration_duration_ticks": 2,
//!   "parameters": { "headroom": 0.1 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{Result, SimulationError};

/// Default tick length (informational only)
pub const DEFAULT_TICK_DURATION: f64 = 1.0;

/// Default tick unit label (informational only)
pub const DEFAULT_TICK_UNIT: &str = "seconds";

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Simulated time per tick; reported, never used by the engine logic
    pub tick_duration: f64,

    /// Label for `tick_duration`
    pub tick_unit: String,

    /// Safety bound: halt after this many ticks even if the stopping
    /// criterion never returns true
    pub max_ticks: Option<u64>,

    /// Progress steps a migration takes to complete (1 = same tick)
    pub migration_duration_ticks: u64,

    /// Named parameters handed to the algorithm unchanged
    pub parameters: BTreeMap<String, Value>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            tick_duration: DEFAULT_TICK_DURATION,
            tick_unit: DEFAULT_TICK_UNIT.to_string(),
            max_ticks: None,
            migration_duration_ticks: 1,
            parameters: BTreeMap::new(),
        }
    }
}

impl SimulationConfig {
    /// Parse and validate a JSON configuration document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SimulationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Set the safety tick bound
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }

    /// Set how many progress steps a migration takes
    pub fn with_migration_duration(mut self, ticks: u64) -> Self {
        self.migration_duration_ticks = ticks;
        self
    }

    /// Add a named algorithm parameter
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if !(self.tick_duration.is_finite() && self.tick_duration > 0.0) {
            return Err(SimulationError::config(format!(
                "tick_duration must be a positive number, got {}",
                self.tick_duration
            )));
        }

        if self.migration_duration_ticks == 0 {
            return Err(SimulationError::config(
                "migration_duration_ticks must be at least 1",
            ));
        }

        if self.max_ticks == Some(0) {
            return Err(SimulationError::config("max_ticks must be at least 1"));
        }

        Ok(())
    }
}
