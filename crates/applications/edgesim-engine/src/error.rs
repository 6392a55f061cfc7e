//! Error types for the simulation engine

use edgesim_core::PlacementError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::simulator::EngineState;
use crate::topology::TopologyError;

/// Engine result type
pub type Result<T> = std::result::Result<T, SimulationError>;

/// Which user-supplied hook failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HookKind {
    /// The per-tick resource management algorithm
    ResourceManagement,

    /// The per-tick stopping criterion
    StoppingCriterion,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookKind::ResourceManagement => write!(f, "resource management algorithm"),
            HookKind::StoppingCriterion => write!(f, "stopping criterion"),
        }
    }
}

/// Errors that end a simulation run or prevent it from starting
///
/// Recoverable placement rejections are [`PlacementError`]s returned to the
/// algorithm that requested them; they only show up here when an algorithm
/// chooses to propagate one, which makes it a hook failure.
#[derive(Error, Debug)]
pub enum SimulationError {
    /// A user hook returned an error; the run is aborted
    #[error("{hook} `{name}` failed at tick {tick}: {source}")]
    UserHookFailure {
        hook: HookKind,
        name: String,
        tick: u64,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// Topology could not be loaded; the engine never starts
    #[error(transparent)]
    TopologyLoad(#[from] TopologyError),

    /// Invalid engine configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation not allowed in the current engine state
    #[error("Cannot {operation} while the engine is {state}")]
    InvalidState {
        operation: &'static str,
        state: EngineState,
    },

    /// Placement error outside of a hook
    #[error("Placement error: {0}")]
    Placement(#[from] PlacementError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SimulationError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Tick at which a hook failed, if this is a hook failure
    pub fn failed_tick(&self) -> Option<u64> {
        match self {
            Self::UserHookFailure { tick, .. } => Some(*tick),
            _ => None,
        }
    }
}
