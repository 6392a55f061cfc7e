//! edgesim Simulation Engine
//!
//! Tick-driven simulator for comparing edge service placement algorithms.
//! A run is a [`Simulator`] built from a [`SimulationConfig`], a
//! [`ResourceManagementAlgorithm`] and a [`StoppingCriterion`], initialized
//! from any [`TopologySource`].

pub mod config;
pub mod context;
pub mod error;
pub mod hooks;
pub mod policies;
pub mod simulator;
pub mod stopping;
pub mod topology;

pub use config::SimulationConfig;
pub use context::{SimulationClock, SimulationContext};
pub use error::{HookKind, Result, SimulationError};
pub use hooks::{ResourceManagementAlgorithm, StoppingCriterion};
pub use policies::PlacementStrategy;
pub use simulator::{EngineState, HaltReason, SimulationResult, Simulator, TickRecord};
pub use stopping::{AllServicesPlaced, TickLimit};
pub use topology::{JsonTopologyFile, SyntheticTopology, Topology, TopologyError, TopologySource};
