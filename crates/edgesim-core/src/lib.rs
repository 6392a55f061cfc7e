//! edgesim Core - Shared types for the edge placement simulator
//!
//! This crate defines the data model used by the engine and by any
//! placement algorithm written against it:
//! - Resource vectors, edge servers and services
//! - Per-kind entity registries
//! - Capacity accounting (`attach` / `detach`)
//! - The provisioning state machine
//! - Placement error types

pub mod error;
pub mod provisioning;
pub mod registry;
pub mod resources;
pub mod types;

pub use error::*;
pub use provisioning::*;
pub use registry::*;
pub use resources::*;
pub use types::*;
