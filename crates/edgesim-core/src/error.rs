//! Error types for placement and registry operations

use std::fmt;
use thiserror::Error;

use crate::types::{HostId, ProvisioningState, Resources, ServiceId};

/// Result type for placement operations
pub type Result<T> = std::result::Result<T, PlacementError>;

/// A state-machine or capacity operation, named in transition errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Attach,
    Detach,
    Provision,
    Migrate,
    CompleteMigration,
    CancelMigration,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Transition::Attach => "attach",
            Transition::Detach => "detach",
            Transition::Provision => "provision",
            Transition::Migrate => "migrate",
            Transition::CompleteMigration => "complete migration of",
            Transition::CancelMigration => "cancel migration of",
        };
        f.write_str(name)
    }
}

/// Recoverable errors returned to whoever requested the operation
///
/// None of these abort a simulation run; the state of every entity is left
/// exactly as it was before the rejected call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlacementError {
    /// Target host lacks available resources for the service demand
    #[error("Insufficient capacity: {service} needs {demand} but {host} has {available} available")]
    InsufficientCapacity {
        service: ServiceId,
        host: HostId,
        demand: Resources,
        available: Resources,
    },

    /// Transition not permitted from the service's current state
    #[error("Invalid transition: cannot {transition} {service} while {state}")]
    InvalidTransition {
        service: ServiceId,
        state: ProvisioningState,
        transition: Transition,
    },

    /// No entity with that id is registered
    #[error("{kind} {id} not found")]
    UnknownEntity { kind: &'static str, id: u64 },

    /// An entity with that id is already registered
    #[error("{kind} {id} is already registered")]
    DuplicateEntity { kind: &'static str, id: u64 },

    /// Releasing a demand the host never accounted for
    #[error("Allocation underflow on {host}: cannot release {demand} from {allocated}")]
    AllocationUnderflow {
        host: HostId,
        demand: Resources,
        allocated: Resources,
    },
}

impl PlacementError {
    /// Create an invalid transition error
    pub fn invalid_transition(
        service: ServiceId,
        state: ProvisioningState,
        transition: Transition,
    ) -> Self {
        Self::InvalidTransition {
            service,
            state,
            transition,
        }
    }

    /// Whether this is a capacity rejection (as opposed to a state error)
    pub fn is_capacity(&self) -> bool {
        matches!(self, Self::InsufficientCapacity { .. })
    }
}
