//! Core types shared across edgesim components

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};

/// Resource vector used for both host capacity and service demand
///
/// Every dimension is an integer amount of abstract units. Missing
/// dimensions deserialize as zero so `{"cpu": 10}` is a valid vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Resources {
    pub cpu: u64,
    pub memory: u64,
    pub disk: u64,
}

impl Resources {
    /// The empty vector
    pub const ZERO: Resources = Resources {
        cpu: 0,
        memory: 0,
        disk: 0,
    };

    pub fn new(cpu: u64, memory: u64, disk: u64) -> Self {
        Resources { cpu, memory, disk }
    }

    /// CPU-only vector, the common case in small topologies
    pub fn cpu(cpu: u64) -> Self {
        Resources {
            cpu,
            ..Self::ZERO
        }
    }

    /// True when every dimension of `self` is <= the same dimension of `other`
    pub fn fits_within(&self, other: &Resources) -> bool {
        self.cpu <= other.cpu && self.memory <= other.memory && self.disk <= other.disk
    }

    /// Component-wise subtraction, `None` if any dimension would go negative
    pub fn checked_sub(&self, other: &Resources) -> Option<Resources> {
        Some(Resources {
            cpu: self.cpu.checked_sub(other.cpu)?,
            memory: self.memory.checked_sub(other.memory)?,
            disk: self.disk.checked_sub(other.disk)?,
        })
    }

    /// Component-wise subtraction clamped at zero
    pub fn saturating_sub(&self, other: &Resources) -> Resources {
        Resources {
            cpu: self.cpu.saturating_sub(other.cpu),
            memory: self.memory.saturating_sub(other.memory),
            disk: self.disk.saturating_sub(other.disk),
        }
    }

    /// Sum over all dimensions (unit-agnostic slack metric for heuristics)
    ///
    /// Saturates at `u64::MAX`.
    pub fn total(&self) -> u64 {
        self.cpu.saturating_add(self.memory).saturating_add(self.disk)
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl Add for Resources {
    type Output = Resources;

    fn add(self, rhs: Resources) -> Resources {
        Resources {
            cpu: self.cpu + rhs.cpu,
            memory: self.memory + rhs.memory,
            disk: self.disk + rhs.disk,
        }
    }
}

impl AddAssign for Resources {
    fn add_assign(&mut self, rhs: Resources) {
        *self = *self + rhs;
    }
}

impl fmt::Display for Resources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(cpu={}, memory={}, disk={})",
            self.cpu, self.memory, self.disk
        )
    }
}

/// Unique identifier for an edge server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostId(pub u64);

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "host-{}", self.0)
    }
}

impl From<HostId> for u64 {
    fn from(id: HostId) -> u64 {
        id.0
    }
}

/// Unique identifier for a service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(pub u64);

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "service-{}", self.0)
    }
}

impl From<ServiceId> for u64 {
    fn from(id: ServiceId) -> u64 {
        id.0
    }
}

/// Lifecycle state of a service, derived from its placement fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisioningState {
    /// No host, nothing in flight
    Unplaced,
    /// Being bound to its first host
    Provisioning,
    /// Attached to a host
    Placed,
    /// Attached to a host, moving to `migration_target`
    Migrating,
}

impl fmt::Display for ProvisioningState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProvisioningState::Unplaced => "unplaced",
            ProvisioningState::Provisioning => "provisioning",
            ProvisioningState::Placed => "placed",
            ProvisioningState::Migrating => "migrating",
        };
        f.write_str(name)
    }
}

/// An edge server with a fixed capacity vector
///
/// `allocated` and the hosted service list only change through
/// [`ResourceModel::attach`](crate::ResourceModel::attach) and
/// [`ResourceModel::detach`](crate::ResourceModel::detach).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeServer {
    pub(crate) id: HostId,
    pub(crate) name: Option<String>,
    pub(crate) capacity: Resources,
    pub(crate) allocated: Resources,
    pub(crate) services: Vec<ServiceId>,
}

impl EdgeServer {
    pub fn new(id: HostId, capacity: Resources) -> Self {
        EdgeServer {
            id,
            name: None,
            capacity,
            allocated: Resources::ZERO,
            services: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn id(&self) -> HostId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn capacity(&self) -> Resources {
        self.capacity
    }

    pub fn allocated(&self) -> Resources {
        self.allocated
    }

    /// Capacity not yet allocated to hosted services
    pub fn available(&self) -> Resources {
        self.capacity.saturating_sub(&self.allocated)
    }

    /// Services currently attached, in attach order
    pub fn services(&self) -> &[ServiceId] {
        &self.services
    }

    /// Fraction of total capacity in use, 0.0 for a zero-capacity host
    pub fn utilization(&self) -> f64 {
        let sum = |r: &Resources| r.cpu as f64 + r.memory as f64 + r.disk as f64;
        let capacity = sum(&self.capacity);
        if capacity == 0.0 {
            0.0
        } else {
            sum(&self.allocated) / capacity
        }
    }
}

/// A placeable workload with a resource demand
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Service {
    pub(crate) id: ServiceId,
    pub(crate) label: Option<String>,
    pub(crate) demand: Resources,
    pub(crate) server: Option<HostId>,
    pub(crate) being_provisioned: bool,
    pub(crate) migration_target: Option<HostId>,
}

impl Service {
    /// Create an unplaced service
    pub fn new(id: ServiceId, demand: Resources) -> Self {
        Service {
            id,
            label: None,
            demand,
            server: None,
            being_provisioned: false,
            migration_target: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn id(&self) -> ServiceId {
        self.id
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn demand(&self) -> Resources {
        self.demand
    }

    /// Host this service is attached to
    pub fn server(&self) -> Option<HostId> {
        self.server
    }

    pub fn being_provisioned(&self) -> bool {
        self.being_provisioned
    }

    /// Destination of an in-flight migration
    pub fn migration_target(&self) -> Option<HostId> {
        self.migration_target
    }

    pub fn state(&self) -> ProvisioningState {
        match (self.server, self.being_provisioned) {
            (None, false) => ProvisioningState::Unplaced,
            (None, true) => ProvisioningState::Provisioning,
            (Some(_), false) => ProvisioningState::Placed,
            (Some(_), true) => ProvisioningState::Migrating,
        }
    }

    pub fn is_placed(&self) -> bool {
        self.state() == ProvisioningState::Placed
    }
}
