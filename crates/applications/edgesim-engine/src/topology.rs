//! Topology sources
//!
//! The engine only needs a populated set of edge servers and services before
//! the first tick. Anything implementing [`TopologySource`] can provide it:
//! - [`Topology`]: an in-memory description (also the JSON interchange shape)
//! - [`JsonTopologyFile`]: a topology document on disk
//! - [`SyntheticTopology`]: seeded random hosts and services

use edgesim_core::{EdgeServer, EntityRegistry, HostId, PlacementError, Resources, Service, ServiceId};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading a topology
#[derive(Error, Debug)]
pub enum TopologyError {
    /// Topology file could not be read
    #[error("Failed to read topology {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Topology document is not valid JSON for the expected shape
    #[error("Invalid topology document: {0}")]
    Json(#[from] serde_json::Error),

    /// Topology content is inconsistent
    #[error("Invalid topology: {0}")]
    Invalid(String),

    /// Entity could not be registered (duplicate id)
    #[error("Topology registration failed: {0}")]
    Registration(#[from] PlacementError),
}

/// Anything that can produce the initial set of hosts and services
pub trait TopologySource {
    fn load(&self) -> Result<Topology, TopologyError>;

    /// Short description for logs
    fn describe(&self) -> String {
        "in-memory topology".to_string()
    }
}

/// Edge server as described in a topology document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeServerSpec {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub capacity: Resources,
}

/// Service as described in a topology document
///
/// Services always start unplaced, so there is no host field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub demand: Resources,
}

/// Initial hosts and services, in registration order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    #[serde(default)]
    pub edge_servers: Vec<EdgeServerSpec>,
    #[serde(default)]
    pub services: Vec<ServiceSpec>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_edge_server(mut self, id: u64, capacity: Resources) -> Self {
        self.edge_servers.push(EdgeServerSpec {
            id,
            name: None,
            capacity,
        });
        self
    }

    pub fn with_service(mut self, id: u64, demand: Resources) -> Self {
        self.services.push(ServiceSpec {
            id,
            label: None,
            demand,
        });
        self
    }

    /// Parse a topology document
    pub fn from_json_str(json: &str) -> Result<Self, TopologyError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build the registries the engine runs on
    pub fn into_registries(
        self,
    ) -> Result<(EntityRegistry<EdgeServer>, EntityRegistry<Service>), TopologyError> {
        let mut hosts = EntityRegistry::new();
        for spec in self.edge_servers {
            let mut host = EdgeServer::new(HostId(spec.id), spec.capacity);
            if let Some(name) = spec.name {
                host = host.with_name(name);
            }
            hosts.register(host)?;
        }

        let mut services = EntityRegistry::new();
        for spec in self.services {
            let mut service = Service::new(ServiceId(spec.id), spec.demand);
            if let Some(label) = spec.label {
                service = service.with_label(label);
            }
            services.register(service)?;
        }

        Ok((hosts, services))
    }
}

impl TopologySource for Topology {
    fn load(&self) -> Result<Topology, TopologyError> {
        Ok(self.clone())
    }
}

/// Topology document read from disk
#[derive(Debug, Clone)]
pub struct JsonTopologyFile {
    path: PathBuf,
}

impl JsonTopologyFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        JsonTopologyFile {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl TopologySource for JsonTopologyFile {
    fn load(&self) -> Result<Topology, TopologyError> {
        let json = fs::read_to_string(&self.path).map_err(|source| TopologyError::Io {
            path: self.path.clone(),
            source,
        })?;
        Topology::from_json_str(&json)
    }

    fn describe(&self) -> String {
        format!("topology file {}", self.path.display())
    }
}

/// Seeded random topology generator
///
/// Each resource dimension is drawn from a normal distribution, rounded and
/// clamped to at least 1. Same seed, same topology.
#[derive(Debug, Clone)]
pub struct SyntheticTopology {
    hosts: usize,
    services: usize,
    seed: u64,
    host_capacity_mean: Resources,
    service_demand_mean: Resources,
    /// Standard deviation as a fraction of the mean
    relative_spread: f64,
}

impl SyntheticTopology {
    /// Create a generator with default edge-server and service sizes
    pub fn new(hosts: usize, services: usize, seed: u64) -> Self {
        SyntheticTopology {
            hosts,
            services,
            seed,
            host_capacity_mean: Resources::new(16, 32, 256),
            service_demand_mean: Resources::new(4, 8, 32),
            relative_spread: 0.25,
        }
    }

    pub fn with_host_capacity(mut self, mean: Resources) -> Self {
        self.host_capacity_mean = mean;
        self
    }

    pub fn with_service_demand(mut self, mean: Resources) -> Self {
        self.service_demand_mean = mean;
        self
    }

    pub fn with_relative_spread(mut self, spread: f64) -> Self {
        self.relative_spread = spread;
        self
    }

    fn sample(&self, mean: Resources, rng: &mut StdRng) -> Result<Resources, TopologyError> {
        let draw = |mean: u64, rng: &mut StdRng| -> Result<u64, TopologyError> {
            let mean = mean as f64;
            let normal = Normal::new(mean, mean * self.relative_spread)
                .map_err(|e| TopologyError::Invalid(format!("bad distribution: {e}")))?;
            Ok(normal.sample(rng).round().max(1.0) as u64)
        };

        Ok(Resources {
            cpu: draw(mean.cpu, rng)?,
            memory: draw(mean.memory, rng)?,
            disk: draw(mean.disk, rng)?,
        })
    }
}

impl TopologySource for SyntheticTopology {
    fn load(&self) -> Result<Topology, TopologyError> {
        if !(self.relative_spread.is_finite() && self.relative_spread >= 0.0) {
            return Err(TopologyError::Invalid(format!(
                "relative spread must be non-negative, got {}",
                self.relative_spread
            )));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut topology = Topology::new();

        for id in 1..=self.hosts as u64 {
            let capacity = self.sample(self.host_capacity_mean, &mut rng)?;
            topology.edge_servers.push(EdgeServerSpec {
                id,
                name: Some(format!("edge-{id}")),
                capacity,
            });
        }

        for id in 1..=self.services as u64 {
            let demand = self.sample(self.service_demand_mean, &mut rng)?;
            topology.services.push(ServiceSpec {
                id,
                label: None,
                demand,
            });
        }

        Ok(topology)
    }

    fn describe(&self) -> String {
        format!(
            "synthetic topology ({} edge servers, {} services, seed {})",
            self.hosts, self.services, self.seed
        )
    }
}
