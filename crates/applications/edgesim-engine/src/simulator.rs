//! Time-stepped placement simulator
//!
//! Every tick runs the same sub-steps in a fixed order:
//! 1. the resource management algorithm decides (provision / migrate)
//! 2. in-flight migrations make progress
//! 3. the stopping criterion is evaluated
//! 4. the clock advances, including on the halting tick
//!
//! A hook error aborts the run at the failing sub-step. Nothing is rolled
//! back: the context keeps every transition made before the failure.

use chrono::{DateTime, Utc};
use edgesim_core::{HostId, ProvisioningState, Resources, ServiceId};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, error, info, warn};

use crate::config::SimulationConfig;
use crate::context::SimulationContext;
use crate::error::{HookKind, Result, SimulationError};
use crate::hooks::{ResourceManagementAlgorithm, StoppingCriterion};
use crate::topology::TopologySource;

/// Lifecycle of a [`Simulator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    /// Created, no topology loaded
    Uninitialized,

    /// Topology loaded, no tick run yet
    Initialized,

    /// At least one tick run, not halted
    Running,

    /// Stopped normally; final state is inspectable
    Halted,

    /// A hook failed; final state is inspectable
    Aborted,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineState::Uninitialized => "uninitialized",
            EngineState::Initialized => "initialized",
            EngineState::Running => "running",
            EngineState::Halted => "halted",
            EngineState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Why a run halted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HaltReason {
    /// The stopping criterion returned true
    StoppingCriterion,

    /// `max_ticks` ticks completed without the criterion returning true
    TickLimitReached,
}

/// What happened during one tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickRecord {
    /// 1-based tick number
    pub tick: u64,
    pub placed: usize,
    pub unplaced: usize,
    pub migrating: usize,
    pub provisioned: usize,
    pub migrations_requested: usize,
    pub migrations_completed: usize,
    pub migrations_aborted: usize,
    pub rejected_transitions: usize,
    /// Stopping criterion result for this tick
    pub stopped: bool,
}

/// Final location of one service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRecord {
    pub service: ServiceId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub host: Option<HostId>,
    pub state: ProvisioningState,
}

/// Final usage of one edge server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostUsage {
    pub host: HostId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub capacity: Resources,
    pub allocated: Resources,
    pub utilization: f64,
    pub services: Vec<ServiceId>,
}

/// Result of a simulation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub algorithm: String,
    pub stopping_criterion: String,
    pub halt_reason: HaltReason,
    /// Completed ticks, including the halting one
    pub ticks: u64,
    /// Simulated time covered, in `tick_unit`
    pub simulated_time: f64,
    pub tick_unit: String,
    pub total_services: usize,
    pub placed_services: usize,
    pub active_hosts: usize,
    pub placements: Vec<PlacementRecord>,
    pub host_usage: Vec<HostUsage>,
    pub history: Vec<TickRecord>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Time-stepped simulator
pub struct Simulator {
    config: SimulationConfig,
    algorithm: Box<dyn ResourceManagementAlgorithm>,
    criterion: Box<dyn StoppingCriterion>,
    context: SimulationContext,
    state: EngineState,
    halt_reason: Option<HaltReason>,
    history: Vec<TickRecord>,
    started_at: Option<DateTime<Utc>>,
}

impl Simulator {
    /// Create a simulator; the configuration is validated up front
    pub fn new(
        config: SimulationConfig,
        algorithm: Box<dyn ResourceManagementAlgorithm>,
        criterion: Box<dyn StoppingCriterion>,
    ) -> Result<Self> {
        config.validate()?;
        let context = SimulationContext::new(&config);

        Ok(Simulator {
            config,
            algorithm,
            criterion,
            context,
            state: EngineState::Uninitialized,
            halt_reason: None,
            history: Vec::new(),
            started_at: None,
        })
    }

    /// Load the topology and register every host and service
    ///
    /// A load failure is returned unchanged and leaves the engine
    /// uninitialized.
    pub fn initialize(&mut self, source: &dyn TopologySource) -> Result<()> {
        self.expect_state("initialize", &[EngineState::Uninitialized])?;

        let (hosts, services) = source.load()?.into_registries()?;
        info!(
            source = %source.describe(),
            edge_servers = hosts.count(),
            services = services.count(),
            "Topology loaded"
        );

        self.context = SimulationContext::with_registries(&self.config, hosts, services);
        self.state = EngineState::Initialized;
        Ok(())
    }

    /// Run exactly one tick
    pub fn step(&mut self) -> Result<TickRecord> {
        self.expect_state("step", &[EngineState::Initialized, EngineState::Running])?;

        if self.state == EngineState::Initialized {
            self.start();
        }

        let tick = self.context.current_tick();
        debug!(tick, "Tick started");

        // 1. Decide
        if let Err(e) = self.algorithm.decide(&mut self.context) {
            return Err(self.abort(HookKind::ResourceManagement, tick, e));
        }
        let activity = self.context.take_activity();

        // 2. Migration progress
        let progress = self.context.advance_migrations();

        // 3. Stopping check
        let stopped = match self.criterion.should_stop(&self.context) {
            Ok(stopped) => stopped,
            Err(e) => return Err(self.abort(HookKind::StoppingCriterion, tick, e)),
        };

        // 4. Clock advance
        self.context.clock_mut().advance();

        let record = TickRecord {
            tick,
            placed: self.context.placed_count(),
            unplaced: self.context.count_in(ProvisioningState::Unplaced),
            migrating: self.context.count_in(ProvisioningState::Migrating),
            provisioned: activity.provisioned,
            migrations_requested: activity.migrations_requested,
            migrations_completed: progress.completed.len(),
            migrations_aborted: progress.aborted.len(),
            rejected_transitions: activity.rejected_transitions,
            stopped,
        };
        debug!(
            tick,
            placed = record.placed,
            unplaced = record.unplaced,
            migrating = record.migrating,
            "Tick completed"
        );
        self.history.push(record.clone());

        if stopped {
            self.halt(HaltReason::StoppingCriterion);
        } else if let Some(max_ticks) = self.config.max_ticks {
            if self.context.clock().completed_ticks() >= max_ticks {
                warn!(
                    max_ticks,
                    criterion = self.criterion.name(),
                    "Tick limit reached before the stopping criterion was met"
                );
                self.halt(HaltReason::TickLimitReached);
            }
        }

        Ok(record)
    }

    /// Run ticks until the run halts
    ///
    /// Without `max_ticks` this only returns once the stopping criterion
    /// returns true.
    pub fn run_model(&mut self) -> Result<SimulationResult> {
        self.expect_state("run", &[EngineState::Initialized, EngineState::Running])?;

        info!(
            algorithm = self.algorithm.name(),
            criterion = self.criterion.name(),
            max_ticks = ?self.config.max_ticks,
            "Starting simulation"
        );

        while self.state != EngineState::Halted {
            self.step()?;
        }

        self.result()
    }

    /// Summary of a halted run
    pub fn result(&self) -> Result<SimulationResult> {
        self.expect_state("summarize", &[EngineState::Halted])?;

        let (Some(halt_reason), Some(started_at)) = (self.halt_reason, self.started_at) else {
            return Err(SimulationError::InvalidState {
                operation: "summarize",
                state: self.state,
            });
        };

        let ctx = &self.context;
        let placements = ctx
            .services()
            .all()
            .map(|service| PlacementRecord {
                service: service.id(),
                label: service.label().map(str::to_string),
                host: service.server(),
                state: service.state(),
            })
            .collect();
        let host_usage: Vec<HostUsage> = ctx
            .hosts()
            .all()
            .map(|host| HostUsage {
                host: host.id(),
                name: host.name().map(str::to_string),
                capacity: host.capacity(),
                allocated: host.allocated(),
                utilization: host.utilization(),
                services: host.services().to_vec(),
            })
            .collect();

        Ok(SimulationResult {
            algorithm: self.algorithm.name().to_string(),
            stopping_criterion: self.criterion.name().to_string(),
            halt_reason,
            ticks: ctx.clock().completed_ticks(),
            simulated_time: ctx.clock().elapsed(),
            tick_unit: ctx.clock().tick_unit().to_string(),
            total_services: ctx.services().count(),
            placed_services: ctx.placed_count(),
            active_hosts: host_usage.iter().filter(|h| !h.services.is_empty()).count(),
            placements,
            host_usage,
            history: self.history.clone(),
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Read access to the simulation state
    pub fn context(&self) -> &SimulationContext {
        &self.context
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn halt_reason(&self) -> Option<HaltReason> {
        self.halt_reason
    }

    pub fn history(&self) -> &[TickRecord] {
        &self.history
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    fn start(&mut self) {
        self.context.clock_mut().start();
        self.started_at = Some(Utc::now());
        self.state = EngineState::Running;
    }

    fn halt(&mut self, reason: HaltReason) {
        self.context.clock_mut().stop();
        self.halt_reason = Some(reason);
        self.state = EngineState::Halted;

        info!(
            reason = ?reason,
            ticks = self.context.clock().completed_ticks(),
            placed = self.context.placed_count(),
            total = self.context.services().count(),
            "Simulation halted"
        );
    }

    fn abort(&mut self, hook: HookKind, tick: u64, source: anyhow::Error) -> SimulationError {
        self.context.clock_mut().stop();
        self.state = EngineState::Aborted;

        let name = match hook {
            HookKind::ResourceManagement => self.algorithm.name(),
            HookKind::StoppingCriterion => self.criterion.name(),
        }
        .to_string();

        error!(%hook, name = %name, tick, error = %source, "Hook failed, aborting simulation");

        SimulationError::UserHookFailure {
            hook,
            name,
            tick,
            source: source.into(),
        }
    }

    fn expect_state(&self, operation: &'static str, allowed: &[EngineState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(SimulationError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policies::{Consolidation, FirstFit, PlacementStrategy};
    use crate::stopping::{AllServicesPlaced, TickLimit};
    use crate::topology::{JsonTopologyFile, SyntheticTopology, Topology};

    fn topology(host_cpus: &[u64], service_cpus: &[u64]) -> Topology {
        let mut topology = Topology::new();
        for (i, cpu) in host_cpus.iter().enumerate() {
            topology = topology.with_edge_server(i as u64 + 1, Resources::cpu(*cpu));
        }
        for (i, cpu) in service_cpus.iter().enumerate() {
            topology = topology.with_service(i as u64 + 1, Resources::cpu(*cpu));
        }
        topology
    }

    fn simulator(config: SimulationConfig, source: &dyn TopologySource) -> Simulator {
        let mut sim =
            Simulator::new(config, Box::new(FirstFit), Box::new(AllServicesPlaced)).unwrap();
        sim.initialize(source).unwrap();
        sim
    }

    /// Every host's allocation fits its capacity and matches its services
    fn assert_capacity_invariant(ctx: &SimulationContext) {
        for host in ctx.hosts().all() {
            assert!(host.allocated().fits_within(&host.capacity()));

            let demand = ctx
                .services()
                .all()
                .filter(|s| s.server() == Some(host.id()))
                .fold(Resources::ZERO, |acc, s| acc + s.demand());
            assert_eq!(host.allocated(), demand);
        }
    }

    #[test]
    fn test_single_host_cannot_fit_both() {
        let config = SimulationConfig::default().with_max_ticks(5);
        let mut sim = simulator(config, &topology(&[10], &[6, 6]));

        let result = sim.run_model().unwrap();

        assert_eq!(result.halt_reason, HaltReason::TickLimitReached);
        assert_eq!(result.ticks, 5);
        assert_eq!(result.placed_services, 1);
        assert_eq!(result.placements[0].host, Some(HostId(1)));
        assert_eq!(result.placements[1].state, ProvisioningState::Unplaced);
        assert_eq!(sim.context().host(HostId(1)).unwrap().allocated().cpu, 6);
    }

    #[test]
    fn test_one_service_per_host() {
        let mut sim = simulator(SimulationConfig::default(), &topology(&[10, 10], &[6, 6]));

        let result = sim.run_model().unwrap();

        assert_eq!(result.halt_reason, HaltReason::StoppingCriterion);
        assert_eq!(result.ticks, 1);
        assert_eq!(result.placements[0].host, Some(HostId(1)));
        assert_eq!(result.placements[1].host, Some(HostId(2)));
        assert_eq!(result.history[0].provisioned, 2);
        assert!(result.history[0].stopped);
    }

    #[test]
    fn test_no_services_halts_after_first_tick() {
        let mut sim = simulator(SimulationConfig::default(), &topology(&[10], &[]));

        let result = sim.run_model().unwrap();

        assert_eq!(result.ticks, 1);
        assert_eq!(result.halt_reason, HaltReason::StoppingCriterion);
        assert_eq!(result.history[0].provisioned, 0);
        assert!(sim.context().host(HostId(1)).unwrap().allocated().is_zero());
    }

    #[test]
    fn test_capacity_invariant_every_tick() {
        let config = SimulationConfig::default().with_max_ticks(20);
        let source = SyntheticTopology::new(4, 30, 42);

        for strategy in [
            PlacementStrategy::FirstFit,
            PlacementStrategy::BestFit,
            PlacementStrategy::WorstFit,
            PlacementStrategy::Optimal,
            PlacementStrategy::Consolidation,
        ] {
            let mut sim =
                Simulator::new(config.clone(), strategy.build(), Box::new(AllServicesPlaced))
                    .unwrap();
            sim.initialize(&source).unwrap();

            while sim.state() != EngineState::Halted {
                sim.step().unwrap();
                assert_capacity_invariant(sim.context());
            }
        }
    }

    #[test]
    fn test_placement_is_monotonic_without_migrations() {
        let config = SimulationConfig::default().with_max_ticks(10);
        let mut sim = Simulator::new(
            config,
            PlacementStrategy::Optimal.build(),
            Box::new(AllServicesPlaced),
        )
        .unwrap();
        sim.initialize(&SyntheticTopology::new(3, 25, 9)).unwrap();

        let result = sim.run_model().unwrap();

        assert!(result.history.windows(2).all(|w| w[0].placed <= w[1].placed));
        // Placed services never become unplaced again
        let placed_at_end: Vec<ServiceId> = result
            .placements
            .iter()
            .filter(|p| p.host.is_some())
            .map(|p| p.service)
            .collect();
        assert_eq!(placed_at_end.len(), result.placed_services);
    }

    #[test]
    fn test_halt_is_final() {
        let mut sim = simulator(SimulationConfig::default(), &topology(&[10], &[4]));
        let first = sim.run_model().unwrap();

        let err = sim.run_model().unwrap_err();
        assert!(matches!(
            err,
            SimulationError::InvalidState {
                state: EngineState::Halted,
                ..
            }
        ));
        assert!(sim.step().is_err());

        let again = sim.result().unwrap();
        assert_eq!(again.ticks, first.ticks);
        assert_eq!(again.placements, first.placements);
        assert_eq!(sim.context().clock().completed_ticks(), 1);
        assert!(!sim.context().clock().is_running());
        assert!(AllServicesPlaced.should_stop(sim.context()).unwrap());
        assert!(AllServicesPlaced.should_stop(sim.context()).unwrap());
    }

    #[test]
    fn test_algorithm_failure_reports_tick() {
        let algorithm = |ctx: &mut SimulationContext| -> anyhow::Result<()> {
            if ctx.current_tick() == 2 {
                anyhow::bail!("placement backend unavailable");
            }
            ctx.provision(ServiceId(1), HostId(1))?;
            Ok(())
        };
        let mut sim = Simulator::new(
            SimulationConfig::default(),
            Box::new(algorithm),
            Box::new(TickLimit::new(10)),
        )
        .unwrap();
        sim.initialize(&topology(&[10], &[4, 4])).unwrap();

        let err = sim.run_model().unwrap_err();

        assert_eq!(err.failed_tick(), Some(2));
        assert!(matches!(
            err,
            SimulationError::UserHookFailure {
                hook: HookKind::ResourceManagement,
                ..
            }
        ));
        assert!(err.to_string().contains("placement backend unavailable"));
        assert_eq!(sim.state(), EngineState::Aborted);
        // Work from tick 1 is kept, tick 2 never completed
        assert_eq!(sim.context().clock().completed_ticks(), 1);
        assert!(sim.context().service(ServiceId(1)).unwrap().is_placed());
        assert!(sim.result().is_err());
    }

    #[test]
    fn test_criterion_failure_aborts() {
        struct Failing;

        impl StoppingCriterion for Failing {
            fn should_stop(&self, _: &SimulationContext) -> anyhow::Result<bool> {
                anyhow::bail!("metrics source missing")
            }

            fn name(&self) -> &str {
                "Failing"
            }
        }

        let mut sim =
            Simulator::new(SimulationConfig::default(), Box::new(FirstFit), Box::new(Failing))
                .unwrap();
        sim.initialize(&topology(&[10], &[4])).unwrap();

        let err = sim.step().unwrap_err();

        match err {
            SimulationError::UserHookFailure { hook, name, tick, .. } => {
                assert_eq!(hook, HookKind::StoppingCriterion);
                assert_eq!(name, "Failing");
                assert_eq!(tick, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
        // The decision sub-step already ran
        assert_eq!(sim.context().placed_count(), 1);
        assert_eq!(sim.state(), EngineState::Aborted);
    }

    #[test]
    fn test_topology_load_failure_prevents_run() {
        let mut sim =
            Simulator::new(SimulationConfig::default(), Box::new(FirstFit), Box::new(AllServicesPlaced))
                .unwrap();

        let err = sim
            .initialize(&JsonTopologyFile::new("/nonexistent/edgesim/topology.json"))
            .unwrap_err();

        assert!(matches!(err, SimulationError::TopologyLoad(_)));
        assert_eq!(sim.state(), EngineState::Uninitialized);
        assert!(matches!(
            sim.run_model(),
            Err(SimulationError::InvalidState { .. })
        ));
        assert!(sim.history().is_empty());
    }

    #[test]
    fn test_invalid_states() {
        let mut sim =
            Simulator::new(SimulationConfig::default(), Box::new(FirstFit), Box::new(AllServicesPlaced))
                .unwrap();
        assert!(sim.step().is_err());

        sim.initialize(&topology(&[10], &[4])).unwrap();
        let err = sim.initialize(&topology(&[10], &[4])).unwrap_err();
        assert_eq!(err.to_string(), "Cannot initialize while the engine is initialized");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SimulationConfig {
            tick_duration: 0.0,
            ..SimulationConfig::default()
        };

        let result = Simulator::new(config, Box::new(FirstFit), Box::new(AllServicesPlaced));
        assert!(matches!(result, Err(SimulationError::Config(_))));
    }

    #[test]
    fn test_consolidation_migrates_within_tick() {
        let mut sim = Simulator::new(
            SimulationConfig::default().with_max_ticks(10),
            Box::new(Consolidation),
            Box::new(AllServicesPlaced),
        )
        .unwrap();
        sim.initialize(&topology(&[10, 10], &[6, 3])).unwrap();

        let result = sim.run_model().unwrap();

        assert_eq!(result.halt_reason, HaltReason::StoppingCriterion);
        assert_eq!(result.ticks, 1);
        assert_eq!(result.history[0].migrations_requested, 1);
        assert_eq!(result.history[0].migrations_completed, 1);
        assert_eq!(result.active_hosts, 1);
        assert_eq!(result.host_usage[0].services, vec![ServiceId(1), ServiceId(2)]);
        assert_capacity_invariant(sim.context());
    }

    #[test]
    fn test_slow_migration_delays_halt() {
        let config = SimulationConfig::default()
            .with_migration_duration(3)
            .with_max_ticks(10);
        let mut sim =
            Simulator::new(config, Box::new(Consolidation), Box::new(AllServicesPlaced)).unwrap();
        sim.initialize(&topology(&[10, 10], &[6, 3])).unwrap();

        let result = sim.run_model().unwrap();

        // Requested on tick 1, lands on tick 3
        assert_eq!(result.ticks, 3);
        assert_eq!(result.history[0].migrating, 1);
        assert!(!result.history[1].stopped);
        assert_eq!(result.history[2].migrations_completed, 1);
        assert_eq!(result.active_hosts, 1);
    }

    #[test]
    fn test_huge_capacity_runs_to_halt() {
        let document = format!(
            r#"{{
                "edge_servers": [
                    {{"id": 1, "capacity": {{"cpu": {max}, "memory": 1}}}},
                    {{"id": 2, "capacity": {{"cpu": {max}, "memory": {max}, "disk": {max}}}}}
                ],
                "services": [
                    {{"id": 1, "demand": {{"cpu": 6}}}},
                    {{"id": 2, "demand": {{"cpu": 6, "memory": 1}}}}
                ]
            }}"#,
            max = u64::MAX
        );
        let source = Topology::from_json_str(&document).unwrap();

        for strategy in [
            PlacementStrategy::FirstFit,
            PlacementStrategy::BestFit,
            PlacementStrategy::WorstFit,
            PlacementStrategy::Optimal,
            PlacementStrategy::Consolidation,
        ] {
            let mut sim = Simulator::new(
                SimulationConfig::default().with_max_ticks(5),
                strategy.build(),
                Box::new(AllServicesPlaced),
            )
            .unwrap();
            sim.initialize(&source).unwrap();

            let result = sim.run_model().unwrap();

            assert_eq!(sim.state(), EngineState::Halted);
            assert_eq!(result.placed_services, 2);
            assert!(result.host_usage.iter().all(|h| h.utilization.is_finite()));
            assert_capacity_invariant(sim.context());
        }
    }

    #[test]
    fn test_closure_hooks_with_parameters() {
        // Places at most `batch` services per tick, in registry order
        let algorithm = |ctx: &mut SimulationContext| -> anyhow::Result<()> {
            let batch = ctx
                .parameter("batch")
                .and_then(|v| v.as_u64())
                .ok_or_else(|| anyhow::anyhow!("missing batch parameter"))?;
            let pending: Vec<ServiceId> = ctx
                .unplaced_services()
                .map(|s| s.id())
                .take(batch as usize)
                .collect();
            for service in pending {
                ctx.provision(service, HostId(1))?;
            }
            Ok(())
        };
        let criterion = |ctx: &SimulationContext| ctx.placed_count() >= 5;

        let config = SimulationConfig::default()
            .with_parameter("batch", 2)
            .with_max_ticks(10);
        let mut sim = Simulator::new(config, Box::new(algorithm), Box::new(criterion)).unwrap();
        sim.initialize(&topology(&[100], &[1, 1, 1, 1, 1])).unwrap();

        let result = sim.run_model().unwrap();

        assert_eq!(result.halt_reason, HaltReason::StoppingCriterion);
        assert_eq!(result.ticks, 3);
        assert_eq!(result.algorithm, "custom");
        assert_eq!(result.stopping_criterion, "custom");
        let provisioned: Vec<usize> = result.history.iter().map(|t| t.provisioned).collect();
        assert_eq!(provisioned, vec![2, 2, 1]);
    }

    #[test]
    fn test_missing_parameter_aborts_run() {
        let algorithm = |ctx: &mut SimulationContext| -> anyhow::Result<()> {
            ctx.parameter("batch")
                .ok_or_else(|| anyhow::anyhow!("missing batch parameter"))?;
            Ok(())
        };
        let mut sim = Simulator::new(
            SimulationConfig::default(),
            Box::new(algorithm),
            Box::new(AllServicesPlaced),
        )
        .unwrap();
        sim.initialize(&topology(&[10], &[1])).unwrap();

        let err = sim.run_model().unwrap_err();
        assert_eq!(err.failed_tick(), Some(1));
        assert!(err.to_string().contains("missing batch parameter"));
    }

    #[test]
    fn test_result_serializes() {
        let mut sim = simulator(SimulationConfig::default(), &topology(&[10], &[4]));
        let result = sim.run_model().unwrap();

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["halt_reason"], "stopping_criterion");
        assert_eq!(json["algorithm"], "FirstFit");
        assert_eq!(json["placements"][0]["state"], "placed");
        assert_eq!(json["placements"][0]["host"], 1);
    }
}
