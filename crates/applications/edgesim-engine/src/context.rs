//! Simulation context handed to the per-tick hooks
//!
//! [`SimulationContext`] owns both entity registries, the clock, the
//! algorithm parameters and the in-flight migrations. Hooks get it by
//! reference: algorithms read everything and change state only through
//! [`provision`](SimulationContext::provision),
//! [`migrate`](SimulationContext::migrate) and
//! [`cancel_migration`](SimulationContext::cancel_migration); stopping
//! criteria get a shared reference and can only read.

use edgesim_core::{
    EdgeServer, EntityRegistry, HostId, PlacementError, ProvisioningState,
    ProvisioningStateMachine, ResourceModel, Service, ServiceId, Transition,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::config::SimulationConfig;

/// Discrete simulation clock
#[derive(Debug, Clone, Serialize)]
pub struct SimulationClock {
    completed_ticks: u64,
    tick_duration: f64,
    tick_unit: String,
    running: bool,
}

impl SimulationClock {
    pub fn new(tick_duration: f64, tick_unit: impl Into<String>) -> Self {
        SimulationClock {
            completed_ticks: 0,
            tick_duration,
            tick_unit: tick_unit.into(),
            running: false,
        }
    }

    /// Number of fully completed ticks
    pub fn completed_ticks(&self) -> u64 {
        self.completed_ticks
    }

    /// 1-based number of the tick in progress (or the next one to run)
    pub fn current_tick(&self) -> u64 {
        self.completed_ticks + 1
    }

    /// Simulated time covered by the completed ticks
    pub fn elapsed(&self) -> f64 {
        self.completed_ticks as f64 * self.tick_duration
    }

    pub fn tick_duration(&self) -> f64 {
        self.tick_duration
    }

    pub fn tick_unit(&self) -> &str {
        &self.tick_unit
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub(crate) fn start(&mut self) {
        self.running = true;
    }

    pub(crate) fn stop(&mut self) {
        self.running = false;
    }

    pub(crate) fn advance(&mut self) {
        self.completed_ticks += 1;
    }
}

/// A migration waiting for the engine's progress step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingMigration {
    pub service: ServiceId,
    pub source: HostId,
    pub target: HostId,
    /// Progress steps left before completion
    pub remaining_ticks: u64,
    /// Tick in which the migration was requested
    pub requested_at: u64,
}

/// Migrations finished or dropped by one progress step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationProgress {
    pub completed: Vec<ServiceId>,
    pub aborted: Vec<ServiceId>,
}

/// Transition counters for the tick in progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct TickActivity {
    pub provisioned: usize,
    pub migrations_requested: usize,
    pub rejected_transitions: usize,
}

/// Everything a hook can see about the running simulation
#[derive(Debug, Clone)]
pub struct SimulationContext {
    hosts: EntityRegistry<EdgeServer>,
    services: EntityRegistry<Service>,
    clock: SimulationClock,
    parameters: BTreeMap<String, Value>,
    migration_duration_ticks: u64,
    pending_migrations: Vec<PendingMigration>,
    activity: TickActivity,
}

impl SimulationContext {
    /// Create an empty context from engine configuration
    pub(crate) fn new(config: &SimulationConfig) -> Self {
        SimulationContext {
            hosts: EntityRegistry::new(),
            services: EntityRegistry::new(),
            clock: SimulationClock::new(config.tick_duration, config.tick_unit.clone()),
            parameters: config.parameters.clone(),
            migration_duration_ticks: config.migration_duration_ticks.max(1),
            pending_migrations: Vec::new(),
            activity: TickActivity::default(),
        }
    }

    pub(crate) fn with_registries(
        config: &SimulationConfig,
        hosts: EntityRegistry<EdgeServer>,
        services: EntityRegistry<Service>,
    ) -> Self {
        SimulationContext {
            hosts,
            services,
            ..Self::new(config)
        }
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    pub fn hosts(&self) -> &EntityRegistry<EdgeServer> {
        &self.hosts
    }

    pub fn services(&self) -> &EntityRegistry<Service> {
        &self.services
    }

    pub fn host(&self, id: HostId) -> Option<&EdgeServer> {
        self.hosts.get(id)
    }

    pub fn service(&self, id: ServiceId) -> Option<&Service> {
        self.services.get(id)
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    /// 1-based number of the tick in progress
    pub fn current_tick(&self) -> u64 {
        self.clock.current_tick()
    }

    /// Named parameters from the engine configuration
    pub fn parameters(&self) -> &BTreeMap<String, Value> {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }

    pub fn pending_migrations(&self) -> &[PendingMigration] {
        &self.pending_migrations
    }

    /// Capacity check by id; false if either entity is unknown
    pub fn has_capacity_to_host(&self, host: HostId, service: ServiceId) -> bool {
        match (self.hosts.get(host), self.services.get(service)) {
            (Some(host), Some(service)) => ResourceModel::has_capacity_to_host(host, service),
            _ => false,
        }
    }

    /// Services in the given state, in registry order
    pub fn services_in(&self, state: ProvisioningState) -> impl Iterator<Item = &Service> + '_ {
        self.services.all().filter(move |s| s.state() == state)
    }

    pub fn unplaced_services(&self) -> impl Iterator<Item = &Service> + '_ {
        self.services_in(ProvisioningState::Unplaced)
    }

    pub fn count_in(&self, state: ProvisioningState) -> usize {
        self.services_in(state).count()
    }

    /// Services attached and not migrating
    pub fn placed_count(&self) -> usize {
        self.count_in(ProvisioningState::Placed)
    }

    /// True when every registered service is placed (vacuously true for none)
    pub fn all_services_placed(&self) -> bool {
        self.placed_count() == self.services.count()
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Place an unplaced service on `host` (completes immediately)
    pub fn provision(&mut self, service: ServiceId, host: HostId) -> Result<(), PlacementError> {
        let result = self.try_provision(service, host);
        match &result {
            Ok(()) => {
                self.activity.provisioned += 1;
                debug!(service = %service, host = %host, tick = self.clock.current_tick(), "Service provisioned");
            }
            Err(e) => self.reject(Transition::Provision, e),
        }
        result
    }

    /// Start moving a placed service to `host`
    ///
    /// The move completes in the engine's progress step after
    /// `migration_duration_ticks` steps. Until then the service stays
    /// attached to its current host in the `Migrating` state.
    pub fn migrate(&mut self, service: ServiceId, host: HostId) -> Result<(), PlacementError> {
        let result = self.try_migrate(service, host);
        match &result {
            Ok(()) => {
                self.activity.migrations_requested += 1;
                debug!(service = %service, target = %host, tick = self.clock.current_tick(), "Migration requested");
            }
            Err(e) => self.reject(Transition::Migrate, e),
        }
        result
    }

    /// Drop an in-flight migration; the service stays where it is
    pub fn cancel_migration(&mut self, service: ServiceId) -> Result<(), PlacementError> {
        let result = self
            .services
            .require_mut(service)
            .and_then(ProvisioningStateMachine::cancel_migration);

        match &result {
            Ok(()) => {
                self.pending_migrations.retain(|m| m.service != service);
                debug!(service = %service, "Migration cancelled");
            }
            Err(e) => self.reject(Transition::CancelMigration, e),
        }
        result
    }

    fn try_provision(&mut self, service: ServiceId, host: HostId) -> Result<(), PlacementError> {
        let host = self.hosts.require_mut(host)?;
        let service = self.services.require_mut(service)?;
        ProvisioningStateMachine::provision(service, host)
    }

    fn try_migrate(&mut self, service_id: ServiceId, target: HostId) -> Result<(), PlacementError> {
        let target_host = self.hosts.require(target)?;
        let service = self.services.require_mut(service_id)?;

        let Some(source) = service.server() else {
            return Err(PlacementError::invalid_transition(
                service_id,
                service.state(),
                Transition::Migrate,
            ));
        };

        ProvisioningStateMachine::begin_migration(service, target_host)?;
        self.pending_migrations.push(PendingMigration {
            service: service_id,
            source,
            target,
            remaining_ticks: self.migration_duration_ticks,
            requested_at: self.clock.current_tick(),
        });
        Ok(())
    }

    fn reject(&mut self, transition: Transition, error: &PlacementError) {
        self.activity.rejected_transitions += 1;
        warn!(
            %transition,
            error = %error,
            tick = self.clock.current_tick(),
            "Transition rejected"
        );
    }

    // ------------------------------------------------------------------
    // Engine-only
    // ------------------------------------------------------------------

    pub(crate) fn clock_mut(&mut self) -> &mut SimulationClock {
        &mut self.clock
    }

    /// Reset and return the previous tick's activity counters
    pub(crate) fn take_activity(&mut self) -> TickActivity {
        std::mem::take(&mut self.activity)
    }

    /// Advance every in-flight migration by one step
    ///
    /// Due migrations swap hosts atomically; a migration whose target no
    /// longer has room is dropped and the service stays on its source host.
    pub(crate) fn advance_migrations(&mut self) -> MigrationProgress {
        let mut progress = MigrationProgress::default();

        for mut migration in std::mem::take(&mut self.pending_migrations) {
            migration.remaining_ticks = migration.remaining_ticks.saturating_sub(1);
            if migration.remaining_ticks > 0 {
                self.pending_migrations.push(migration);
                continue;
            }

            match self.finish_migration(&migration) {
                Ok(()) => {
                    info!(
                        service = %migration.service,
                        from = %migration.source,
                        to = %migration.target,
                        "Migration completed"
                    );
                    progress.completed.push(migration.service);
                }
                Err(e) => {
                    if let Some(service) = self.services.get_mut(migration.service) {
                        if let Err(cancel_error) =
                            ProvisioningStateMachine::cancel_migration(service)
                        {
                            debug!(
                                service = %migration.service,
                                error = %cancel_error,
                                "Aborted migration was no longer in flight"
                            );
                        }
                    }
                    warn!(
                        service = %migration.service,
                        to = %migration.target,
                        error = %e,
                        "Migration aborted, service stays on its source host"
                    );
                    progress.aborted.push(migration.service);
                }
            }
        }

        progress
    }

    fn finish_migration(&mut self, migration: &PendingMigration) -> Result<(), PlacementError> {
        let service = self.services.require_mut(migration.service)?;
        let (source, target) = self
            .hosts
            .get_pair_mut(migration.source, migration.target)
            .ok_or(PlacementError::UnknownEntity {
                kind: "EdgeServer",
                id: migration.target.0,
            })?;
        ProvisioningStateMachine::complete_migration(service, source, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::Topology;
    use edgesim_core::Resources;

    fn context(host_cpus: &[u64], service_cpus: &[u64], config: &SimulationConfig) -> SimulationContext {
        let mut topology = Topology::new();
        for (i, cpu) in host_cpus.iter().enumerate() {
            topology = topology.with_edge_server(i as u64 + 1, Resources::cpu(*cpu));
        }
        for (i, cpu) in service_cpus.iter().enumerate() {
            topology = topology.with_service(i as u64 + 1, Resources::cpu(*cpu));
        }
        let (hosts, services) = topology.into_registries().unwrap();
        SimulationContext::with_registries(config, hosts, services)
    }

    #[test]
    fn test_provision_and_counts() {
        let mut ctx = context(&[10], &[6, 6], &SimulationConfig::default());

        assert!(ctx.has_capacity_to_host(HostId(1), ServiceId(1)));
        ctx.provision(ServiceId(1), HostId(1)).unwrap();

        assert!(!ctx.has_capacity_to_host(HostId(1), ServiceId(2)));
        let err = ctx.provision(ServiceId(2), HostId(1)).unwrap_err();
        assert!(err.is_capacity());

        assert_eq!(ctx.placed_count(), 1);
        assert_eq!(ctx.unplaced_services().count(), 1);
        assert!(!ctx.all_services_placed());

        let activity = ctx.take_activity();
        assert_eq!(activity.provisioned, 1);
        assert_eq!(activity.rejected_transitions, 1);
        assert_eq!(ctx.take_activity(), TickActivity::default());
    }

    #[test]
    fn test_unknown_entities() {
        let mut ctx = context(&[10], &[1], &SimulationConfig::default());

        assert!(!ctx.has_capacity_to_host(HostId(9), ServiceId(1)));
        assert!(matches!(
            ctx.provision(ServiceId(1), HostId(9)),
            Err(PlacementError::UnknownEntity { .. })
        ));
        assert!(matches!(
            ctx.provision(ServiceId(9), HostId(1)),
            Err(PlacementError::UnknownEntity { .. })
        ));
    }

    #[test]
    fn test_migration_completes_on_progress_step() {
        let mut ctx = context(&[10, 10], &[6], &SimulationConfig::default());
        ctx.provision(ServiceId(1), HostId(1)).unwrap();

        ctx.migrate(ServiceId(1), HostId(2)).unwrap();
        assert_eq!(ctx.count_in(ProvisioningState::Migrating), 1);
        assert_eq!(ctx.pending_migrations().len(), 1);

        let progress = ctx.advance_migrations();
        assert_eq!(progress.completed, vec![ServiceId(1)]);
        assert!(ctx.pending_migrations().is_empty());
        assert_eq!(ctx.service(ServiceId(1)).unwrap().server(), Some(HostId(2)));
        assert!(ctx.host(HostId(1)).unwrap().allocated().is_zero());
        assert_eq!(ctx.host(HostId(2)).unwrap().allocated().cpu, 6);
    }

    #[test]
    fn test_multi_tick_migration() {
        let config = SimulationConfig::default().with_migration_duration(3);
        let mut ctx = context(&[10, 10], &[6], &config);
        ctx.provision(ServiceId(1), HostId(1)).unwrap();
        ctx.migrate(ServiceId(1), HostId(2)).unwrap();

        assert!(ctx.advance_migrations().completed.is_empty());
        assert!(ctx.advance_migrations().completed.is_empty());
        assert_eq!(ctx.service(ServiceId(1)).unwrap().server(), Some(HostId(1)));

        assert_eq!(ctx.advance_migrations().completed, vec![ServiceId(1)]);
        assert_eq!(ctx.service(ServiceId(1)).unwrap().server(), Some(HostId(2)));
    }

    #[test]
    fn test_migration_aborted_when_target_fills_up() {
        let config = SimulationConfig::default().with_migration_duration(2);
        let mut ctx = context(&[10, 10], &[6, 6], &config);
        ctx.provision(ServiceId(1), HostId(1)).unwrap();
        ctx.migrate(ServiceId(1), HostId(2)).unwrap();
        ctx.provision(ServiceId(2), HostId(2)).unwrap();

        ctx.advance_migrations();
        let progress = ctx.advance_migrations();

        assert_eq!(progress.aborted, vec![ServiceId(1)]);
        let service = ctx.service(ServiceId(1)).unwrap();
        assert_eq!(service.state(), ProvisioningState::Placed);
        assert_eq!(service.server(), Some(HostId(1)));
        assert_eq!(ctx.host(HostId(2)).unwrap().allocated().cpu, 6);
    }

    #[test]
    fn test_stale_pending_migration_is_dropped() {
        let mut ctx = context(&[10, 10], &[6], &SimulationConfig::default());
        ctx.provision(ServiceId(1), HostId(1)).unwrap();
        // Service is placed, not migrating, so neither completion nor cancel applies
        ctx.pending_migrations.push(PendingMigration {
            service: ServiceId(1),
            source: HostId(1),
            target: HostId(2),
            remaining_ticks: 1,
            requested_at: 1,
        });

        let progress = ctx.advance_migrations();

        assert_eq!(progress.aborted, vec![ServiceId(1)]);
        assert!(ctx.pending_migrations().is_empty());
        let service = ctx.service(ServiceId(1)).unwrap();
        assert_eq!(service.state(), ProvisioningState::Placed);
        assert_eq!(service.server(), Some(HostId(1)));
        assert!(ctx.host(HostId(2)).unwrap().allocated().is_zero());
    }

    #[test]
    fn test_cancel_migration() {
        let config = SimulationConfig::default().with_migration_duration(5);
        let mut ctx = context(&[10, 10], &[6], &config);
        ctx.provision(ServiceId(1), HostId(1)).unwrap();
        ctx.migrate(ServiceId(1), HostId(2)).unwrap();

        ctx.cancel_migration(ServiceId(1)).unwrap();

        assert!(ctx.pending_migrations().is_empty());
        assert!(ctx.service(ServiceId(1)).unwrap().is_placed());
        assert!(ctx.cancel_migration(ServiceId(1)).is_err());
    }

    #[test]
    fn test_migrate_unplaced_rejected() {
        let mut ctx = context(&[10, 10], &[6], &SimulationConfig::default());

        let err = ctx.migrate(ServiceId(1), HostId(2)).unwrap_err();
        assert!(matches!(err, PlacementError::InvalidTransition { .. }));
        assert!(ctx.pending_migrations().is_empty());
    }

    #[test]
    fn test_parameters_pass_through() {
        let config = SimulationConfig::default().with_parameter("threshold", 0.75);
        let ctx = context(&[], &[], &config);

        assert_eq!(ctx.parameter("threshold"), Some(&Value::from(0.75)));
        assert!(ctx.parameter("missing").is_none());
        assert!(ctx.all_services_placed());
    }
}
