//! Per-service provisioning lifecycle
//!
//! ```text
//! Unplaced ──provision──► Provisioning ──attach──► Placed
//!                                                  │   ▲
//!                                          migrate │   │ complete / cancel
//!                                                  ▼   │
//!                                                Migrating
//! ```
//!
//! Provisioning is immediate: `provision` attaches within the call, so the
//! `Provisioning` state is never observable between calls. Migration spans the
//! engine's progress step; `complete_migration` swaps hosts in one call so no
//! observer sees a service attached to neither or both hosts.

use crate::error::{PlacementError, Result, Transition};
use crate::resources::ResourceModel;
use crate::types::{EdgeServer, ProvisioningState, Service};

/// Transitions of the provisioning state machine
pub struct ProvisioningStateMachine;

impl ProvisioningStateMachine {
    /// Place an unplaced service on `host`
    pub fn provision(service: &mut Service, host: &mut EdgeServer) -> Result<()> {
        Self::expect_state(service, ProvisioningState::Unplaced, Transition::Provision)?;

        service.being_provisioned = true;
        let attached = ResourceModel::attach(service, host);
        service.being_provisioned = false;
        attached
    }

    /// Start moving a placed service to `target`
    ///
    /// Capacity is checked now and again at completion.
    pub fn begin_migration(service: &mut Service, target: &EdgeServer) -> Result<()> {
        Self::expect_state(service, ProvisioningState::Placed, Transition::Migrate)?;

        if service.server == Some(target.id) {
            return Err(PlacementError::invalid_transition(
                service.id,
                service.state(),
                Transition::Migrate,
            ));
        }

        if !ResourceModel::has_capacity_to_host(target, service) {
            return Err(PlacementError::InsufficientCapacity {
                service: service.id,
                host: target.id,
                demand: service.demand,
                available: target.available(),
            });
        }

        service.being_provisioned = true;
        service.migration_target = Some(target.id);
        Ok(())
    }

    /// Detach from `source` and attach to `target` as one step
    ///
    /// On any error the service is left migrating on `source`, untouched.
    pub fn complete_migration(
        service: &mut Service,
        source: &mut EdgeServer,
        target: &mut EdgeServer,
    ) -> Result<()> {
        Self::expect_state(
            service,
            ProvisioningState::Migrating,
            Transition::CompleteMigration,
        )?;

        if service.server != Some(source.id) || service.migration_target != Some(target.id) {
            return Err(PlacementError::invalid_transition(
                service.id,
                service.state(),
                Transition::CompleteMigration,
            ));
        }

        if !ResourceModel::has_capacity_to_host(target, service) {
            return Err(PlacementError::InsufficientCapacity {
                service: service.id,
                host: target.id,
                demand: service.demand,
                available: target.available(),
            });
        }

        ResourceModel::detach(service, source)?;
        if let Err(e) = ResourceModel::attach(service, target) {
            // Capacity was freed by the detach above, so this cannot fail
            ResourceModel::attach(service, source)?;
            return Err(e);
        }

        service.being_provisioned = false;
        service.migration_target = None;
        Ok(())
    }

    /// Drop an in-flight migration; the service stays on its current host
    pub fn cancel_migration(service: &mut Service) -> Result<()> {
        Self::expect_state(
            service,
            ProvisioningState::Migrating,
            Transition::CancelMigration,
        )?;

        service.being_provisioned = false;
        service.migration_target = None;
        Ok(())
    }

    fn expect_state(
        service: &Service,
        expected: ProvisioningState,
        transition: Transition,
    ) -> Result<()> {
        let state = service.state();
        if state == expected {
            Ok(())
        } else {
            Err(PlacementError::invalid_transition(service.id, state, transition))
        }
    }
}
