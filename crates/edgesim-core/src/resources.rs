//! Capacity accounting between edge servers and services
//!
//! [`ResourceModel::attach`] and [`ResourceModel::detach`] are the only code
//! paths that change a host's allocated vector. Every placement and migration
//! goes through them, which keeps `allocated <= capacity` on every host.

use crate::error::{PlacementError, Result, Transition};
use crate::types::{EdgeServer, Service};

/// Capacity checks and the two allocation mutators
pub struct ResourceModel;

impl ResourceModel {
    /// True iff every dimension of the host's available vector covers the demand
    pub fn has_capacity_to_host(host: &EdgeServer, service: &Service) -> bool {
        service.demand.fits_within(&host.available())
    }

    /// Bind an unattached service to a host and reserve its demand
    ///
    /// Re-checks capacity even though callers are expected to have done so.
    pub fn attach(service: &mut Service, host: &mut EdgeServer) -> Result<()> {
        if service.server.is_some() {
            return Err(PlacementError::invalid_transition(
                service.id,
                service.state(),
                Transition::Attach,
            ));
        }

        if !Self::has_capacity_to_host(host, service) {
            return Err(PlacementError::InsufficientCapacity {
                service: service.id,
                host: host.id,
                demand: service.demand,
                available: host.available(),
            });
        }

        host.allocated += service.demand;
        host.services.push(service.id);
        service.server = Some(host.id);
        Ok(())
    }

    /// Release a service from the host it is attached to
    pub fn detach(service: &mut Service, host: &mut EdgeServer) -> Result<()> {
        if service.server != Some(host.id) {
            return Err(PlacementError::invalid_transition(
                service.id,
                service.state(),
                Transition::Detach,
            ));
        }

        let remaining = host.allocated.checked_sub(&service.demand).ok_or(
            PlacementError::AllocationUnderflow {
                host: host.id,
                demand: service.demand,
                allocated: host.allocated,
            },
        )?;

        host.allocated = remaining;
        host.services.retain(|id| *id != service.id);
        service.server = None;
        Ok(())
    }
}
