//! Placement algorithms
//!
//! Implements multiple resource management algorithms to compare:
//! - FirstFit: first host (registry order) with room
//! - BestFit: host left with the least slack
//! - WorstFit: host left with the most slack
//! - Optimal: minimum-slack one-to-one matching per tick (Kuhn-Munkres)
//! - Consolidation: spread with worst-fit, then pack hosts one migration at a time
//!
//! All of them walk services in registry order and only provision hosts that
//! pass the capacity check, so a rejected transition means a bug and is
//! propagated as a hook failure.

use clap::ValueEnum;
use edgesim_core::{EdgeServer, HostId, ProvisioningState, ResourceModel, Service, ServiceId};
use pathfinding::kuhn_munkres::kuhn_munkres_min;
use pathfinding::matrix::Matrix;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashMap;
use tracing::debug;

use crate::context::SimulationContext;
use crate::hooks::ResourceManagementAlgorithm;

/// Cost of an infeasible service/host pair in the assignment matrix
const INFEASIBLE_COST: i64 = 1 << 40;

/// Built-in algorithm selector (CLI and config friendly)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PlacementStrategy {
    /// First host in registry order with enough capacity
    #[default]
    FirstFit,

    /// Host with the least slack left after placement
    BestFit,

    /// Host with the most slack left after placement
    WorstFit,

    /// Minimum-slack one-to-one matching per tick
    Optimal,

    /// Worst-fit plus migrations off the emptiest host
    Consolidation,
}

impl PlacementStrategy {
    /// Instantiate the algorithm
    pub fn build(self) -> Box<dyn ResourceManagementAlgorithm> {
        match self {
            PlacementStrategy::FirstFit => Box::new(FirstFit),
            PlacementStrategy::BestFit => Box::new(BestFit),
            PlacementStrategy::WorstFit => Box::new(WorstFit),
            PlacementStrategy::Optimal => Box::new(OptimalAssignment),
            PlacementStrategy::Consolidation => Box::new(Consolidation),
        }
    }
}

/// Slack a host would have left after taking the service
fn slack_after(host: &EdgeServer, service: &Service) -> u64 {
    host.available().saturating_sub(&service.demand()).total()
}

fn unplaced_ids(ctx: &SimulationContext) -> Vec<ServiceId> {
    ctx.unplaced_services().map(Service::id).collect()
}

/// Provision every unplaced service on the host chosen by `select`
///
/// Services `select` finds no host for stay unplaced until a later tick.
fn place_each<F>(ctx: &mut SimulationContext, select: F) -> anyhow::Result<usize>
where
    F: Fn(&SimulationContext, &Service) -> Option<HostId>,
{
    let mut placed = 0;

    for service_id in unplaced_ids(ctx) {
        let target = ctx.service(service_id).and_then(|service| select(ctx, service));

        if let Some(host_id) = target {
            ctx.provision(service_id, host_id)?;
            placed += 1;
        }
    }

    Ok(placed)
}

fn candidates<'a>(
    ctx: &'a SimulationContext,
    service: &'a Service,
) -> impl Iterator<Item = &'a EdgeServer> + 'a {
    ctx.hosts()
        .all()
        .filter(move |host| ResourceModel::has_capacity_to_host(host, service))
}

/// First-fit: the first host in registry order with room
pub struct FirstFit;

impl ResourceManagementAlgorithm for FirstFit {
    fn decide(&mut self, ctx: &mut SimulationContext) -> anyhow::Result<()> {
        place_each(ctx, |ctx, service| {
            candidates(ctx, service).next().map(EdgeServer::id)
        })?;
        Ok(())
    }

    fn name(&self) -> &str {
        "FirstFit"
    }
}

/// Best-fit: the host left with the least slack (ties go to registry order)
pub struct BestFit;

impl ResourceManagementAlgorithm for BestFit {
    fn decide(&mut self, ctx: &mut SimulationContext) -> anyhow::Result<()> {
        place_each(ctx, |ctx, service| {
            candidates(ctx, service)
                .min_by_key(|host| slack_after(host, service))
                .map(EdgeServer::id)
        })?;
        Ok(())
    }

    fn name(&self) -> &str {
        "BestFit"
    }
}

/// Worst-fit: the host left with the most slack (ties go to registry order)
pub struct WorstFit;

impl ResourceManagementAlgorithm for WorstFit {
    fn decide(&mut self, ctx: &mut SimulationContext) -> anyhow::Result<()> {
        place_each(ctx, |ctx, service| {
            candidates(ctx, service)
                .min_by_key(|host| Reverse(slack_after(host, service)))
                .map(EdgeServer::id)
        })?;
        Ok(())
    }

    fn name(&self) -> &str {
        "WorstFit"
    }
}

/// Optimal one-to-one matching of unplaced services to hosts
///
/// Each tick, at most one service lands on each host, chosen to minimize the
/// total slack left behind. Services without a match retry next tick against
/// the updated capacities.
pub struct OptimalAssignment;

impl OptimalAssignment {
    /// Cost of placing `service` on `host`, `INFEASIBLE_COST` if it does not fit
    fn placement_cost(service: &Service, host: &EdgeServer) -> i64 {
        if !ResourceModel::has_capacity_to_host(host, service) {
            return INFEASIBLE_COST;
        }
        i64::try_from(slack_after(host, service))
            .unwrap_or(INFEASIBLE_COST - 1)
            .min(INFEASIBLE_COST - 1)
    }

    /// Plan a minimum-cost matching
    ///
    /// # Returns
    /// service_id -> host_id for every feasible matched pair
    ///
    /// # Notes
    /// - The cost matrix is padded to a square with infeasible entries
    /// - Pairs matched at infeasible cost are dropped
    pub fn plan(
        services: &[&Service],
        hosts: &[&EdgeServer],
    ) -> anyhow::Result<HashMap<ServiceId, HostId>> {
        if services.is_empty() || hosts.is_empty() {
            return Ok(HashMap::new());
        }

        let size = services.len().max(hosts.len());
        let mut costs = vec![INFEASIBLE_COST; size * size];
        for (i, service) in services.iter().enumerate() {
            for (j, host) in hosts.iter().enumerate() {
                costs[i * size + j] = Self::placement_cost(service, host);
            }
        }

        let matrix = Matrix::from_vec(size, size, costs)
            .map_err(|e| anyhow::anyhow!("Failed to create cost matrix: {e}"))?;
        let (_total_cost, assignment) = kuhn_munkres_min(&matrix);

        let mut plan = HashMap::new();
        for (i, &j) in assignment.iter().enumerate() {
            if i < services.len()
                && j < hosts.len()
                && Self::placement_cost(services[i], hosts[j]) < INFEASIBLE_COST
            {
                plan.insert(services[i].id(), hosts[j].id());
            }
        }

        Ok(plan)
    }
}

impl ResourceManagementAlgorithm for OptimalAssignment {
    fn decide(&mut self, ctx: &mut SimulationContext) -> anyhow::Result<()> {
        let plan = {
            let services: Vec<&Service> = ctx.unplaced_services().collect();
            let hosts: Vec<&EdgeServer> = ctx.hosts().all().collect();
            Self::plan(&services, &hosts)?
        };

        debug!(matched = plan.len(), "Optimal assignment planned");

        // Apply in registry order for deterministic logs and history
        for service_id in unplaced_ids(ctx) {
            if let Some(&host_id) = plan.get(&service_id) {
                ctx.provision(service_id, host_id)?;
            }
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "Optimal"
    }
}

/// Worst-fit placement plus gradual consolidation
///
/// While nothing is migrating, moves one service off the least utilized
/// occupied host onto the most utilized other host that has room and is
/// already fuller than the source.
pub struct Consolidation;

impl Consolidation {
    /// Pick the next (service, target) move, if any
    fn next_move(ctx: &SimulationContext) -> Option<(ServiceId, HostId)> {
        let source = ctx
            .hosts()
            .all()
            .filter(|host| !host.services().is_empty())
            .min_by(|a, b| a.utilization().total_cmp(&b.utilization()))?;

        for service_id in source.services() {
            let service = match ctx.service(*service_id) {
                Some(service) if service.state() == ProvisioningState::Placed => service,
                _ => continue,
            };

            let target = ctx
                .hosts()
                .all()
                .filter(|host| host.id() != source.id())
                .filter(|host| host.utilization() > source.utilization())
                .filter(|host| ResourceModel::has_capacity_to_host(host, service))
                .min_by(|a, b| b.utilization().total_cmp(&a.utilization()));

            if let Some(target) = target {
                return Some((*service_id, target.id()));
            }
        }

        None
    }
}

impl ResourceManagementAlgorithm for Consolidation {
    fn decide(&mut self, ctx: &mut SimulationContext) -> anyhow::Result<()> {
        WorstFit.decide(ctx)?;

        if ctx.pending_migrations().is_empty() {
            if let Some((service_id, host_id)) = Self::next_move(ctx) {
                ctx.migrate(service_id, host_id)?;
            }
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "Consolidation"
    }
}
