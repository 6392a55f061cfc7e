//! Built-in stopping criteria

use crate::context::SimulationContext;
use crate::hooks::StoppingCriterion;

/// Stop once every registered service is placed
///
/// Services mid-migration do not count as placed, so a run keeps going until
/// in-flight migrations have landed.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllServicesPlaced;

impl StoppingCriterion for AllServicesPlaced {
    fn should_stop(&self, context: &SimulationContext) -> anyhow::Result<bool> {
        Ok(context.all_services_placed())
    }

    fn name(&self) -> &str {
        "AllServicesPlaced"
    }
}

/// Stop at the end of tick `max`
#[derive(Debug, Clone, Copy)]
pub struct TickLimit {
    pub max: u64,
}

impl TickLimit {
    pub fn new(max: u64) -> Self {
        TickLimit { max }
    }
}

impl StoppingCriterion for TickLimit {
    fn should_stop(&self, context: &SimulationContext) -> anyhow::Result<bool> {
        Ok(context.current_tick() >= self.max)
    }

    fn name(&self) -> &str {
        "TickLimit"
    }
}
