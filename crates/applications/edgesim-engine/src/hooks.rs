//! Hook interfaces invoked once per tick
//!
//! A run is parameterized by two user-supplied capabilities:
//! - [`ResourceManagementAlgorithm`]: decides placements and migrations
//! - [`StoppingCriterion`]: decides when the run is over
//!
//! Plain closures implement both traits, so ad-hoc logic needs no struct:
//!
//! ```
//! use edgesim_engine::context::SimulationContext;
//! use edgesim_engine::hooks::{ResourceManagementAlgorithm, StoppingCriterion};
//!
//! let algorithm = |ctx: &mut SimulationContext| -> anyhow::Result<()> {
//!     let _ = ctx.placed_count();
//!     Ok(())
//! };
//! let criterion = |ctx: &SimulationContext| ctx.all_services_placed();
//!
//! let _: Box<dyn ResourceManagementAlgorithm> = Box::new(algorithm);
//! let _: Box<dyn StoppingCriterion> = Box::new(criterion);
//! ```

use crate::context::SimulationContext;

/// Per-tick placement policy
///
/// `decide` may request any number of transitions through the context.
/// Rejected transitions come back as `PlacementError`s for the algorithm to
/// handle; returning `Err` from `decide` aborts the whole run.
pub trait ResourceManagementAlgorithm {
    /// Decide this tick's transitions
    fn decide(&mut self, context: &mut SimulationContext) -> anyhow::Result<()>;

    /// Get algorithm name
    fn name(&self) -> &str {
        "custom"
    }
}

impl<F> ResourceManagementAlgorithm for F
where
    F: FnMut(&mut SimulationContext) -> anyhow::Result<()>,
{
    fn decide(&mut self, context: &mut SimulationContext) -> anyhow::Result<()> {
        self(context)
    }
}

/// Per-tick termination check
///
/// Expected to be a pure read of the context; the engine does not enforce
/// it. Returning `Err` aborts the run.
pub trait StoppingCriterion {
    fn should_stop(&self, context: &SimulationContext) -> anyhow::Result<bool>;

    /// Get criterion name
    fn name(&self) -> &str {
        "custom"
    }
}

impl<F> StoppingCriterion for F
where
    F: Fn(&SimulationContext) -> bool,
{
    fn should_stop(&self, context: &SimulationContext) -> anyhow::Result<bool> {
        Ok(self(context))
    }
}
