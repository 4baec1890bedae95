//! Stage trait.
//!
//! RULE: every period generator implements PeriodStage.
//! The engine calls run() on each registered stage in registration
//! order, once per period. Execution order is fixed in engine.rs.

use crate::{
    config::PeriodTarget,
    context::RunContext,
    error::GenResult,
    event::EventRecord,
    rng::StageRng,
};

/// The contract every stage must fulfill.
pub trait PeriodStage: Send {
    /// Unique stable name for this stage.
    fn name(&self) -> &'static str;

    /// Called once per period by the engine.
    ///
    /// - `target`:    the period's row from the plan table
    /// - `ctx`:       run-wide state (pool, geo cache, tickets, totals)
    /// - `events_in`: events emitted by earlier stages this period
    /// - `rng`:       this stage's deterministic RNG for this period
    ///
    /// Returns the new events, in emission order.
    fn run(
        &mut self,
        target: &PeriodTarget,
        ctx: &mut RunContext,
        events_in: &[EventRecord],
        rng: &mut StageRng,
    ) -> GenResult<Vec<EventRecord>>;
}
