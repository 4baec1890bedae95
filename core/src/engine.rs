//! The generation engine.
//!
//! EXECUTION ORDER per period (fixed, documented, never reordered):
//!   1. Signup stage    (fills the pool every later stage reads)
//!   2. Activity stage  (daily actives, logins, monthly top-up)
//!   3. Volume stage    (data jobs, reconciled to the byte target)
//!   4. Ticket stage    (raise, then resolve open tickets)
//!
//! RULES:
//!   - Periods run in plan order; a period either completes or the run aborts.
//!   - Stages run in registration order and see earlier stages' events.
//!   - All randomness flows through the RngBank.
//!   - All run-wide state lives in the RunContext.

use crate::{
    activity_stage::ActivityStage,
    catalog::Catalog,
    config::PlanConfig,
    context::RunContext,
    error::{GenError, GenResult},
    event::{sort_chronologically, EventRecord},
    rng::{RngBank, StageSlot},
    signup_stage::SignupStage,
    stage::PeriodStage,
    stats::{PeriodAccumulator, PeriodStats},
    ticket_stage::TicketStage,
    types::RunId,
    volume_stage::VolumeStage,
};

/// Everything a finished run produced.
#[derive(Debug)]
pub struct RunOutput {
    pub run_id: RunId,
    pub seed: u64,
    /// Chronologically sorted.
    pub events: Vec<EventRecord>,
    pub stats: Vec<PeriodStats>,
}

pub struct GenEngine {
    pub run_id: RunId,
    pub rng_bank: RngBank,
    pub ctx: RunContext,
    plan: PlanConfig,
    stages: Vec<(StageSlot, Box<dyn PeriodStage>)>,
    events: Vec<EventRecord>,
    stats: Vec<PeriodStats>,
    next_period: usize,
}

impl GenEngine {
    /// Validates the plan before anything is generated.
    pub fn new(run_id: RunId, seed: u64, plan: PlanConfig) -> GenResult<Self> {
        let catalog = Catalog::builtin();
        plan.validate(&catalog)?;
        let first = plan
            .periods
            .first()
            .map(|p| p.period)
            .ok_or_else(|| GenError::Config("plan has no periods".into()))?;
        Ok(Self {
            ctx: RunContext::new(catalog, plan.generator.clone(), first),
            rng_bank: RngBank::new(seed),
            plan,
            stages: Vec::new(),
            events: Vec::new(),
            stats: Vec::new(),
            next_period: 0,
            run_id,
        })
    }

    /// Build a fully wired engine with all stages registered.
    /// Call this instead of new() + manual register() calls.
    pub fn build(run_id: RunId, seed: u64, plan: PlanConfig) -> GenResult<Self> {
        let mut engine = GenEngine::new(run_id, seed, plan)?;
        // EXECUTION ORDER: fixed, documented, never reordered.
        engine.register(StageSlot::Signup, Box::new(SignupStage::new()));
        engine.register(StageSlot::Activity, Box::new(ActivityStage::new()));
        engine.register(StageSlot::Volume, Box::new(VolumeStage::new()));
        engine.register(StageSlot::Tickets, Box::new(TicketStage::new()));
        Ok(engine)
    }

    /// Fully wired engine over the small in-code test plan.
    pub fn build_test(run_id: RunId, seed: u64) -> GenResult<Self> {
        Self::build(run_id, seed, PlanConfig::default_test())
    }

    /// Register a stage. Call in the documented execution order.
    pub fn register(&mut self, slot: StageSlot, stage: Box<dyn PeriodStage>) {
        self.stages.push((slot, stage));
    }

    pub fn seed(&self) -> u64 {
        self.rng_bank.master_seed()
    }

    pub fn plan(&self) -> &PlanConfig {
        &self.plan
    }

    pub fn periods_remaining(&self) -> usize {
        self.plan.periods.len() - self.next_period
    }

    /// Generate the next period of the plan. Returns None once the plan
    /// is exhausted.
    pub fn run_period(&mut self) -> GenResult<Option<&PeriodStats>> {
        let Some(target) = self.plan.periods.get(self.next_period).cloned() else {
            return Ok(None);
        };
        let index = self.next_period as u64;
        self.ctx.period = PeriodAccumulator::new(target.period);

        let mut period_events: Vec<EventRecord> = Vec::new();
        for (slot, stage) in &mut self.stages {
            let mut rng = self.rng_bank.for_stage_at_period(*slot, index);
            let new_events = stage.run(&target, &mut self.ctx, &period_events, &mut rng)?;
            for event in &new_events {
                self.ctx.period.observe(event);
            }
            log::debug!("{} {}: {} events", target.period, stage.name(), new_events.len());
            period_events.extend(new_events);
        }

        let finished = std::mem::replace(&mut self.ctx.period, PeriodAccumulator::new(target.period));
        let stats = finished.finish(self.ctx.tickets.open_count());
        log::info!(
            "{} done: signups={} mau={} bytes={:.0} (target {:?}) tickets +{}/-{} events={} warnings={}",
            stats.period,
            stats.signups,
            stats.monthly_active,
            stats.bytes,
            target.volume_target_bytes,
            stats.tickets_raised,
            stats.tickets_resolved,
            stats.event_count,
            stats.warnings.len()
        );

        self.events.extend(period_events);
        self.stats.push(stats);
        self.next_period += 1;
        Ok(self.stats.last())
    }

    /// Run every remaining period of the plan.
    pub fn run_all(&mut self) -> GenResult<()> {
        while self.run_period()?.is_some() {}
        Ok(())
    }

    /// Events so far, in generation order.
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    pub fn stats(&self) -> &[PeriodStats] {
        &self.stats
    }

    /// Freeze the run: sort events chronologically and hand everything over.
    pub fn finish(self) -> RunOutput {
        let mut events = self.events;
        sort_chronologically(&mut events);
        RunOutput {
            run_id: self.run_id,
            seed: self.rng_bank.master_seed(),
            events,
            stats: self.stats,
        }
    }
}
