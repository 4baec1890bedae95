//! Ticket stage: raise this period's tickets, then resolve a batch.
//!
//! Resolution candidates are every ticket still RAISED, including ones
//! carried over from earlier periods. A resolution never lands before its
//! raise, nor before the start of the period doing the resolving.

use crate::{
    config::PeriodTarget,
    context::RunContext,
    error::GenResult,
    event::{EventKind, EventRecord},
    period::sample_between,
    rng::StageRng,
    sampler::weighted_pick,
    stage::PeriodStage,
    types::{EntityId, Instant},
};

const CATEGORIES: [(&str, f64); 5] = [
    ("billing", 0.25),
    ("bug_report", 0.30),
    ("data_export", 0.20),
    ("account_access", 0.15),
    ("feature_request", 0.10),
];

#[derive(Debug, Default)]
pub struct TicketStage;

impl TicketStage {
    pub fn new() -> Self {
        Self
    }
}

impl PeriodStage for TicketStage {
    fn name(&self) -> &'static str {
        "tickets"
    }

    fn run(
        &mut self,
        target: &PeriodTarget,
        ctx: &mut RunContext,
        _events_in: &[EventRecord],
        rng: &mut StageRng,
    ) -> GenResult<Vec<EventRecord>> {
        let period = target.period;
        let mut events = Vec::new();

        // ── Raise ─────────────────────────────────────────────
        let eligible = ctx.pool.eligible_before(period.end());
        if eligible.is_empty() && target.tickets_raised > 0 {
            ctx.period.warn(format!(
                "no eligible users to raise {} tickets",
                target.tickets_raised
            ));
        } else {
            for _ in 0..target.tickets_raised {
                let user = ctx.pool.get(eligible[rng.next_u64_below(eligible.len() as u64) as usize]);
                let at = sample_between(rng, period.start().max(user.created_at), period.end());
                let category = weighted_pick(&CATEGORIES, |(_, w)| *w, rng).0;
                let ticket_id = ctx.tickets.raise(&user.user_id, at).ticket_id.clone();
                events.push(EventRecord::new(
                    rng,
                    &user.user_id,
                    at,
                    period,
                    EventKind::TicketRaised {
                        ticket_id,
                        category: category.to_string(),
                    },
                ));
            }
        }

        // ── Resolve ───────────────────────────────────────────
        let mut open: Vec<(String, EntityId, Instant)> = ctx
            .tickets
            .open()
            .filter(|t| t.raised_at < period.end())
            .map(|t| (t.ticket_id.clone(), t.user_id.clone(), t.raised_at))
            .collect();
        let wanted = target.tickets_resolved as usize;
        if wanted > open.len() {
            ctx.period.warn(format!(
                "asked to resolve {wanted} tickets but only {} are open",
                open.len()
            ));
        }
        rng.shuffle(&mut open);
        for (ticket_id, user_id, raised_at) in open.into_iter().take(wanted) {
            let at = sample_between(rng, raised_at.max(period.start()), period.end());
            ctx.tickets.resolve(&ticket_id, at)?;
            events.push(EventRecord::new(
                rng,
                &user_id,
                at,
                period,
                EventKind::TicketResolved {
                    ticket_id,
                    resolution_minutes: (at - raised_at).num_minutes(),
                },
            ));
        }

        log::debug!(
            "{period} tickets: {} events, {} still open",
            events.len(),
            ctx.tickets.open_count()
        );
        Ok(events)
    }
}
