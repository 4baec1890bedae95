//! Activity stage: daily actives, logins, and the monthly top-up.
//!
//! Daily draws sit in `[low, high]`, which by default is
//! `[floor(0.6 * target), target]`: at or below the nominal daily target,
//! never above it. If the distinct users touched by the daily draws still
//! fall short of the monthly target, not-yet-active eligible users are
//! topped up with activity spread over the whole month.

use crate::{
    config::PeriodTarget,
    context::RunContext,
    error::GenResult,
    event::{EventKind, EventRecord},
    period::{day_window, sample_between},
    rng::StageRng,
    stage::PeriodStage,
    stats::DailyActiveSample,
};
use chrono::Duration;
use std::collections::HashSet;

#[derive(Debug, Default)]
pub struct ActivityStage;

impl ActivityStage {
    pub fn new() -> Self {
        Self
    }
}

impl PeriodStage for ActivityStage {
    fn name(&self) -> &'static str {
        "activity"
    }

    fn run(
        &mut self,
        target: &PeriodTarget,
        ctx: &mut RunContext,
        _events_in: &[EventRecord],
        rng: &mut StageRng,
    ) -> GenResult<Vec<EventRecord>> {
        let period = target.period;
        let login_probability = ctx.generator.login_probability;
        let login_lead_ms = (ctx.generator.login_lead_secs.max(0) as u64) * 1_000;
        let mut events = Vec::new();
        let mut active: HashSet<usize> = HashSet::new();

        if let Some(range) = target.daily_active() {
            for day in period.days() {
                let (day_start, day_end) = day_window(day);
                let eligible = ctx.pool.eligible_before(day_end);
                let drawn = rng.range_inclusive(range.low() as u64, range.high() as u64) as u32;
                let count = (drawn as usize).min(eligible.len());
                ctx.period.daily_active.push(DailyActiveSample {
                    day,
                    eligible: eligible.len(),
                    drawn,
                    count: count as u32,
                });

                for pick in rng.sample_indices(eligible.len(), count) {
                    let idx = eligible[pick];
                    let user = ctx.pool.get(idx);
                    let earliest = day_start.max(user.created_at);
                    let at = sample_between(rng, earliest, day_end);

                    if login_lead_ms > 0 && rng.chance(login_probability) {
                        let lead = Duration::milliseconds(rng.next_u64_below(login_lead_ms) as i64);
                        let login_at = (at - lead).max(earliest);
                        events.push(EventRecord::new(
                            rng,
                            &user.user_id,
                            login_at,
                            period,
                            EventKind::Login {
                                device: user.device.clone(),
                            },
                        ));
                    }
                    events.push(EventRecord::new(
                        rng,
                        &user.user_id,
                        at,
                        period,
                        EventKind::Active { top_up: false },
                    ));
                    active.insert(idx);
                }
            }
        }

        let mau_target = target.monthly_active_target as usize;
        if active.len() < mau_target {
            let deficit = mau_target - active.len();
            let candidates: Vec<usize> = ctx
                .pool
                .eligible_before(period.end())
                .into_iter()
                .filter(|idx| !active.contains(idx))
                .collect();
            if candidates.len() < deficit {
                ctx.period.warn(format!(
                    "monthly actives short by {}: only {} eligible users left for a deficit of {deficit}",
                    deficit - candidates.len(),
                    candidates.len()
                ));
            }
            for pick in rng.sample_indices(candidates.len(), deficit) {
                let user = ctx.pool.get(candidates[pick]);
                let earliest = period.start().max(user.created_at);
                let at = sample_between(rng, earliest, period.end());
                events.push(EventRecord::new(
                    rng,
                    &user.user_id,
                    at,
                    period,
                    EventKind::Active { top_up: true },
                ));
                active.insert(candidates[pick]);
            }
        }

        log::debug!(
            "{period} activity: {} events, {} distinct actives",
            events.len(),
            active.len()
        );
        Ok(events)
    }
}
