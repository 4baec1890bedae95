//! Volume stage: data-generation jobs reconciled to a byte target.
//!
//! Phase 1 sizes jobs around `target / estimated_jobs` with a wide spread
//! (and an occasional heavy job) so the raw total is the right order of
//! magnitude but never exact. Phase 2 hands the whole month to the
//! reconciler, which lands the total in `[target, 1.2 * target]`.
//! Follow-up events (a failure, or else maybe a download) are derived
//! only after the sizes are final.

use crate::{
    config::{GeneratorConfig, PeriodTarget},
    context::RunContext,
    error::GenResult,
    event::{EventKind, EventRecord},
    period::{day_window, sample_between},
    reconciler::{ReconcileBand, Reconciler},
    rng::StageRng,
    stage::PeriodStage,
};
use chrono::Duration;

pub const ERROR_CODES: [&str; 4] = ["E_TIMEOUT", "E_QUOTA", "E_UPSTREAM_5XX", "E_INVALID_INPUT"];

pub fn words_for(bytes: f64, bytes_per_word: f64) -> u64 {
    (bytes / bytes_per_word).round().max(0.0) as u64
}

#[derive(Debug, Default)]
pub struct VolumeStage {
    band: ReconcileBand,
}

impl VolumeStage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_band(band: ReconcileBand) -> Self {
        Self { band }
    }

    fn job_bytes(base: f64, gen: &GeneratorConfig, rng: &mut StageRng) -> f64 {
        let mut spread = rng.uniform(0.5, 1.5);
        if rng.chance(gen.heavy_job_probability) {
            let (lo, hi) = gen.heavy_job_multiplier;
            spread *= rng.uniform(lo, hi);
        }
        (base * spread).max(gen.min_job_bytes)
    }

    fn follow_up(job: &EventRecord, gen: &GeneratorConfig, rng: &mut StageRng) -> Option<EventRecord> {
        let EventKind::DataGenerated { job_id, bytes, .. } = &job.kind else {
            return None;
        };
        let delay = |rng: &mut StageRng, secs: i64| {
            Duration::milliseconds(rng.next_u64_below((secs.max(1) as u64) * 1_000) as i64)
        };
        if rng.chance(gen.failure_probability) {
            let at = job.timestamp + delay(rng, gen.failure_delay_secs);
            let code = ERROR_CODES[rng.next_u64_below(ERROR_CODES.len() as u64) as usize];
            let kind = EventKind::JobFailed {
                job_id: job_id.clone(),
                error_code: code.to_string(),
            };
            return Some(EventRecord::new(rng, &job.user_id, at, job.period, kind));
        }
        if rng.chance(gen.download_probability) {
            let at = job.timestamp + delay(rng, gen.download_delay_secs);
            let kind = EventKind::DataDownloaded {
                job_id: job_id.clone(),
                bytes: *bytes,
            };
            return Some(EventRecord::new(rng, &job.user_id, at, job.period, kind));
        }
        None
    }
}

impl PeriodStage for VolumeStage {
    fn name(&self) -> &'static str {
        "volume"
    }

    fn run(
        &mut self,
        target: &PeriodTarget,
        ctx: &mut RunContext,
        _events_in: &[EventRecord],
        rng: &mut StageRng,
    ) -> GenResult<Vec<EventRecord>> {
        let Some(target_bytes) = target.volume_target_bytes.filter(|b| *b > 0.0) else {
            return Ok(Vec::new());
        };
        let period = target.period;
        let gen = &ctx.generator;

        // ── Phase 1: rough population ─────────────────────────
        let eligible_at_end = ctx.pool.eligible_before(period.end()).len();
        let estimated =
            (eligible_at_end as f64 * gen.events_per_user_per_day * period.day_count() as f64).max(1.0);
        let base = target_bytes / estimated;

        let mut jobs = Vec::new();
        for day in period.days() {
            let (day_start, day_end) = day_window(day);
            let eligible = ctx.pool.eligible_before(day_end);
            if eligible.is_empty() {
                continue;
            }
            let expected = eligible.len() as f64 * gen.events_per_user_per_day * rng.uniform(0.5, 1.5);
            // Stochastic rounding keeps small pools from always rounding to zero.
            let mut count = expected.floor() as usize;
            if rng.chance(expected.fract()) {
                count += 1;
            }
            for _ in 0..count {
                let user = ctx.pool.get(eligible[rng.next_u64_below(eligible.len() as u64) as usize]);
                let at = sample_between(rng, day_start.max(user.created_at), day_end);
                let bytes = Self::job_bytes(base, gen, rng);
                let kind = EventKind::DataGenerated {
                    job_id: format!("job-{:012x}", rng.next_u64() >> 16),
                    bytes,
                    words: words_for(bytes, gen.bytes_per_word),
                };
                jobs.push(EventRecord::new(rng, &user.user_id, at, period, kind));
            }
        }

        // ── Phase 2: correction ───────────────────────────────
        let bytes_per_word = gen.bytes_per_word;
        let reconciler = Reconciler::new(self.band, gen.min_job_bytes);
        let outcome = reconciler.reconcile(
            &mut jobs,
            target_bytes,
            rng,
            |e| e.bytes().unwrap_or(0.0),
            |e, v| {
                if let EventKind::DataGenerated { bytes, words, .. } = &mut e.kind {
                    *bytes = v;
                    *words = words_for(v, bytes_per_word);
                }
            },
        );

        let mut events = Vec::with_capacity(jobs.len() * 2);
        for job in jobs {
            let extra = Self::follow_up(&job, gen, rng);
            events.push(job);
            events.extend(extra);
        }

        log::debug!(
            "{period} volume: target {target_bytes:.0} bytes, {eligible_at_end} eligible, {outcome:?}"
        );
        ctx.period.reconcile = Some(outcome);
        if outcome.is_warning() {
            ctx.period.warn(format!(
                "volume landed at {:.0} bytes against a target of {target_bytes:.0}",
                outcome.final_sum()
            ));
        }
        Ok(events)
    }
}
