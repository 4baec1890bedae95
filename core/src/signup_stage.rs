//! Signup stage: always first in a period.
//!
//! Creates exactly `signupCount` users for the period. Regions come from
//! a quota sampler so the regional split is exact; every other attribute
//! is a plain weighted draw. Later stages read the pool this stage fills,
//! which is why it must run before any of them.

use crate::{
    config::PeriodTarget,
    context::RunContext,
    entity::Entity,
    error::{GenError, GenResult},
    event::{EventKind, EventRecord},
    period::sample_between,
    rng::StageRng,
    sampler::{weighted_pick, QuotaSampler},
    stage::PeriodStage,
};

pub const DEFAULT_CHANNEL: &str = "organic";

#[derive(Debug, Default)]
pub struct SignupStage;

impl SignupStage {
    pub fn new() -> Self {
        Self
    }
}

impl PeriodStage for SignupStage {
    fn name(&self) -> &'static str {
        "signup"
    }

    fn run(
        &mut self,
        target: &PeriodTarget,
        ctx: &mut RunContext,
        _events_in: &[EventRecord],
        rng: &mut StageRng,
    ) -> GenResult<Vec<EventRecord>> {
        let period = target.period;
        let mut quotas = QuotaSampler::from_weights(&target.region_weights, target.signup_count);
        let mut events = Vec::with_capacity(target.signup_count as usize);

        for _ in 0..target.signup_count {
            let region_code = quotas
                .pick(rng)
                .map(str::to_owned)
                .ok_or_else(|| GenError::Config(format!("{period}: no region weights")))?;
            let region = ctx
                .catalog
                .region(&region_code)
                .ok_or_else(|| GenError::Config(format!("{period}: unknown region '{region_code}'")))?;
            let city = ctx.catalog.pick_city(region, rng).clone();
            let channel = if target.channel_weights.is_empty() {
                DEFAULT_CHANNEL.to_string()
            } else {
                weighted_pick(&target.channel_weights, |c| c.weight, rng)
                    .channel
                    .clone()
            };
            let device = ctx.catalog.pick_device(rng);
            let tier = ctx.catalog.pick_tier(rng);
            let geo = ctx.geo.assign(city.lat, city.lon, rng)?;
            let created_at = sample_between(rng, period.start(), period.end());

            let entity = Entity {
                user_id: rng.uuid().to_string(),
                created_at,
                region: region_code,
                country: city.country.to_string(),
                city: city.name.to_string(),
                channel,
                device: device.device.to_string(),
                os: device.os.to_string(),
                browser: device.browser.to_string(),
                tier: tier.to_string(),
                paying: tier != "free",
                geo,
            };
            events.push(EventRecord::new(
                rng,
                &entity.user_id,
                created_at,
                period,
                EventKind::signup_for(&entity),
            ));
            ctx.pool.push(entity);
        }

        if quotas.fallback_picks() > 0 {
            ctx.period.warn(format!(
                "{} region picks fell back after quotas ran dry",
                quotas.fallback_picks()
            ));
        }
        log::debug!(
            "{period} signup: created {} users, pool now {}",
            events.len(),
            ctx.pool.len()
        );
        Ok(events)
    }
}
