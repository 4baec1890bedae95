//! Ticket lifecycle across periods.

use chrono::{TimeZone, Utc};
use pulsegen_core::{
    catalog::Catalog,
    config::{GeneratorConfig, PeriodTarget},
    context::RunContext,
    engine::GenEngine,
    entity::Entity,
    event::EventKind,
    geo::GeoPoint,
    period::Period,
    rng::StageRng,
    stage::PeriodStage,
    ticket_stage::TicketStage,
};
use std::collections::HashMap;

fn user(id: &str, created_at: chrono::DateTime<Utc>) -> Entity {
    Entity {
        user_id: id.into(),
        created_at,
        region: "US".into(),
        country: "US".into(),
        city: "Austin".into(),
        channel: "organic".into(),
        device: "desktop".into(),
        os: "Linux".into(),
        browser: "Firefox".into(),
        tier: "free".into(),
        paying: false,
        geo: GeoPoint { lat: 30.267, lon: -97.743 },
    }
}

fn resolve_only(period: Period, resolved: u32) -> PeriodTarget {
    PeriodTarget {
        period,
        signup_count: 0,
        daily_active_target: None,
        daily_active_range: None,
        monthly_active_target: 0,
        volume_target_bytes: None,
        region_weights: vec![],
        channel_weights: vec![],
        tickets_raised: 0,
        tickets_resolved: resolved,
    }
}

#[test]
fn resolutions_follow_raises_on_every_prefix() {
    let mut engine = GenEngine::build_test("tkt-prefix".into(), 42).unwrap();
    engine.run_all().unwrap();
    let out = engine.finish();

    let mut raised: HashMap<&str, chrono::DateTime<Utc>> = HashMap::new();
    let mut resolved: HashMap<&str, u32> = HashMap::new();
    let (mut n_raised, mut n_resolved) = (0u32, 0u32);

    for e in &out.events {
        match &e.kind {
            EventKind::TicketRaised { ticket_id, .. } => {
                assert!(raised.insert(ticket_id, e.timestamp).is_none(), "{ticket_id} raised twice");
                n_raised += 1;
            }
            EventKind::TicketResolved { ticket_id, resolution_minutes } => {
                let at = raised.get(ticket_id.as_str()).expect("resolved before raised");
                assert!(e.timestamp >= *at);
                assert_eq!(*resolution_minutes, (e.timestamp - *at).num_minutes());
                *resolved.entry(ticket_id).or_default() += 1;
                n_resolved += 1;
            }
            _ => {}
        }
        assert!(n_resolved <= n_raised);
    }
    assert!(resolved.values().all(|&n| n == 1));
    assert!(n_resolved > 0, "expected some resolutions");
}

#[test]
fn unresolved_tickets_carry_over() {
    let mut engine = GenEngine::build_test("tkt-carry".into(), 3).unwrap();
    engine.run_all().unwrap();

    // Plan: +6/-3, +8/-6, +10/-12  → open after each: 3, 5, 3.
    let open: Vec<u32> = engine.stats().iter().map(|s| s.tickets_open_after).collect();
    assert_eq!(open, vec![3, 5, 3]);
    let resolved: Vec<u32> = engine.stats().iter().map(|s| s.tickets_resolved).collect();
    assert_eq!(resolved, vec![3, 6, 12]);
}

#[test]
fn ticket_raised_on_day_five_resolves_within_period() {
    let period = Period::new(2023, 2).unwrap();
    let day5 = Utc.with_ymd_and_hms(2023, 2, 5, 14, 30, 0).unwrap();
    for seed in 0..50 {
        let mut ctx = RunContext::new(Catalog::builtin(), GeneratorConfig::default(), period);
        ctx.pool.push(user("u-1", Utc.with_ymd_and_hms(2023, 2, 1, 8, 0, 0).unwrap()));
        let id = ctx.tickets.raise("u-1", day5).ticket_id.clone();

        let mut rng = StageRng::from_seed(seed);
        let events = TicketStage::new()
            .run(&resolve_only(period, 1), &mut ctx, &[], &mut rng)
            .unwrap();

        assert_eq!(events.len(), 1);
        let e = &events[0];
        assert_eq!(e.ticket_id(), Some(id.as_str()));
        assert!(e.timestamp >= day5, "seed {seed}: resolved {} before raise", e.timestamp);
        assert!(e.timestamp < period.end(), "seed {seed}: resolved after February");
        assert_eq!(ctx.tickets.open_count(), 0);
    }
}

#[test]
fn carried_ticket_resolves_no_earlier_than_period_start() {
    let jan = Period::new(2024, 1).unwrap();
    let feb = jan.next();
    let mut ctx = RunContext::new(Catalog::builtin(), GeneratorConfig::default(), feb);
    ctx.pool.push(user("u-1", Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()));
    ctx.tickets.raise("u-1", Utc.with_ymd_and_hms(2024, 1, 20, 0, 0, 0).unwrap());

    let mut rng = StageRng::from_seed(1);
    let events = TicketStage::new()
        .run(&resolve_only(feb, 5), &mut ctx, &[], &mut rng)
        .unwrap();

    assert_eq!(events.len(), 1, "only one ticket was open");
    assert!(feb.contains(events[0].timestamp));
    assert_eq!(ctx.period.warnings.len(), 1);
}
