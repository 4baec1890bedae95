//! Signup generation: exact quotas, complete attribute bundles.

use pulsegen_core::{
    config::{PeriodTarget, PlanConfig, RegionWeight},
    engine::GenEngine,
    event::EventKind,
    period::Period,
};

#[test]
fn signups_match_plan_exactly_every_period() {
    let mut engine = GenEngine::build_test("pop-count-test".into(), 42).unwrap();
    engine.run_all().unwrap();

    let plan = engine.plan().clone();
    for (target, stats) in plan.periods.iter().zip(engine.stats()) {
        assert_eq!(stats.signups, target.signup_count,
            "{}: expected {} signups, got {}", target.period, target.signup_count, stats.signups);
    }
    let expected: u32 = plan.periods.iter().map(|p| p.signup_count).sum();
    assert_eq!(engine.ctx.pool.len(), expected as usize);
}

#[test]
fn forty_five_signups_split_27_14_4() {
    let mut engine = GenEngine::build_test("pop-split-test".into(), 7).unwrap();
    let stats = engine.run_period().unwrap().unwrap().clone();

    assert_eq!(stats.signups, 45);
    assert_eq!(stats.signups_by_region["IN"], 27);
    assert_eq!(stats.signups_by_region["US"], 14);
    assert_eq!(stats.signups_by_region["EU"], 4);
}

#[test]
fn split_is_exact_for_any_seed() {
    for seed in 0..20 {
        let mut engine = GenEngine::build_test(format!("pop-seed-{seed}"), seed).unwrap();
        let stats = engine.run_period().unwrap().unwrap();
        assert_eq!(
            (stats.signups_by_region["IN"], stats.signups_by_region["US"], stats.signups_by_region["EU"]),
            (27, 14, 4),
            "seed {seed}"
        );
    }
}

#[test]
fn signups_carry_the_full_bundle_and_sit_in_their_period() {
    let mut engine = GenEngine::build_test("pop-bundle-test".into(), 3).unwrap();
    engine.run_all().unwrap();

    let mut signups = 0;
    for event in engine.events() {
        if let EventKind::Signup { region, country, city, channel, device, os, browser, tier, paying, .. } = &event.kind {
            signups += 1;
            let user = engine.ctx.pool.by_id(&event.user_id).expect("signup owner in pool");
            assert_eq!(user.created_at, event.timestamp);
            assert!(event.period.contains(event.timestamp));
            assert_eq!(region, &user.region);
            assert_eq!(city, &user.city);
            assert_eq!(*paying, tier != "free");
            for field in [country, channel, device, os, browser] {
                assert!(!field.is_empty());
            }
        }
    }
    assert_eq!(signups, engine.ctx.pool.len());
}

#[test]
fn single_region_plan_puts_everyone_there() {
    let mut plan = PlanConfig::default_test();
    plan.periods.truncate(1);
    plan.periods[0] = PeriodTarget {
        region_weights: vec![RegionWeight { region: "APAC".into(), weight: 1.0 }],
        ..plan.periods[0].clone()
    };
    plan.periods[0].period = Period::new(2025, 4).unwrap();

    let mut engine = GenEngine::build("pop-apac".into(), 11, plan).unwrap();
    engine.run_all().unwrap();
    assert!(engine.ctx.pool.iter().all(|u| u.region == "APAC"));
}
