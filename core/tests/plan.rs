//! Plan file loading and validation.

use pulsegen_core::{
    catalog::Catalog,
    config::{ChannelWeight, DailyActiveRange, PlanConfig},
    engine::GenEngine,
    error::GenError,
};
use std::io::Write;

fn sample_plan_path() -> String {
    format!("{}/../data/plan.json", env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn sample_plan_loads_and_runs() {
    let plan = PlanConfig::load(&sample_plan_path()).unwrap();
    assert_eq!(plan.periods.len(), 3);
    assert_eq!(plan.periods[1].daily_active(), Some(DailyActiveRange(30, 55)));
    assert_eq!(plan.periods[0].daily_active(), Some(DailyActiveRange(7, 12)));
    assert_eq!(plan.generator.failure_probability, 0.05);
    assert_eq!(plan.generator.bytes_per_word, 6.2, "unset tuning keeps its default");

    let mut engine = GenEngine::build("plan-sample".into(), 5, plan).unwrap();
    engine.run_all().unwrap();
    let signups: Vec<u32> = engine.stats().iter().map(|s| s.signups).collect();
    assert_eq!(signups, vec![45, 120, 160]);
}

#[test]
fn unknown_region_is_rejected() {
    let mut plan = PlanConfig::default_test();
    plan.periods[0].region_weights[0].region = "MARS".into();
    let err = plan.validate(&Catalog::builtin()).unwrap_err();
    assert!(matches!(err, GenError::Config(_)), "{err}");
    assert!(GenEngine::build("bad".into(), 1, plan).is_err());
}

#[test]
fn malformed_period_fails_to_load() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"periods": [{{"period": "2024-13", "signupCount": 1,
            "regionWeights": [{{"region": "IN", "weight": 1.0}}]}}]}}"#
    )
    .unwrap();
    assert!(PlanConfig::load(file.path().to_str().unwrap()).is_err());
}

fn assert_config_error(plan: &PlanConfig) {
    match plan.validate(&Catalog::builtin()) {
        Err(GenError::Config(_)) => {}
        other => panic!("expected a config error, got {other:?}"),
    }
}

#[test]
fn periods_must_strictly_increase() {
    let mut plan = PlanConfig::default_test();
    plan.periods.swap(0, 1);
    assert_config_error(&plan);

    let mut plan = PlanConfig::default_test();
    plan.periods[1].period = plan.periods[0].period;
    assert_config_error(&plan);
}

#[test]
fn negative_weight_is_rejected() {
    let mut plan = PlanConfig::default_test();
    plan.periods[1].region_weights[2].weight = -0.1;
    assert_config_error(&plan);

    let mut plan = PlanConfig::default_test();
    plan.periods[0].channel_weights[0].weight = -1.0;
    assert_config_error(&plan);
}

#[test]
fn all_zero_weights_are_rejected() {
    let mut plan = PlanConfig::default_test();
    for w in plan.periods[2].region_weights.iter_mut() {
        w.weight = 0.0;
    }
    assert_config_error(&plan);

    let mut plan = PlanConfig::default_test();
    plan.periods[0].channel_weights = vec![ChannelWeight { channel: "organic".into(), weight: 0.0 }];
    assert_config_error(&plan);
}

#[test]
fn inverted_daily_range_is_rejected() {
    let mut plan = PlanConfig::default_test();
    plan.periods[0].daily_active_range = Some(DailyActiveRange(9, 3));
    assert_config_error(&plan);

    plan.periods[0].daily_active_range = Some(DailyActiveRange(3, 3));
    assert!(plan.validate(&Catalog::builtin()).is_ok());
}
