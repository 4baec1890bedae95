//! pulsegen: seeded synthetic telemetry generator.
//!
//! Usage:
//!   pulsegen --seed 42 --plan plan.json --out events.json --db run.db
//!   pulsegen --seed 42 --plan plan.json --upload
//!   pulsegen --report events.json

mod http_sink;

use anyhow::{Context, Result};
use http_sink::HttpSink;
use pulsegen_core::{
    artifact,
    config::{IngestConfig, PlanConfig},
    engine::{GenEngine, RunOutput},
    report,
    sink::{project, submit_all},
    store::TelemetryStore,
};
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if let Some(path) = str_arg(&args, "--report") {
        let records = artifact::read_raw(path).with_context(|| format!("reading {path}"))?;
        let summary = report::summarize(&records);
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let seed = parse_arg(&args, "--seed", 42u64);
    let plan_path = str_arg(&args, "--plan");
    let out = str_arg(&args, "--out").unwrap_or("events.json");
    let db = str_arg(&args, "--db");
    let upload = args.iter().any(|a| a == "--upload");

    // Credentials are checked before anything is generated.
    let ingest = if upload {
        Some(IngestConfig::from_env()?)
    } else {
        None
    };

    let plan = match plan_path {
        Some(path) => PlanConfig::load(path)?,
        None => PlanConfig::default_test(),
    };

    println!("pulsegen");
    println!("  seed:    {seed}");
    println!("  plan:    {}", plan_path.unwrap_or("(built-in test plan)"));
    println!("  periods: {}", plan.periods.len());
    println!("  out:     {out}");
    println!("  db:      {}", db.unwrap_or("(none)"));
    println!("  upload:  {upload}");
    println!();

    let run_id = format!("run-{seed}-{}", chrono::Utc::now().timestamp());
    let mut engine = GenEngine::build(run_id.clone(), seed, plan)?;
    engine.run_all()?;
    let output = engine.finish();

    artifact::write_json(out, &output.events)?;

    if let Some(db) = db {
        let mut store = TelemetryStore::open(db)?;
        store.migrate()?;
        store.insert_run(&run_id, seed, env!("CARGO_PKG_VERSION"))?;
        store.append_events(&run_id, &output.events)?;
        for stats in &output.stats {
            store.insert_period_stats(&run_id, stats)?;
        }
        log::info!("persisted {} events to {db}", store.event_count(&run_id)?);
    }

    if let Some(ingest) = ingest {
        log::info!("uploading to {} in batches of {}", ingest.url, ingest.batch_size);
        let mut sink = HttpSink::new(ingest)?;
        let uploaded = submit_all(&output.events, &mut sink, project)?;
        println!("uploaded {} records in {} batches", uploaded.records, uploaded.batches);
    }

    print_summary(&output);
    Ok(())
}

fn print_summary(output: &RunOutput) {
    println!("=== RUN SUMMARY ===");
    println!("  run_id:  {}", output.run_id);
    println!("  seed:    {}", output.seed);
    println!("  events:  {}", output.events.len());
    println!();
    for s in &output.stats {
        let regions: Vec<String> = s
            .signups_by_region
            .iter()
            .map(|(r, n)| format!("{r}={n}"))
            .collect();
        println!(
            "  {} | signups {} ({}) | mau {} | jobs {} | bytes {:.0} | tickets +{}/-{} open {}",
            s.period,
            s.signups,
            regions.join(" "),
            s.monthly_active,
            s.data_jobs,
            s.bytes,
            s.tickets_raised,
            s.tickets_resolved,
            s.tickets_open_after
        );
        for w in &s.warnings {
            println!("      warning: {w}");
        }
    }
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn str_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
