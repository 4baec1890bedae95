//! Read-only reporting over a persisted artifact.
//!
//! Works on raw JSON rather than EventRecord so that artifacts from older
//! runs, or hand-edited ones, still summarize: a missing `user_id`,
//! payload field or period never fails the pass.

use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonthlyReport {
    pub events: u64,
    pub signups: u64,
    pub active_users: u64,
    pub data_jobs: u64,
    pub bytes: f64,
    pub words: u64,
    pub failures: u64,
    pub downloads: u64,
    pub tickets_raised: u64,
    pub tickets_resolved: u64,
    pub anonymous_events: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    pub months: BTreeMap<String, MonthlyReport>,
    pub skipped: u64,
}

/// Month key for a record: the `period` field, else the first seven
/// characters of an RFC 3339 `timestamp`.
fn month_of(record: &Value) -> Option<String> {
    if let Some(p) = record.get("period").and_then(Value::as_str) {
        return Some(p.to_string());
    }
    let ts = record.get("timestamp").and_then(Value::as_str)?;
    chrono::DateTime::parse_from_rfc3339(ts)
        .ok()
        .map(|t| t.format("%Y-%m").to_string())
}

pub fn summarize(records: &[Value]) -> Report {
    let mut report = Report::default();
    let mut actives: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for record in records {
        let Some(month) = month_of(record) else {
            report.skipped += 1;
            continue;
        };
        let m = report.months.entry(month.clone()).or_default();
        m.events += 1;
        let user = record.get("user_id").and_then(Value::as_str);
        if user.is_none() {
            m.anonymous_events += 1;
        }
        match record.get("event").and_then(Value::as_str).unwrap_or("") {
            "signup" => m.signups += 1,
            "active" => {
                if let Some(u) = user {
                    actives.entry(month).or_default().insert(u.to_string());
                }
            }
            "data_generated" => {
                m.data_jobs += 1;
                m.bytes += record.get("bytes").and_then(Value::as_f64).unwrap_or(0.0);
                m.words += record.get("words").and_then(Value::as_u64).unwrap_or(0);
            }
            "job_failed" => m.failures += 1,
            "data_downloaded" => m.downloads += 1,
            "ticket_raised" => m.tickets_raised += 1,
            "ticket_resolved" => m.tickets_resolved += 1,
            _ => {}
        }
    }
    for (month, users) in actives {
        if let Some(m) = report.months.get_mut(&month) {
            m.active_users = users.len() as u64;
        }
    }
    report
}
