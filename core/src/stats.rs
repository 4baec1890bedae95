//! Per-period running totals and the frozen stats they fold into.
//!
//! The accumulator lives only while its period is being generated.
//! Once the last stage finishes it is folded into a read-only
//! PeriodStats row and discarded.

use crate::{
    event::{EventKind, EventRecord},
    period::Period,
    reconciler::ReconcileOutcome,
    types::EntityId,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyActiveSample {
    pub day: NaiveDate,
    pub eligible: usize,
    pub drawn: u32,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodStats {
    pub period: Period,
    pub signups: u32,
    pub signups_by_region: BTreeMap<String, u32>,
    pub daily_active: Vec<DailyActiveSample>,
    pub monthly_active: u32,
    pub event_count: u64,
    pub data_jobs: u64,
    pub bytes: f64,
    pub words: u64,
    pub failures: u64,
    pub downloads: u64,
    pub reconcile: Option<ReconcileOutcome>,
    pub tickets_raised: u32,
    pub tickets_resolved: u32,
    pub tickets_open_after: u32,
    pub warnings: Vec<String>,
}

#[derive(Debug)]
pub struct PeriodAccumulator {
    pub period: Period,
    pub signups_by_region: BTreeMap<String, u32>,
    pub daily_active: Vec<DailyActiveSample>,
    pub reconcile: Option<ReconcileOutcome>,
    pub warnings: Vec<String>,
    event_count: u64,
    data_jobs: u64,
    bytes: f64,
    words: u64,
    failures: u64,
    downloads: u64,
    tickets_raised: u32,
    tickets_resolved: u32,
    active: HashSet<EntityId>,
}

impl PeriodAccumulator {
    pub fn new(period: Period) -> Self {
        Self {
            period,
            signups_by_region: BTreeMap::new(),
            daily_active: Vec::new(),
            reconcile: None,
            warnings: Vec::new(),
            event_count: 0,
            data_jobs: 0,
            bytes: 0.0,
            words: 0,
            failures: 0,
            downloads: 0,
            tickets_raised: 0,
            tickets_resolved: 0,
            active: HashSet::new(),
        }
    }

    /// Record a data-consistency warning. The run carries on.
    pub fn warn(&mut self, message: String) {
        log::warn!("{}: {message}", self.period);
        self.warnings.push(message);
    }

    pub fn observe(&mut self, event: &EventRecord) {
        self.event_count += 1;
        match &event.kind {
            EventKind::Signup { region, .. } => {
                *self.signups_by_region.entry(region.clone()).or_insert(0) += 1;
            }
            EventKind::Active { .. } => {
                self.active.insert(event.user_id.clone());
            }
            EventKind::DataGenerated { bytes, words, .. } => {
                self.data_jobs += 1;
                self.bytes += bytes;
                self.words += words;
            }
            EventKind::JobFailed { .. } => self.failures += 1,
            EventKind::DataDownloaded { .. } => self.downloads += 1,
            EventKind::TicketRaised { .. } => self.tickets_raised += 1,
            EventKind::TicketResolved { .. } => self.tickets_resolved += 1,
            EventKind::Login { .. } => {}
        }
    }

    pub fn finish(self, tickets_open_after: usize) -> PeriodStats {
        PeriodStats {
            period: self.period,
            signups: self.signups_by_region.values().sum(),
            signups_by_region: self.signups_by_region,
            daily_active: self.daily_active,
            monthly_active: self.active.len() as u32,
            event_count: self.event_count,
            data_jobs: self.data_jobs,
            bytes: self.bytes,
            words: self.words,
            failures: self.failures,
            downloads: self.downloads,
            reconcile: self.reconcile,
            tickets_raised: self.tickets_raised,
            tickets_resolved: self.tickets_resolved,
            tickets_open_after: tickets_open_after as u32,
            warnings: self.warnings,
        }
    }
}
