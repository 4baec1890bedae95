//! Event records: the generator's only output.
//!
//! RULE: once an event is built its id, owner and timestamp never change.
//! The reconciler may rewrite magnitude fields (`bytes`, `words`) of
//! `DataGenerated` events, and nothing else.

use crate::{
    entity::Entity,
    period::Period,
    rng::StageRng,
    types::{EntityId, Instant},
};
use serde::{Deserialize, Serialize};

/// Every kind of event the generator emits.
/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventKind {
    Signup {
        region: String,
        country: String,
        city: String,
        channel: String,
        device: String,
        os: String,
        browser: String,
        tier: String,
        paying: bool,
        lat: f64,
        lon: f64,
    },
    Login {
        device: String,
    },
    Active {
        /// True when the activity came from the monthly top-up rather
        /// than a daily draw.
        top_up: bool,
    },
    DataGenerated {
        job_id: String,
        bytes: f64,
        words: u64,
    },
    JobFailed {
        job_id: String,
        error_code: String,
    },
    DataDownloaded {
        job_id: String,
        bytes: f64,
    },
    TicketRaised {
        ticket_id: String,
        category: String,
    },
    TicketResolved {
        ticket_id: String,
        resolution_minutes: i64,
    },
}

impl EventKind {
    /// Extract a stable string name from an EventKind variant.
    /// Matches the serde tag, and is what the sink sees as the event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Signup { .. }         => "signup",
            Self::Login { .. }          => "login",
            Self::Active { .. }         => "active",
            Self::DataGenerated { .. }  => "data_generated",
            Self::JobFailed { .. }      => "job_failed",
            Self::DataDownloaded { .. } => "data_downloaded",
            Self::TicketRaised { .. }   => "ticket_raised",
            Self::TicketResolved { .. } => "ticket_resolved",
        }
    }

    pub fn signup_for(entity: &Entity) -> Self {
        Self::Signup {
            region: entity.region.clone(),
            country: entity.country.clone(),
            city: entity.city.clone(),
            channel: entity.channel.clone(),
            device: entity.device.clone(),
            os: entity.os.clone(),
            browser: entity.browser.clone(),
            tier: entity.tier.clone(),
            paying: entity.paying,
            lat: entity.geo.lat,
            lon: entity.geo.lon,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_id: String,
    pub user_id: EntityId,
    pub timestamp: Instant,
    pub period: Period,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl EventRecord {
    /// Build an event with an id drawn from the stage stream.
    pub fn new(rng: &mut StageRng, user_id: &str, timestamp: Instant, period: Period, kind: EventKind) -> Self {
        Self {
            event_id: rng.uuid().to_string(),
            user_id: user_id.to_string(),
            timestamp,
            period,
            kind,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Bytes carried by a data event, if any.
    pub fn bytes(&self) -> Option<f64> {
        match &self.kind {
            EventKind::DataGenerated { bytes, .. } | EventKind::DataDownloaded { bytes, .. } => {
                Some(*bytes)
            }
            _ => None,
        }
    }

    pub fn ticket_id(&self) -> Option<&str> {
        match &self.kind {
            EventKind::TicketRaised { ticket_id, .. } | EventKind::TicketResolved { ticket_id, .. } => {
                Some(ticket_id)
            }
            _ => None,
        }
    }
}

/// Stable chronological order. Ties keep emission order, so a raise
/// emitted before its resolution stays ahead of it.
pub fn sort_chronologically(events: &mut [EventRecord]) {
    events.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
}
