//! Support-ticket ledger.
//!
//! STATE MACHINE: RAISED -> RESOLVED. Resolved is terminal. Tickets that
//! stay raised carry over into later periods with no expiry.

use crate::{
    error::{GenError, GenResult},
    types::{EntityId, Instant},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketState {
    Raised,
    Resolved,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub ticket_id: String,
    pub user_id: EntityId,
    pub raised_at: Instant,
    pub resolved_at: Option<Instant>,
    pub state: TicketState,
}

#[derive(Debug, Default)]
pub struct TicketLedger {
    tickets: Vec<Ticket>,
    index: HashMap<String, usize>,
}

impl TicketLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a ticket. Ids are sequential over the whole run.
    pub fn raise(&mut self, user_id: &str, at: Instant) -> &Ticket {
        let ticket_id = format!("TKT-{:06}", self.tickets.len() + 1);
        self.index.insert(ticket_id.clone(), self.tickets.len());
        self.tickets.push(Ticket {
            ticket_id,
            user_id: user_id.to_string(),
            raised_at: at,
            resolved_at: None,
            state: TicketState::Raised,
        });
        &self.tickets[self.tickets.len() - 1]
    }

    pub fn resolve(&mut self, ticket_id: &str, at: Instant) -> GenResult<&Ticket> {
        let fail = |reason| GenError::TicketState {
            ticket_id: ticket_id.to_string(),
            action: "resolved",
            reason,
        };
        let idx = *self.index.get(ticket_id).ok_or_else(|| fail("never raised"))?;
        let ticket = &mut self.tickets[idx];
        if ticket.state == TicketState::Resolved {
            return Err(fail("already resolved"));
        }
        if at < ticket.raised_at {
            return Err(fail("resolution precedes raise"));
        }
        ticket.state = TicketState::Resolved;
        ticket.resolved_at = Some(at);
        Ok(ticket)
    }

    /// Tickets still in RAISED, in the order they were raised.
    pub fn open(&self) -> impl Iterator<Item = &Ticket> {
        self.tickets.iter().filter(|t| t.state == TicketState::Raised)
    }

    pub fn open_count(&self) -> usize {
        self.open().count()
    }

    pub fn get(&self, ticket_id: &str) -> Option<&Ticket> {
        self.index.get(ticket_id).map(|&i| &self.tickets[i])
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }
}
