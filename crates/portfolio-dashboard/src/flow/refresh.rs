//! Refresh Orchestrator
//!
//! Busy flag for the data refresh: `Idle -[trigger]-> Refreshing -[complete]-> Idle`.

use serde::Serialize;

use super::{Ticket, TicketCounter};
use crate::error::DashboardError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RefreshState {
    #[default]
    Idle,
    Refreshing { ticket: Ticket },
}

#[derive(Clone, Debug, Default)]
pub struct RefreshOrchestrator {
    state: RefreshState,
    tickets: TicketCounter,
    last_failure: Option<String>,
}

impl RefreshOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn state(&self) -> RefreshState {
        self.state
    }

    pub const fn is_refreshing(&self) -> bool {
        matches!(self.state, RefreshState::Refreshing { .. })
    }

    /// Message of the most recent failed refresh, cleared by the next success
    pub fn last_failure(&self) -> Option<&str> {
        self.last_failure.as_deref()
    }

    /// Start a refresh. Returns `None` while one is already running.
    pub fn trigger(&mut self) -> Option<Ticket> {
        if let RefreshState::Refreshing { ticket } = self.state {
            tracing::debug!(%ticket, "refresh already running, trigger ignored");
            return None;
        }

        let ticket = self.tickets.issue();
        self.state = RefreshState::Refreshing { ticket };
        tracing::debug!(%ticket, "refresh started");
        Some(ticket)
    }

    /// Finish the refresh identified by `ticket`.
    ///
    /// Returns `false` (and changes nothing) for a ticket that is not in flight.
    pub fn complete(&mut self, ticket: Ticket, failure: Option<&DashboardError>) -> bool {
        if self.state != (RefreshState::Refreshing { ticket }) {
            tracing::warn!(%ticket, "stale refresh completion dropped");
            return false;
        }

        self.state = RefreshState::Idle;
        self.last_failure = failure.map(ToString::to_string);
        match failure {
            Some(err) => tracing::warn!(%ticket, error = %err, "refresh failed"),
            None => tracing::debug!(%ticket, "refresh finished"),
        }
        true
    }
}
