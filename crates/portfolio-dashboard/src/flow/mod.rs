//! Interaction Flows
//!
//! The three state machines behind the dashboard: the pull gesture, the
//! refresh it triggers, and the on-demand advice request.

mod gesture;
mod refresh;
mod advice;

pub use gesture::{
    GestureController, Release, DAMPING, INDICATOR_VISIBLE_AFTER, MAX_PULL, REFRESHING_OFFSET,
    REFRESH_THRESHOLD,
};
pub use refresh::{RefreshOrchestrator, RefreshState};
pub use advice::{build_prompt, Advice, AdviceOrchestrator, AdviceSource, AdviceState, FALLBACK_ADVICE};

use serde::{Deserialize, Serialize};

/// Identifies one in-flight command so late completions can be discarded
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ticket(u64);

impl Ticket {
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Ticket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic ticket source, one per orchestrator
#[derive(Clone, Debug, Default)]
pub(crate) struct TicketCounter(u64);

impl TicketCounter {
    pub(crate) const fn issue(&mut self) -> Ticket {
        self.0 += 1;
        Ticket(self.0)
    }
}
