//! Dashboard State Machine
//!
//! Single owner of all interaction state. Every change goes through
//! [`Dashboard::dispatch`], which may hand back a [`Command`] for the host to
//! execute; the host reports the outcome with another event.
//!
//! ```text
//!  Input ──▶ dispatch ──▶ Option<Command> ──▶ host (async) ──▶ Event ──▶ dispatch
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};
use crate::flow::{AdviceOrchestrator, GestureController, RefreshOrchestrator, Release, Ticket};
use crate::model::PortfolioSnapshot;

/// User-originated events
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Input {
    /// Finger down at `y`; `scroll_top` is the container's scroll offset
    TouchStart { y: f64, scroll_top: f64 },
    TouchMove { y: f64 },
    TouchEnd,
    /// "Generate Insights" pressed
    FetchAdvice,
    /// "Dismiss" pressed
    DismissAdvice,
}

/// Everything the state machine reacts to
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Input(Input),

    /// A `Command::Refresh` finished
    RefreshFinished {
        ticket: Ticket,
        outcome: Result<PortfolioSnapshot>,
    },

    /// A `Command::GenerateAdvice` finished
    AdviceFinished {
        ticket: Ticket,
        result: std::result::Result<String, DashboardError>,
    },
}

impl From<Input> for Event {
    fn from(input: Input) -> Self {
        Self::Input(input)
    }
}

/// Side effects requested by the state machine
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Fetch a fresh snapshot from the data source
    Refresh { ticket: Ticket },

    /// Send `prompt` to the advice service
    GenerateAdvice { ticket: Ticket, prompt: String },
}

impl Command {
    pub const fn ticket(&self) -> Ticket {
        match self {
            Self::Refresh { ticket } | Self::GenerateAdvice { ticket, .. } => *ticket,
        }
    }
}

/// Explicit UI state for one dashboard session
#[derive(Clone, Debug)]
pub struct Dashboard {
    snapshot: PortfolioSnapshot,
    gesture: GestureController,
    refresh: RefreshOrchestrator,
    advice: AdviceOrchestrator,
}

impl Dashboard {
    pub fn new(snapshot: PortfolioSnapshot) -> Self {
        Self {
            snapshot,
            gesture: GestureController::new(),
            refresh: RefreshOrchestrator::new(),
            advice: AdviceOrchestrator::new(),
        }
    }

    pub const fn snapshot(&self) -> &PortfolioSnapshot {
        &self.snapshot
    }

    pub const fn gesture(&self) -> &GestureController {
        &self.gesture
    }

    pub const fn refresh(&self) -> &RefreshOrchestrator {
        &self.refresh
    }

    pub const fn advice(&self) -> &AdviceOrchestrator {
        &self.advice
    }

    pub const fn pull_distance(&self) -> f64 {
        self.gesture.pull_distance()
    }

    pub const fn is_refreshing(&self) -> bool {
        self.refresh.is_refreshing()
    }

    pub const fn is_loading_advice(&self) -> bool {
        self.advice.is_loading()
    }

    /// Apply one event; returns the command the host should run, if any.
    pub fn dispatch(&mut self, event: impl Into<Event>) -> Option<Command> {
        match event.into() {
            Event::Input(input) => self.on_input(input),
            Event::RefreshFinished { ticket, outcome } => {
                if self.refresh.complete(ticket, outcome.as_ref().err()) {
                    self.gesture.reset();
                    if let Ok(snapshot) = outcome {
                        self.snapshot = snapshot;
                    }
                }
                None
            }
            Event::AdviceFinished { ticket, result } => {
                self.advice.resolve(ticket, result);
                None
            }
        }
    }

    fn on_input(&mut self, input: Input) -> Option<Command> {
        match input {
            Input::TouchStart { y, scroll_top } => {
                self.gesture.on_touch_start(y, scroll_top);
                None
            }
            Input::TouchMove { y } => {
                self.gesture.on_touch_move(y);
                None
            }
            Input::TouchEnd => match self.gesture.on_touch_end() {
                Release::Refresh => self.refresh.trigger().map(|ticket| Command::Refresh { ticket }),
                Release::Cancelled | Release::Idle => None,
            },
            Input::FetchAdvice => self
                .advice
                .fetch(&self.snapshot)
                .map(|(ticket, prompt)| Command::GenerateAdvice { ticket, prompt }),
            Input::DismissAdvice => {
                self.advice.dismiss();
                None
            }
        }
    }
}
