//! # portfolio-dashboard
//!
//! Headless interaction logic for a wealth dashboard: a pull-to-refresh
//! gesture, a refresh cycle against a portfolio source, and an AI advice
//! panel backed by any [`advisor_core::LlmProvider`].
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  touch / button input                                       │
//! │        │                                                    │
//! │        ▼                                                    │
//! │  ┌───────────┐  Command   ┌─────────────────┐               │
//! │  │ Dashboard │──────────▶ │ DashboardDriver │──▶ source     │
//! │  │ (sync FSM)│ ◀───────── │     (async)     │──▶ LLM        │
//! │  └───────────┘   Event    └─────────────────┘               │
//! │        │                                                    │
//! │        ▼                                                    │
//! │  DashboardView (JSON render model)                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! All state lives in [`Dashboard`]. Network work happens in the driver and
//! comes back as events carrying the ticket they were issued with, so a late
//! completion can never clobber a newer request.

pub mod model;
pub mod error;
pub mod flow;
pub mod source;
pub mod dashboard;
pub mod view;
pub mod driver;

pub use dashboard::{Command, Dashboard, Event, Input};
pub use driver::{DashboardDriver, DriverConfig};
pub use error::{DashboardError, Result};
pub use flow::{
    Advice, AdviceSource, AdviceState, RefreshState, Release, Ticket, FALLBACK_ADVICE,
};
pub use model::{Asset, PortfolioSnapshot, PortfolioStats};
pub use source::{sample_snapshot, MockPortfolioSource, PortfolioSource};
pub use view::DashboardView;
