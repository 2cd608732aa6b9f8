//! Error Types for the Portfolio Dashboard

use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DashboardError>;

/// Dashboard errors travel inside completion events, so they are `Clone`
/// and carry rendered messages rather than source errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DashboardError {
    #[error("Advice service error: {0}")]
    Advice(String),

    #[error("Advice service returned an empty response")]
    EmptyAdvice,

    #[error("{operation} timed out after {}s", .timeout.as_secs())]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    #[error("Portfolio source error: {0}")]
    Source(String),

    #[error("Invalid portfolio: {0}")]
    InvalidPortfolio(String),
}

impl From<advisor_core::AdvisorError> for DashboardError {
    fn from(err: advisor_core::AdvisorError) -> Self {
        Self::Advice(err.to_string())
    }
}
