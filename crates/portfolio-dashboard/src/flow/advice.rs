//! Advice Fetch Orchestrator
//!
//! ```text
//! Idle ──fetch──▶ Loading ──success──▶ Loaded(text)     ──dismiss──▶ Idle
//!                    └─────failure──▶ Loaded(fallback) ──dismiss──▶ Idle
//! ```
//!
//! At most one request is in flight. A fetch is accepted only from `Idle`;
//! shown advice must be dismissed before requesting more.
//! Failures never surface as an error state, they become the fallback text.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Ticket, TicketCounter};
use crate::error::DashboardError;
use crate::model::PortfolioSnapshot;

/// Shown whenever the advice service fails
pub const FALLBACK_ADVICE: &str =
    "Unable to load AI insights at this time. Please check your market strategy manually.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdviceSource {
    Generated,
    Fallback,
}

/// Advice text ready for display
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Advice {
    pub text: String,
    pub source: AdviceSource,
    pub received_at: DateTime<Utc>,
}

impl Advice {
    fn generated(text: String) -> Self {
        Self {
            text,
            source: AdviceSource::Generated,
            received_at: Utc::now(),
        }
    }

    fn fallback() -> Self {
        Self {
            text: FALLBACK_ADVICE.into(),
            source: AdviceSource::Fallback,
            received_at: Utc::now(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == AdviceSource::Fallback
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AdviceState {
    #[default]
    Idle,
    Loading { ticket: Ticket },
    Loaded(Advice),
}

#[derive(Clone, Debug, Default)]
pub struct AdviceOrchestrator {
    state: AdviceState,
    tickets: TicketCounter,
}

impl AdviceOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn state(&self) -> &AdviceState {
        &self.state
    }

    pub const fn is_loading(&self) -> bool {
        matches!(self.state, AdviceState::Loading { .. })
    }

    pub const fn advice(&self) -> Option<&Advice> {
        match &self.state {
            AdviceState::Loaded(advice) => Some(advice),
            _ => None,
        }
    }

    /// Begin a request for `snapshot`. Returns the ticket and prompt to send,
    /// or `None` unless idle.
    pub fn fetch(&mut self, snapshot: &PortfolioSnapshot) -> Option<(Ticket, String)> {
        match &self.state {
            AdviceState::Idle => {}
            AdviceState::Loading { ticket } => {
                tracing::debug!(%ticket, "advice already loading, fetch ignored");
                return None;
            }
            AdviceState::Loaded(_) => {
                tracing::debug!("advice shown, fetch ignored until dismissed");
                return None;
            }
        }

        let ticket = self.tickets.issue();
        self.state = AdviceState::Loading { ticket };
        tracing::debug!(%ticket, "advice requested");
        Some((ticket, build_prompt(snapshot)))
    }

    /// Apply the service result for `ticket`.
    ///
    /// Blank text counts as a failure. Returns `false` for a stale ticket.
    pub fn resolve(&mut self, ticket: Ticket, result: Result<String, DashboardError>) -> bool {
        if self.state != (AdviceState::Loading { ticket }) {
            tracing::warn!(%ticket, "stale advice response dropped");
            return false;
        }

        let result = result.and_then(|text| {
            if text.trim().is_empty() {
                Err(DashboardError::EmptyAdvice)
            } else {
                Ok(text)
            }
        });

        let advice = match result {
            Ok(text) => Advice::generated(text),
            Err(err) => {
                tracing::error!(%ticket, error = %err, "advice generation failed");
                Advice::fallback()
            }
        };
        self.state = AdviceState::Loaded(advice);
        true
    }

    /// Clear shown advice. No-op while idle or loading.
    pub fn dismiss(&mut self) -> bool {
        if matches!(self.state, AdviceState::Loaded(_)) {
            self.state = AdviceState::Idle;
            true
        } else {
            false
        }
    }
}

/// Natural-language prompt describing the snapshot
pub fn build_prompt(snapshot: &PortfolioSnapshot) -> String {
    let stats = snapshot.stats();
    let currency = &stats.currency;

    let assets = snapshot
        .assets()
        .iter()
        .map(|a| {
            format!(
                "{}: {} {} (Value: {}{})",
                a.name,
                a.amount.normalize(),
                a.symbol,
                currency,
                a.value_fiat.normalize()
            )
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "As a world-class financial advisor specialized in crypto, analyze this portfolio:\n\
         Total Balance: {currency}{total_balance}\n\
         Total Earnings: {currency}{total_earnings}\n\
         Assets: {assets}\n\
         \n\
         Provide 3 concise, bulleted recommendations for optimization.\n\
         Focus on APY, diversification, and market sentiment.\n\
         Keep it professional and encouraging.\n\
         Format as plain text with bullets.",
        total_balance = stats.total_balance.normalize(),
        total_earnings = stats.total_earnings.normalize(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::sample_snapshot;

    fn loading() -> (AdviceOrchestrator, Ticket) {
        let mut a = AdviceOrchestrator::new();
        let (ticket, _) = a.fetch(&sample_snapshot()).unwrap();
        (a, ticket)
    }

    #[test]
    fn test_fetch_sets_loading() {
        let (a, ticket) = loading();
        assert!(a.is_loading());
        assert_eq!(a.state(), &AdviceState::Loading { ticket });
        assert!(a.advice().is_none());
    }

    #[test]
    fn test_single_in_flight_request() {
        let (mut a, ticket) = loading();
        assert!(a.fetch(&sample_snapshot()).is_none());
        assert_eq!(a.state(), &AdviceState::Loading { ticket });
    }

    #[test]
    fn test_success_stored_verbatim() {
        let (mut a, ticket) = loading();
        let text = "• Stake idle USDC\n• Rebalance ETH\n• Watch sentiment ";
        assert!(a.resolve(ticket, Ok(text.into())));
        assert!(!a.is_loading());

        let advice = a.advice().unwrap();
        assert_eq!(advice.text, text);
        assert_eq!(advice.source, AdviceSource::Generated);
    }

    #[test]
    fn test_failure_becomes_fallback() {
        let (mut a, ticket) = loading();
        a.resolve(ticket, Err(DashboardError::Advice("network down".into())));
        assert!(!a.is_loading());

        let advice = a.advice().unwrap();
        assert_eq!(advice.text, FALLBACK_ADVICE);
        assert!(advice.is_fallback());
    }

    #[test]
    fn test_blank_response_becomes_fallback() {
        let (mut a, ticket) = loading();
        a.resolve(ticket, Ok("  \n".into()));
        assert_eq!(a.advice().unwrap().text, FALLBACK_ADVICE);
    }

    #[test]
    fn test_stale_response_dropped() {
        let (mut a, first) = loading();
        a.resolve(first, Ok("first".into()));
        a.dismiss();
        let (second, _) = a.fetch(&sample_snapshot()).unwrap();

        assert!(!a.resolve(first, Ok("late".into())));
        assert_eq!(a.state(), &AdviceState::Loading { ticket: second });
    }

    #[test]
    fn test_fetch_ignored_while_advice_shown() {
        let (mut a, ticket) = loading();
        a.resolve(ticket, Ok("• Hold".into()));

        assert!(a.fetch(&sample_snapshot()).is_none());
        assert_eq!(a.advice().unwrap().text, "• Hold");

        a.dismiss();
        assert!(a.fetch(&sample_snapshot()).is_some());
    }

    #[test]
    fn test_dismiss_only_from_loaded() {
        let mut a = AdviceOrchestrator::new();
        assert!(!a.dismiss());

        let (ticket, _) = a.fetch(&sample_snapshot()).unwrap();
        assert!(!a.dismiss());
        assert!(a.is_loading());

        a.resolve(ticket, Ok("ok".into()));
        assert!(a.dismiss());
        assert_eq!(a.state(), &AdviceState::Idle);
    }

    #[test]
    fn test_restartable() {
        let mut a = AdviceOrchestrator::new();
        for round in 0..3 {
            let (ticket, _) = a.fetch(&sample_snapshot()).unwrap();
            a.resolve(ticket, Ok(format!("round {round}")));
            assert!(a.dismiss());
        }
        assert_eq!(a.state(), &AdviceState::Idle);
    }

    #[test]
    fn test_prompt_contents() {
        let prompt = build_prompt(&sample_snapshot());
        assert!(prompt.starts_with("As a world-class financial advisor specialized in crypto"));
        assert!(prompt.contains("Total Balance: $22487280.97\n"));
        assert!(prompt.contains("Total Earnings: $1245678.12\n"));
        assert!(prompt.contains(
            "Assets: USD Stablecoin: 5240500.25 USDC (Value: $5240500.25), \
             Ethereum: 6159.57 ETH (Value: $17246788.72)"
        ));
        assert!(prompt.contains("Provide 3 concise, bulleted recommendations"));
        assert!(prompt.contains("APY, diversification, and market sentiment"));
    }
}
