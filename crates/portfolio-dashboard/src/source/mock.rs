//! Mock Portfolio Source
//!
//! For demos and tests. Returns fixed figures after a simulated delay.

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal_macros::dec;

use super::PortfolioSource;
use crate::error::Result;
use crate::model::{Asset, PortfolioSnapshot, PortfolioStats};

/// Delay that stands in for a real fetch
const DEFAULT_LATENCY_MS: u64 = 1200;

/// Fixed demo portfolio: a stablecoin and an ETH position
pub fn sample_snapshot() -> PortfolioSnapshot {
    let stats = PortfolioStats {
        total_balance: dec!(22487280.97),
        uninvested: dec!(1250450.00),
        total_earnings: dec!(1245678.12),
        earnings_24h: dec!(45670.32),
        currency: "$".into(),
    };

    let assets = vec![
        Asset::new("1", "USD Stablecoin", "USDC", dec!(5240500.25), dec!(5240500.25))
            .with_apy(dec!(5.2))
            .with_style("bg-blue-500", "https://cryptologos.cc/logos/usd-coin-usdc-logo.png"),
        Asset::new("2", "Ethereum", "ETH", dec!(6159.57), dec!(17246788.72))
            .with_secondary("ETH", dec!(6159.57))
            .with_apy(dec!(4.1))
            .with_style("bg-indigo-600", "https://cryptologos.cc/logos/ethereum-eth-logo.png"),
    ];

    // ids above are distinct
    PortfolioSnapshot::new_unchecked(stats, assets)
}

/// Mock source with static data
pub struct MockPortfolioSource {
    latency: Duration,
}

impl Default for MockPortfolioSource {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_LATENCY_MS))
    }
}

impl MockPortfolioSource {
    pub const fn new(latency: Duration) -> Self {
        Self { latency }
    }

    /// Latency from `MOCK_REFRESH_LATENCY_MS`
    pub fn from_env() -> Self {
        let millis = std::env::var("MOCK_REFRESH_LATENCY_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_LATENCY_MS);
        Self::new(Duration::from_millis(millis))
    }

    pub const fn latency(&self) -> Duration {
        self.latency
    }
}

#[async_trait]
impl PortfolioSource for MockPortfolioSource {
    async fn snapshot(&self) -> Result<PortfolioSnapshot> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(sample_snapshot())
    }

    fn name(&self) -> &str {
        "MockPortfolio"
    }
}
