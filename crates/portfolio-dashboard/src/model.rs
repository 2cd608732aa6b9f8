//! Domain Models
//!
//! Read-only portfolio records supplied by a data source.
//! Uses `rust_decimal` for all monetary values - never use f64 for money!

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};

/// Secondary symbol of dollar-pegged holdings
pub const DOLLAR: &str = "$";

/// Account-level figures shown in the balance header
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioStats {
    /// Total balance across all assets and cash
    pub total_balance: Decimal,

    /// Cash not allocated to any asset
    pub uninvested: Decimal,

    /// Lifetime earnings
    pub total_earnings: Decimal,

    /// Earnings over the last 24 hours
    pub earnings_24h: Decimal,

    /// Currency symbol (e.g., "$")
    pub currency: String,
}

/// A held asset, rendered as one card
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Unique identity within a snapshot
    pub id: String,

    /// Display name (e.g., "Ethereum")
    pub name: String,

    /// Trading symbol (e.g., "ETH")
    pub symbol: String,

    /// Quantity held
    pub amount: Decimal,

    /// Value in fiat
    pub value_fiat: Decimal,

    /// Value in the secondary unit
    pub value_secondary: Decimal,

    /// Fiat currency symbol
    pub currency_symbol: String,

    /// Secondary unit symbol ("$" for fiat-pegged assets)
    pub secondary_symbol: String,

    /// Annual percentage yield
    pub apy: Decimal,

    /// Color tag for the card
    pub color: String,

    /// Icon URL
    pub icon: String,
}

impl Asset {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        symbol: impl Into<String>,
        amount: Decimal,
        value_fiat: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            symbol: symbol.into().to_uppercase(),
            amount,
            value_fiat,
            value_secondary: amount,
            currency_symbol: DOLLAR.into(),
            secondary_symbol: DOLLAR.into(),
            apy: Decimal::ZERO,
            color: String::new(),
            icon: String::new(),
        }
    }

    /// Set the secondary unit symbol
    pub fn with_secondary(mut self, symbol: impl Into<String>, value: Decimal) -> Self {
        self.secondary_symbol = symbol.into();
        self.value_secondary = value;
        self
    }

    /// Set the annual percentage yield
    pub const fn with_apy(mut self, apy: Decimal) -> Self {
        self.apy = apy;
        self
    }

    /// Set color tag and icon
    pub fn with_style(mut self, color: impl Into<String>, icon: impl Into<String>) -> Self {
        self.color = color.into();
        self.icon = icon.into();
        self
    }

    /// Whether the held unit is dollar-denominated (secondary symbol `$`),
    /// independent of the display currency
    pub fn is_dollar_denominated(&self) -> bool {
        self.secondary_symbol == DOLLAR
    }
}

/// Stats plus ordered assets, as supplied by a source
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    stats: PortfolioStats,
    assets: Vec<Asset>,
}

impl PortfolioSnapshot {
    /// Create a snapshot, rejecting duplicate asset ids
    pub fn new(stats: PortfolioStats, assets: Vec<Asset>) -> Result<Self> {
        {
            let mut seen = HashSet::with_capacity(assets.len());
            for asset in &assets {
                if !seen.insert(asset.id.as_str()) {
                    return Err(DashboardError::InvalidPortfolio(format!(
                        "duplicate asset id '{}'",
                        asset.id
                    )));
                }
            }
        }
        Ok(Self::new_unchecked(stats, assets))
    }

    pub(crate) const fn new_unchecked(stats: PortfolioStats, assets: Vec<Asset>) -> Self {
        Self { stats, assets }
    }

    pub const fn stats(&self) -> &PortfolioStats {
        &self.stats
    }

    /// Assets in display order
    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn asset(&self, id: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == id)
    }
}
