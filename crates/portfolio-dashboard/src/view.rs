//! Presentation Render Model
//!
//! Pure projection of [`Dashboard`] state into display-ready values. A view
//! layer renders this without knowing gesture math or network state.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::dashboard::Dashboard;
use crate::flow::{AdviceState, INDICATOR_VISIBLE_AFTER, REFRESHING_OFFSET};
use crate::model::{Asset, PortfolioStats};

pub const GENERATE_LABEL: &str = "Generate Insights";
pub const ANALYZING_LABEL: &str = "Analyzing...";
pub const DISMISS_LABEL: &str = "Dismiss";

/// Everything needed to draw one frame
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DashboardView {
    pub indicator: RefreshIndicator,

    /// Downward translation of the content area
    pub content_offset: f64,

    pub balance: BalanceView,

    /// Cards in display order
    pub assets: Vec<AssetCard>,

    pub advice: AdvicePanel,

    /// Failure indicator for the most recent refresh
    pub refresh_error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RefreshIndicator {
    pub height: f64,
    pub opacity: f64,
    pub spinning: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BalanceView {
    /// e.g. "$22,487,280"
    pub whole: String,
    /// e.g. ".97"
    pub cents: String,
    /// e.g. "Available: $1,250,450.00"
    pub available: String,
    pub total_earnings: String,
    pub earnings_24h: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AssetCard {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub color: String,
    /// "$5,240,500.25" or "6,159.57 ETH"
    pub amount_label: String,
    pub value_label: String,
    /// "+5.2% APY"
    pub apy_label: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdvicePanel {
    /// No advice shown; the generate button
    Prompt { label: &'static str, enabled: bool },
    /// Advice text with a dismiss control
    Advice {
        text: String,
        fallback: bool,
        dismiss_label: &'static str,
    },
}

impl DashboardView {
    pub fn render(dashboard: &Dashboard) -> Self {
        let refreshing = dashboard.is_refreshing();
        let pull = dashboard.pull_distance();
        let snapshot = dashboard.snapshot();

        let indicator = RefreshIndicator {
            height: if refreshing { REFRESHING_OFFSET } else { pull },
            opacity: if refreshing || pull > INDICATOR_VISIBLE_AFTER { 1.0 } else { 0.0 },
            spinning: refreshing,
        };

        let advice = match dashboard.advice().state() {
            AdviceState::Idle => AdvicePanel::Prompt { label: GENERATE_LABEL, enabled: true },
            AdviceState::Loading { .. } => AdvicePanel::Prompt { label: ANALYZING_LABEL, enabled: false },
            AdviceState::Loaded(advice) => AdvicePanel::Advice {
                text: advice.text.clone(),
                fallback: advice.is_fallback(),
                dismiss_label: DISMISS_LABEL,
            },
        };

        Self {
            indicator,
            content_offset: if refreshing { REFRESHING_OFFSET } else { pull },
            balance: BalanceView::from_stats(snapshot.stats()),
            assets: snapshot.assets().iter().map(AssetCard::from_asset).collect(),
            advice,
            refresh_error: dashboard.refresh().last_failure().map(str::to_string),
        }
    }
}

impl BalanceView {
    fn from_stats(stats: &PortfolioStats) -> Self {
        let currency = &stats.currency;
        let total = format_amount(stats.total_balance);
        let (whole, cents) = total.split_once('.').unwrap_or((total.as_str(), "00"));

        Self {
            whole: format!("{currency}{whole}"),
            cents: format!(".{cents}"),
            available: format!("Available: {currency}{}", format_amount(stats.uninvested)),
            total_earnings: format!("{currency}{}", format_amount(stats.total_earnings)),
            earnings_24h: format!("{currency}{}", format_amount(stats.earnings_24h)),
        }
    }
}

impl AssetCard {
    fn from_asset(asset: &Asset) -> Self {
        let amount = format_amount(asset.amount);
        let amount_label = if asset.is_dollar_denominated() {
            format!("{}{amount}", asset.secondary_symbol)
        } else {
            format!("{amount} {}", asset.secondary_symbol)
        };

        Self {
            id: asset.id.clone(),
            name: asset.name.clone(),
            icon: asset.icon.clone(),
            color: asset.color.clone(),
            amount_label,
            value_label: format!("{}{}", asset.currency_symbol, format_amount(asset.value_fiat)),
            apy_label: format!("+{:.1}% APY", asset.apy),
        }
    }
}

/// Two decimals with thousands separators, e.g. `1,250,450.00`
pub fn format_amount(value: Decimal) -> String {
    let rounded = value.round_dp(2);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    let text = format!("{:.2}", rounded.abs());
    let (whole, frac) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    format!("{sign}{}.{frac}", group_thousands(whole))
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
