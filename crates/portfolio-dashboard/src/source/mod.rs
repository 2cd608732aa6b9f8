//! Portfolio Data Sources
//!
//! The dashboard only reads snapshots; where they come from is pluggable.

mod mock;

pub use mock::{sample_snapshot, MockPortfolioSource};

use async_trait::async_trait;

use crate::error::Result;
use crate::model::PortfolioSnapshot;

/// Supplies portfolio snapshots (Strategy pattern)
///
/// Implement this for each backend: brokerage API, wallet indexer, etc.
#[async_trait]
pub trait PortfolioSource: Send + Sync {
    /// Fetch the current stats and ordered assets
    async fn snapshot(&self) -> Result<PortfolioSnapshot>;

    /// Source name
    fn name(&self) -> &str;
}
