//! Command Driver
//!
//! Executes [`Command`]s against the external collaborators and turns each
//! outcome into the completion [`Event`] for [`Dashboard::dispatch`].
//! Both operations are bounded by a timeout.
//!
//! [`Dashboard::dispatch`]: crate::dashboard::Dashboard::dispatch

use std::sync::Arc;
use std::time::Duration;

use advisor_core::{GenerationOptions, LlmProvider, Message, DEFAULT_MODEL};

use crate::dashboard::{Command, Event};
use crate::error::{DashboardError, Result};
use crate::model::PortfolioSnapshot;
use crate::source::PortfolioSource;

/// Driver configuration
#[derive(Clone, Debug)]
pub struct DriverConfig {
    /// Model identifier sent with every advice request
    pub model: String,

    /// Upper bound on one advice request
    pub advice_timeout: Duration,

    /// Upper bound on one snapshot fetch
    pub refresh_timeout: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.into(),
            advice_timeout: Duration::from_secs(30),
            refresh_timeout: Duration::from_secs(10),
        }
    }
}

impl DriverConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let secs = |key: &str, fallback: Duration| {
            std::env::var(key)
                .ok()
                .and_then(|v| v.parse().ok())
                .map_or(fallback, Duration::from_secs)
        };

        Self {
            model: std::env::var("ADVISOR_MODEL").unwrap_or(defaults.model),
            advice_timeout: secs("ADVICE_TIMEOUT_SECS", defaults.advice_timeout),
            refresh_timeout: secs("REFRESH_TIMEOUT_SECS", defaults.refresh_timeout),
        }
    }
}

/// Runs dashboard commands
pub struct DashboardDriver {
    provider: Arc<dyn LlmProvider>,
    source: Arc<dyn PortfolioSource>,
    config: DriverConfig,
}

impl DashboardDriver {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        source: Arc<dyn PortfolioSource>,
        config: DriverConfig,
    ) -> Self {
        Self {
            provider,
            source,
            config,
        }
    }

    pub const fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn provider(&self) -> &dyn LlmProvider {
        self.provider.as_ref()
    }

    pub fn source(&self) -> &dyn PortfolioSource {
        self.source.as_ref()
    }

    /// Run `command` to completion and return its completion event
    pub async fn execute(&self, command: Command) -> Event {
        match command {
            Command::Refresh { ticket } => Event::RefreshFinished {
                ticket,
                outcome: self.load_snapshot().await,
            },
            Command::GenerateAdvice { ticket, prompt } => Event::AdviceFinished {
                ticket,
                result: self.generate_advice(&prompt).await,
            },
        }
    }

    /// Fetch a snapshot, bounded by `refresh_timeout`
    pub async fn load_snapshot(&self) -> Result<PortfolioSnapshot> {
        tracing::debug!(source = self.source.name(), "loading portfolio snapshot");

        tokio::time::timeout(self.config.refresh_timeout, self.source.snapshot())
            .await
            .map_err(|_| DashboardError::Timeout {
                operation: "portfolio refresh",
                timeout: self.config.refresh_timeout,
            })?
    }

    /// One advice request, bounded by `advice_timeout`. No retry.
    async fn generate_advice(&self, prompt: &str) -> Result<String> {
        let messages = [Message::user(prompt)];
        let options = GenerationOptions::for_model(self.config.model.clone());

        tracing::debug!(
            provider = self.provider.name(),
            model = %options.model,
            prompt_tokens = self.provider.estimate_tokens(prompt),
            "requesting advice"
        );

        let completion = tokio::time::timeout(
            self.config.advice_timeout,
            self.provider.complete(&messages, &options),
        )
        .await
        .map_err(|_| DashboardError::Timeout {
            operation: "advice request",
            timeout: self.config.advice_timeout,
        })??;

        if completion.is_blank() {
            return Err(DashboardError::EmptyAdvice);
        }
        Ok(completion.content)
    }
}
