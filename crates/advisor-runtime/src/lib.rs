//! # advisor-runtime
//!
//! Concrete LLM providers for the portfolio advice flow.
//!
//! ## Providers
//!
//! - **Gemini** (always available): Google Generative Language API over HTTPS
//! - **Ollama** (feature `ollama`, on by default): local inference
//!
//! ## Usage
//!
//! ```rust,ignore
//! use advisor_runtime::GeminiProvider;
//!
//! let provider = Arc::new(GeminiProvider::from_env()?);
//! let driver = DashboardDriver::new(provider, source, DriverConfig::from_env());
//! ```

pub mod gemini;

#[cfg(feature = "ollama")]
pub mod ollama;

pub use gemini::{GeminiConfig, GeminiProvider};

#[cfg(feature = "ollama")]
pub use ollama::{OllamaConfig, OllamaProvider};

// Re-export core types for convenience
pub use advisor_core::{AdvisorError, GenerationOptions, LlmProvider, Message, Result, Role};
