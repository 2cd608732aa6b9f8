//! # advisor-core
//!
//! Provider-agnostic LLM abstraction for generating portfolio advice.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  Advice request                                          │
//! │  ┌──────────────┐   ┌───────────────┐   ┌─────────────┐  │
//! │  │   Message    │──▶│  LlmProvider  │──▶│ Completion  │  │
//! │  │  (prompt)    │   │  (Strategy)   │   │   (text)    │  │
//! │  └──────────────┘   └───────────────┘   └─────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` trait enables swapping between Gemini, Ollama,
//! or any other text-completion backend without changing dashboard logic.

pub mod provider;
pub mod message;
pub mod error;

pub use error::{AdvisorError, Result};
pub use message::{Message, Role};
pub use provider::{
    Completion, FinishReason, GenerationOptions, LlmProvider, ModelInfo, ProviderInfo, TokenUsage,
    DEFAULT_MODEL,
};
