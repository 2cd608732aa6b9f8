//! Gemini LLM Provider
//!
//! Implementation of `LlmProvider` against the Google Generative Language
//! REST API (`models/{model}:generateContent`).

use std::time::Duration;

use advisor_core::{
    error::{AdvisorError, Result},
    message::{Message, Role},
    provider::{Completion, FinishReason, GenerationOptions, LlmProvider, ModelInfo, TokenUsage},
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// Gemini provider configuration
#[derive(Clone, Debug)]
pub struct GeminiConfig {
    /// API key sent in the `x-goog-api-key` header
    pub api_key: String,

    /// API base URL (no trailing path)
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://generativelanguage.googleapis.com".into(),
            timeout_secs: 60,
        }
    }
}

impl GeminiConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .unwrap_or_default();
        let base_url = std::env::var("GEMINI_BASE_URL")
            .unwrap_or(defaults.base_url);
        let timeout_secs = std::env::var("GEMINI_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(defaults.timeout_secs);

        Self {
            api_key,
            base_url,
            timeout_secs,
        }
    }

    fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// Gemini LLM provider
pub struct GeminiProvider {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiProvider {
    /// Create from configuration
    pub fn from_config(config: GeminiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AdvisorError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(GeminiConfig::from_env())
    }

    fn base(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn generate_url(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base(), model)
    }

    fn models_url(&self) -> String {
        format!("{}/v1beta/models", self.base())
    }

    fn require_key(&self) -> Result<&str> {
        if self.config.has_api_key() {
            Ok(&self.config.api_key)
        } else {
            Err(AdvisorError::Config("GEMINI_API_KEY is not set".into()))
        }
    }

    /// Convert messages and options to a `generateContent` body
    fn build_request(messages: &[Message], options: &GenerationOptions) -> GenerateContentRequest {
        let mut system_parts: Vec<Part> = options
            .system_prompt
            .iter()
            .map(|s| Part::text(s.clone()))
            .collect();
        let mut contents = Vec::new();

        for message in messages {
            match message.role {
                Role::System => system_parts.push(Part::text(message.content.clone())),
                Role::User => contents.push(Content::new("user", message.content.clone())),
                Role::Assistant => contents.push(Content::new("model", message.content.clone())),
            }
        }

        GenerateContentRequest {
            contents,
            system_instruction: (!system_parts.is_empty()).then(|| Content {
                role: None,
                parts: system_parts,
            }),
            generation_config: GenerationConfig {
                temperature: options.temperature,
                top_p: options.top_p,
                max_output_tokens: options.max_tokens,
                stop_sequences: options.stop_sequences.clone(),
            },
        }
    }

    /// Convert a `generateContent` response to a completion
    fn convert_response(response: GenerateContentResponse, model: &str) -> Result<Completion> {
        let Some(candidate) = response.candidates.into_iter().next() else {
            let reason = response
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .map_or_else(|| "empty response".to_string(), |r| format!("prompt blocked: {r}"));
            return Err(AdvisorError::Provider(reason));
        };

        let content: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        let finish_reason = candidate.finish_reason.as_deref().map(Self::map_finish_reason);

        Ok(Completion {
            content,
            model: model.to_string(),
            usage: response.usage_metadata.map(|u| TokenUsage {
                prompt_tokens: u.prompt_token_count,
                completion_tokens: u.candidates_token_count,
                total_tokens: u.total_token_count,
            }),
            truncated: finish_reason == Some(FinishReason::Length),
            finish_reason,
        })
    }

    fn map_finish_reason(reason: &str) -> FinishReason {
        match reason {
            "STOP" => FinishReason::Stop,
            "MAX_TOKENS" => FinishReason::Length,
            "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII" => {
                FinishReason::ContentFilter
            }
            _ => FinishReason::Error,
        }
    }

    /// Map a non-success HTTP status to an error
    fn map_status(status: StatusCode, body: &str) -> AdvisorError {
        let detail = format!("{status}: {body}");
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AdvisorError::Auth(detail),
            StatusCode::TOO_MANY_REQUESTS => AdvisorError::RateLimited(detail),
            s if s.is_server_error() => AdvisorError::ProviderUnavailable(detail),
            _ => AdvisorError::Provider(detail),
        }
    }

    fn map_transport(err: &reqwest::Error) -> AdvisorError {
        if err.is_timeout() || err.is_connect() {
            AdvisorError::ProviderUnavailable(err.to_string())
        } else {
            AdvisorError::Provider(err.to_string())
        }
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "Gemini"
    }

    async fn health_check(&self) -> Result<bool> {
        if !self.config.has_api_key() {
            tracing::warn!("Gemini health check skipped: no API key configured");
            return Ok(false);
        }
        match self.list_models().await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!("Gemini health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let api_key = self.require_key()?;
        let body = Self::build_request(messages, options);

        tracing::debug!(model = %options.model, "Sending generateContent request");

        let response = self.client
            .post(self.generate_url(&options.model))
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::map_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::map_status(status, &body));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AdvisorError::Parse(e.to_string()))?;

        Self::convert_response(parsed, &options.model)
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let api_key = self.require_key()?;

        let response = self.client
            .get(self.models_url())
            .header("x-goog-api-key", api_key)
            .send()
            .await
            .map_err(|e| Self::map_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::map_status(status, &body));
        }

        let parsed: ModelList = response
            .json()
            .await
            .map_err(|e| AdvisorError::Parse(e.to_string()))?;

        Ok(parsed.into_models())
    }
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn new(role: &str, text: String) -> Self {
        Self {
            role: Some(role.into()),
            parts: vec![Part::text(text)],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

impl Part {
    const fn text(text: String) -> Self {
        Self { text: Some(text) }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop_sequences: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    models: Vec<RemoteModel>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteModel {
    name: String,
    display_name: Option<String>,
}

impl ModelList {
    fn into_models(self) -> Vec<ModelInfo> {
        self.models
            .into_iter()
            .filter(|m| m.name.contains("gemini"))
            .map(|m| {
                // API returns "models/gemini-pro", we want "gemini-pro"
                let id = m.name.strip_prefix("models/").unwrap_or(&m.name).to_string();
                ModelInfo {
                    name: m.display_name.unwrap_or_else(|| id.clone()),
                    id,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(base_url: &str) -> GeminiProvider {
        GeminiProvider::from_config(GeminiConfig {
            base_url: base_url.into(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = GeminiConfig::default();
        assert_eq!(config.base_url, "https://generativelanguage.googleapis.com");
        assert_eq!(config.timeout_secs, 60);
        assert!(!config.has_api_key());
    }

    #[test]
    fn test_generate_url() {
        let p = provider("https://example.test/");
        assert_eq!(
            p.generate_url("gemini-3-flash-preview"),
            "https://example.test/v1beta/models/gemini-3-flash-preview:generateContent"
        );
        assert_eq!(p.models_url(), "https://example.test/v1beta/models");
    }

    #[test]
    fn test_request_mapping() {
        let messages = vec![
            Message::system("Be brief."),
            Message::user("Analyze this portfolio"),
            Message::assistant("Sure"),
        ];
        let options = GenerationOptions {
            stop_sequences: vec!["END".into()],
            ..GenerationOptions::for_model("gemini-3-flash-preview")
        };

        let body = serde_json::to_value(GeminiProvider::build_request(&messages, &options)).unwrap();

        assert_eq!(body["contents"].as_array().unwrap().len(), 2);
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Analyze this portfolio");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Be brief.");
        assert!(body["systemInstruction"].get("role").is_none());
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1024);
        assert_eq!(body["generationConfig"]["stopSequences"][0], "END");
    }

    #[test]
    fn test_request_without_system_instruction() {
        let body = serde_json::to_value(GeminiProvider::build_request(
            &[Message::user("hi")],
            &GenerationOptions::default(),
        ))
        .unwrap();
        assert!(body.get("systemInstruction").is_none());
        assert!(body["generationConfig"].get("stopSequences").is_none());
    }

    #[test]
    fn test_response_conversion() {
        let raw = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "• Stake USDC"}, {"text": "\n• Hold ETH"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 80, "candidatesTokenCount": 20, "totalTokenCount": 100}
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        let completion = GeminiProvider::convert_response(parsed, "gemini-3-flash-preview").unwrap();

        assert_eq!(completion.content, "• Stake USDC\n• Hold ETH");
        assert_eq!(completion.finish_reason, Some(FinishReason::Stop));
        assert!(!completion.truncated);
        assert_eq!(completion.usage.unwrap().total_tokens, 100);
    }

    #[test]
    fn test_truncated_response() {
        let raw = r#"{"candidates": [{"content": {"parts": [{"text": "• partial"}]}, "finishReason": "MAX_TOKENS"}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        let completion = GeminiProvider::convert_response(parsed, "m").unwrap();
        assert!(completion.truncated);
        assert!(completion.usage.is_none());
    }

    #[test]
    fn test_blocked_prompt_is_error() {
        let raw = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        let err = GeminiProvider::convert_response(parsed, "m").unwrap_err();
        assert!(err.to_string().contains("prompt blocked: SAFETY"));
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            GeminiProvider::map_status(StatusCode::FORBIDDEN, ""),
            AdvisorError::Auth(_)
        ));
        assert!(matches!(
            GeminiProvider::map_status(StatusCode::TOO_MANY_REQUESTS, ""),
            AdvisorError::RateLimited(_)
        ));
        assert!(matches!(
            GeminiProvider::map_status(StatusCode::SERVICE_UNAVAILABLE, ""),
            AdvisorError::ProviderUnavailable(_)
        ));
        assert!(matches!(
            GeminiProvider::map_status(StatusCode::BAD_REQUEST, "bad model"),
            AdvisorError::Provider(_)
        ));
    }

    #[test]
    fn test_model_list_filtering() {
        let raw = r#"{"models": [
            {"name": "models/gemini-3-flash-preview", "displayName": "Gemini 3 Flash"},
            {"name": "models/embedding-001"},
            {"name": "models/gemini-pro"}
        ]}"#;
        let models = serde_json::from_str::<ModelList>(raw).unwrap().into_models();
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].id, "gemini-3-flash-preview");
        assert_eq!(models[0].name, "Gemini 3 Flash");
        assert_eq!(models[1].name, "gemini-pro");
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network() {
        let p = provider("http://127.0.0.1:9");
        let err = p
            .complete(&[Message::user("hi")], &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AdvisorError::Config(_)));
        assert!(!p.health_check().await.unwrap());
    }
}
