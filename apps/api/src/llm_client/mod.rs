/// LLM Client — the single point of entry for all Gemini API calls.
///
/// ARCHITECTURAL RULE: No other module may call the Gemini API directly.
/// All LLM interactions MUST go through this module.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Model tiers offered to callers. The wire name is the serialized form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ModelTier {
    #[serde(rename = "gemini-2.0-flash")]
    Flash,
    /// Default tier. Also the designated tier for HTML question extraction,
    /// which does not need a heavyweight model.
    #[default]
    #[serde(rename = "gemini-2.0-flash-lite")]
    FlashLite,
    #[serde(rename = "gemini-2.0-flash-thinking-exp")]
    FlashThinking,
}

impl ModelTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelTier::Flash => "gemini-2.0-flash",
            ModelTier::FlashLite => "gemini-2.0-flash-lite",
            ModelTier::FlashThinking => "gemini-2.0-flash-thinking-exp",
        }
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Generated text plus token accounting from the model's usage metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmResponse {
    pub text: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types (generateContent REST shape)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

/// Flattens a generateContent response body into an `LlmResponse`.
/// Only the first candidate is read; its parts are concatenated. A body
/// with no text is `EmptyContent`.
fn flatten_response(body: GenerateContentResponse) -> Result<LlmResponse, LlmError> {
    let text: String = body
        .candidates
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.text)
        .collect();

    if text.trim().is_empty() {
        return Err(LlmError::EmptyContent);
    }

    let usage = body.usage_metadata.unwrap_or_default();
    Ok(LlmResponse {
        text,
        input_tokens: usage.prompt_token_count,
        output_tokens: usage.candidates_token_count,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Collaborator trait + Gemini implementation
// ────────────────────────────────────────────────────────────────────────────

/// The language-model seam. Implement this to swap the backing model
/// (or substitute a scripted fake in tests) without touching callers.
///
/// Carried in `AppState` as `Arc<dyn LanguageModel>`.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, tier: ModelTier, prompt: &str) -> Result<LlmResponse, LlmError>;
}

/// Gemini client over the `generateContent` REST endpoint.
///
/// The API key is optional at construction so the service can boot without
/// one; the first call that needs it fails with `MissingApiKey`.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    /// Makes a single call to the Gemini API. No internal retries; callers
    /// own their own timeout and failure policy.
    async fn generate(&self, tier: ModelTier, prompt: &str) -> Result<LlmResponse, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingApiKey)?;

        let request_body = GenerateContentRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };

        let url = format!("{}/{}:generateContent", GEMINI_API_BASE, tier.as_str());
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body: GenerateContentResponse = response.json().await?;
        let llm_response = flatten_response(body)?;

        debug!(
            "LLM call succeeded: model={}, input_tokens={}, output_tokens={}",
            tier.as_str(),
            llm_response.input_tokens,
            llm_response.output_tokens
        );

        Ok(llm_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_tier_wire_names() {
        assert_eq!(ModelTier::Flash.as_str(), "gemini-2.0-flash");
        assert_eq!(ModelTier::FlashLite.as_str(), "gemini-2.0-flash-lite");
        assert_eq!(
            ModelTier::FlashThinking.as_str(),
            "gemini-2.0-flash-thinking-exp"
        );
    }

    #[test]
    fn test_model_tier_default_is_lightweight() {
        assert_eq!(ModelTier::default(), ModelTier::FlashLite);
    }

    #[test]
    fn test_model_tier_deserializes_from_wire_name() {
        let tier: ModelTier = serde_json::from_str("\"gemini-2.0-flash\"").unwrap();
        assert_eq!(tier, ModelTier::Flash);
    }

    #[test]
    fn test_flatten_response_concatenates_parts_and_reads_usage() {
        let body: GenerateContentResponse = serde_json::from_str(
            r#"{
                "candidates": [
                    {"content": {"parts": [{"text": "志望動機は"}, {"text": "以下の通りです。"}]}}
                ],
                "usageMetadata": {"promptTokenCount": 120, "candidatesTokenCount": 45}
            }"#,
        )
        .unwrap();

        let response = flatten_response(body).unwrap();
        assert_eq!(response.text, "志望動機は以下の通りです。");
        assert_eq!(response.input_tokens, 120);
        assert_eq!(response.output_tokens, 45);
    }

    #[test]
    fn test_flatten_response_reads_only_the_first_candidate() {
        let body: GenerateContentResponse = serde_json::from_str(
            r#"{
                "candidates": [
                    {"content": {"parts": [{"text": "第一候補の回答"}]}},
                    {"content": {"parts": [{"text": "第二候補の回答"}]}}
                ]
            }"#,
        )
        .unwrap();

        let response = flatten_response(body).unwrap();
        assert_eq!(response.text, "第一候補の回答");
    }

    #[test]
    fn test_flatten_response_without_candidates_is_empty_content() {
        let body: GenerateContentResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(matches!(flatten_response(body), Err(LlmError::EmptyContent)));
    }

    #[test]
    fn test_flatten_response_tolerates_missing_usage_metadata() {
        let body: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [{"text": "回答"}]}}]}"#,
        )
        .unwrap();

        let response = flatten_response(body).unwrap();
        assert_eq!(response.text, "回答");
        assert_eq!(response.input_tokens, 0);
        assert_eq!(response.output_tokens, 0);
    }
}
