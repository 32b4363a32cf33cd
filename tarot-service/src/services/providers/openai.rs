//! OpenAI provider implementation.
//!
//! Implements text generation against the Responses API, with JSON-object
//! output mode for structured readings.

use super::{
    ChatMessage, FinishReason, GenerationParams, ProviderError, ProviderResponse, TextProvider,
};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// OpenAI provider configuration.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: Secret<String>,
    pub model: String,
    /// API base, overridable so tests can target a local server.
    pub api_base_url: String,
    /// Bound on a single outbound call.
    pub timeout: Duration,
}

/// OpenAI text provider.
pub struct OpenAiTextProvider {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiTextProvider {
    pub fn new(config: OpenAiConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn is_configured(&self) -> bool {
        !self.config.api_key.expose_secret().is_empty()
    }

    fn api_url(&self) -> String {
        format!("{}/responses", self.config.api_base_url)
    }
}

#[async_trait]
impl TextProvider for OpenAiTextProvider {
    async fn generate(
        &self,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        if !self.is_configured() {
            return Err(ProviderError::NotConfigured(
                "OpenAI API key not configured".to_string(),
            ));
        }

        let request = ResponsesRequest {
            model: self.config.model.clone(),
            input: messages
                .iter()
                .map(|m| InputMessage {
                    role: m.role.as_str(),
                    content: m.content.clone(),
                })
                .collect(),
            temperature: params.temperature,
            max_output_tokens: params.max_output_tokens,
            text: params.json_output.then(|| TextOptions {
                format: TextFormat {
                    format_type: "json_object".to_string(),
                },
            }),
        };

        tracing::debug!(
            model = %self.config.model,
            message_count = messages.len(),
            json_output = params.json_output,
            "Sending request to OpenAI API"
        );

        let response = self
            .client
            .post(self.api_url())
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::NetworkError(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited);
            }

            if status.as_u16() == 400 {
                return Err(ProviderError::InvalidRequest(error_text));
            }

            return Err(ProviderError::ApiError(format!(
                "OpenAI API error {}: {}",
                status, error_text
            )));
        }

        let envelope: ResponsesEnvelope = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout
            } else {
                ProviderError::ApiError(format!("Failed to parse response: {}", e))
            }
        })?;

        let usage = envelope.usage.clone().unwrap_or_default();
        let finish_reason = envelope.finish_reason();

        Ok(ProviderResponse {
            text: envelope.extract_text(),
            input_tokens: usage.input_tokens.unwrap_or(0),
            output_tokens: usage.output_tokens.unwrap_or(0),
            finish_reason,
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.is_configured() {
            Ok(())
        } else {
            Err(ProviderError::NotConfigured(
                "OpenAI API key not configured".to_string(),
            ))
        }
    }
}

// ============================================================================
// OpenAI API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ResponsesRequest {
    model: String,
    input: Vec<InputMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<TextOptions>,
}

#[derive(Debug, Serialize)]
struct InputMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct TextOptions {
    format: TextFormat,
}

#[derive(Debug, Serialize)]
struct TextFormat {
    #[serde(rename = "type")]
    format_type: String,
}

/// Response envelope.
///
/// The text payload shows up either as a top-level `output_text` field or
/// nested under `output[].content[].text`; which one depends on the API
/// revision, so both are modeled and probed in order.
#[derive(Debug, Deserialize)]
struct ResponsesEnvelope {
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    incomplete_details: Option<IncompleteDetails>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OutputContent {
    Text { text: String },
    Other(serde_json::Value),
}

#[derive(Debug, Deserialize)]
struct IncompleteDetails {
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct Usage {
    input_tokens: Option<i64>,
    output_tokens: Option<i64>,
}

impl ResponsesEnvelope {
    /// Extract the text payload, probing each known location in order:
    /// the direct `output_text` field first, then the nested content path.
    fn extract_text(&self) -> Option<String> {
        if let Some(text) = &self.output_text {
            if !text.is_empty() {
                return Some(text.clone());
            }
        }

        self.output
            .iter()
            .flat_map(|item| item.content.iter())
            .find_map(|part| match part {
                OutputContent::Text { text } if !text.is_empty() => Some(text.clone()),
                _ => None,
            })
    }

    fn finish_reason(&self) -> FinishReason {
        match self.status.as_deref() {
            Some("failed") => FinishReason::Error,
            Some("incomplete") => match self
                .incomplete_details
                .as_ref()
                .and_then(|d| d.reason.as_deref())
            {
                Some("max_output_tokens") => FinishReason::Length,
                Some("content_filter") => FinishReason::ContentFilter,
                _ => FinishReason::Error,
            },
            _ => FinishReason::Complete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_prefers_direct_output_text() {
        let envelope: ResponsesEnvelope = serde_json::from_str(
            r#"{
                "output_text": "direct",
                "output": [{"content": [{"type": "output_text", "text": "nested"}]}]
            }"#,
        )
        .unwrap();

        assert_eq!(envelope.extract_text().as_deref(), Some("direct"));
    }

    #[test]
    fn extract_falls_back_to_nested_content() {
        let envelope: ResponsesEnvelope = serde_json::from_str(
            r#"{
                "output": [
                    {"content": [{"type": "reasoning", "summary": []}]},
                    {"content": [{"type": "output_text", "text": "nested"}]}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(envelope.extract_text().as_deref(), Some("nested"));
    }

    #[test]
    fn extract_yields_none_without_text() {
        let envelope: ResponsesEnvelope =
            serde_json::from_str(r#"{"status": "completed", "output": []}"#).unwrap();

        assert!(envelope.extract_text().is_none());
    }

    #[test]
    fn empty_direct_text_does_not_shadow_nested_content() {
        let envelope: ResponsesEnvelope = serde_json::from_str(
            r#"{
                "output_text": "",
                "output": [{"content": [{"type": "output_text", "text": "nested"}]}]
            }"#,
        )
        .unwrap();

        assert_eq!(envelope.extract_text().as_deref(), Some("nested"));
    }

    #[test]
    fn finish_reason_maps_incomplete_details() {
        let envelope: ResponsesEnvelope = serde_json::from_str(
            r#"{"status": "incomplete", "incomplete_details": {"reason": "max_output_tokens"}}"#,
        )
        .unwrap();
        assert_eq!(envelope.finish_reason(), FinishReason::Length);

        let envelope: ResponsesEnvelope =
            serde_json::from_str(r#"{"status": "completed"}"#).unwrap();
        assert_eq!(envelope.finish_reason(), FinishReason::Complete);
    }
}
