//! Mock provider implementation for testing.

use super::{
    ChatMessage, FinishReason, GenerationParams, ProviderError, ProviderResponse, TextProvider,
};
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Mock text provider for testing.
///
/// Returns a canned reply (or an injected failure) and records every call
/// so tests can assert on call counts and on the prompts that were sent.
pub struct MockTextProvider {
    enabled: bool,
    reply: Option<String>,
    fail_with: Option<String>,
    calls: AtomicUsize,
    captured: Mutex<Vec<ChatMessage>>,
}

impl MockTextProvider {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            reply: None,
            fail_with: None,
            calls: AtomicUsize::new(0),
            captured: Mutex::new(Vec::new()),
        }
    }

    /// Provider that answers every call with `reply`.
    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
            ..Self::new(true)
        }
    }

    /// Provider that fails every call with an API error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fail_with: Some(message.into()),
            ..Self::new(true)
        }
    }

    /// Number of generate calls observed.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Messages passed to the most recent generate call.
    pub fn last_messages(&self) -> Vec<ChatMessage> {
        self.captured.lock().expect("mock lock poisoned").clone()
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn generate(
        &self,
        messages: &[ChatMessage],
        _params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.captured.lock().expect("mock lock poisoned") = messages.to_vec();

        if !self.enabled {
            return Err(ProviderError::NotConfigured(
                "Mock text provider not enabled".to_string(),
            ));
        }

        if let Some(message) = &self.fail_with {
            return Err(ProviderError::ApiError(message.clone()));
        }

        let text = self.reply.clone().unwrap_or_else(|| {
            let prompt = messages.last().map(|m| m.content.as_str()).unwrap_or("");
            format!("Mock response for: {}", prompt)
        });

        Ok(ProviderResponse {
            text: Some(text),
            input_tokens: messages.iter().map(|m| m.content.len() as i64).sum::<i64>() / 4,
            output_tokens: 10,
            finish_reason: FinishReason::Complete,
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.enabled {
            Ok(())
        } else {
            Err(ProviderError::NotConfigured(
                "Mock text provider not enabled".to_string(),
            ))
        }
    }
}
