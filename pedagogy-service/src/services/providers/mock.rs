//! Mock provider for tests and local runs without credentials.

use super::{
    FinishReason, GenerationParams, ModelInfo, ProviderError, ProviderResponse, TextProvider,
};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

/// What the mock answers with.
#[derive(Debug, Clone)]
enum MockReply {
    /// `Mock response for: <prompt>`.
    Echo,
    /// A fixed reply regardless of prompt.
    Fixed(String),
    /// The model produced no text.
    Empty,
    /// Fail every call with an API error carrying this message.
    Fail(String),
}

/// Mock text provider.
pub struct MockTextProvider {
    enabled: bool,
    reply: MockReply,
    delay: Duration,
    prompts: Mutex<Vec<String>>,
}

impl MockTextProvider {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            reply: MockReply::Echo,
            delay: Duration::from_millis(10),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(text: impl Into<String>) -> Self {
        Self {
            reply: MockReply::Fixed(text.into()),
            ..Self::new(true)
        }
    }

    pub fn empty() -> Self {
        Self {
            reply: MockReply::Empty,
            ..Self::new(true)
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: MockReply::Fail(message.into()),
            ..Self::new(true)
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn generate(
        &self,
        prompt: &str,
        _params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        if !self.enabled {
            return Err(ProviderError::NotConfigured(
                "API key not configured".to_string(),
            ));
        }

        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        tokio::time::sleep(self.delay).await;

        let text = match &self.reply {
            MockReply::Echo => Some(format!("Mock response for: {}", prompt)),
            MockReply::Fixed(text) => Some(text.clone()),
            MockReply::Empty => None,
            MockReply::Fail(message) => return Err(ProviderError::ApiError(message.clone())),
        };

        Ok(ProviderResponse {
            output_tokens: text.as_ref().map(|t| t.len() as i32 / 4).unwrap_or(0),
            text,
            input_tokens: prompt.len() as i32 / 4,
            finish_reason: FinishReason::Complete,
        })
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, ProviderError> {
        if !self.enabled {
            return Err(ProviderError::NotConfigured(
                "API key not configured".to_string(),
            ));
        }

        Ok(vec![ModelInfo {
            name: "models/mock-text".to_string(),
            display_name: Some("Mock Text".to_string()),
            description: Some("Deterministic responses for testing".to_string()),
        }])
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

    fn model(&self) -> &str {
        "mock-text"
    }
}
