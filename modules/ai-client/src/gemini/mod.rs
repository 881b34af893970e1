mod client;
pub(crate) mod types;

use anyhow::Result as AnyResult;
use async_trait::async_trait;

use crate::error::{AiError, Result};
use crate::traits::TextGenerator;
use crate::util::truncate_to_char_boundary;
use client::GeminiClient;
use types::GenerateRequest;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

// =============================================================================
// Gemini Agent
// =============================================================================

#[derive(Clone)]
pub struct Gemini {
    api_key: String,
    pub(crate) model: String,
    base_url: Option<String>,
}

impl Gemini {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
        }
    }

    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| AiError::Config("GEMINI_API_KEY environment variable not set".into()))?;
        Ok(Self::new(api_key, model))
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub(crate) fn client(&self) -> GeminiClient {
        let client = GeminiClient::new(&self.api_key);
        if let Some(ref url) = self.base_url {
            client.with_base_url(url)
        } else {
            client
        }
    }

    /// Send a single user prompt and return the generated text.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest::prompt(prompt);
        let response = self.client().generate_content(&self.model, &request).await?;

        let text = response.text().ok_or(AiError::EmptyResponse)?;
        tracing::debug!(
            model = %self.model,
            preview = truncate_to_char_boundary(text, 120),
            "Gemini response"
        );
        Ok(text.to_string())
    }
}

impl std::fmt::Debug for Gemini {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gemini")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TextGenerator for Gemini {
    async fn generate(&self, prompt: &str) -> AnyResult<String> {
        Ok(self.complete(prompt).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_new() {
        let ai = Gemini::new("AIza-test", DEFAULT_MODEL);
        assert_eq!(ai.model, "gemini-2.0-flash");
        assert_eq!(ai.api_key, "AIza-test");
    }

    #[test]
    fn test_gemini_with_base_url() {
        let ai = Gemini::new("AIza-test", DEFAULT_MODEL).with_base_url("http://127.0.0.1:9");
        assert_eq!(ai.base_url, Some("http://127.0.0.1:9".to_string()));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let ai = Gemini::new("AIza-secret", DEFAULT_MODEL);
        assert!(!format!("{ai:?}").contains("AIza-secret"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let ai = Gemini::new("AIza-test", DEFAULT_MODEL).with_base_url("http://127.0.0.1:9");
        let err = ai.complete("hello").await.unwrap_err();
        assert!(matches!(err, AiError::Network(_)));
    }
}
