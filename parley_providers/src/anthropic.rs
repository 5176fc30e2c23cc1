use async_trait::async_trait;
use parley_core::CompletionProvider;
use parley_core::util::char_len;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

/// Marks the start of a human turn in a text-completions prompt.
pub const HUMAN_PROMPT: &str = "\n\nHuman: ";
/// Marks the point where the model continues as the assistant.
pub const AI_PROMPT: &str = "\n\nAssistant:";

const API_VERSION: &str = "2023-06-01";

/// Client for Anthropic's text-completions endpoint.
///
/// One call to [`CompletionProvider::complete`] is exactly one HTTP request;
/// retrying is left to the caller.
#[derive(Clone)]
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens_to_sample: u32,
}

impl AnthropicProvider {
    pub fn new(api_key: String) -> Self {
        info!("Creating AnthropicProvider");
        Self {
            client: Client::new(),
            api_key,
            base_url: "https://api.anthropic.com".to_string(),
            model: "claude-2.1".to_string(),
            max_tokens_to_sample: 200_000,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    #[must_use]
    pub const fn with_max_tokens_to_sample(mut self, max_tokens: u32) -> Self {
        self.max_tokens_to_sample = max_tokens;
        self
    }

    /// Bounds every request by `timeout`; an elapsed timeout is an ordinary failure.
    pub fn with_timeout(mut self, timeout: Duration) -> anyhow::Result<Self> {
        self.client = Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    fn extract_completion(response: &serde_json::Value) -> anyhow::Result<String> {
        response["completion"]
            .as_str()
            .map(ToString::to_string)
            .ok_or_else(|| anyhow::anyhow!("Invalid response format: missing completion"))
    }
}

#[async_trait]
impl CompletionProvider for AnthropicProvider {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        let request = json!({
            "model": self.model,
            "prompt": prompt,
            "max_tokens_to_sample": self.max_tokens_to_sample,
        });

        debug!(
            "Sending request to Anthropic API: model={}, prompt_chars={}",
            self.model,
            char_len(prompt)
        );

        let response = self
            .client
            .post(format!("{}/v1/complete", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<serde_json::Value>()
            .await?;

        let completion = Self::extract_completion(&response)?;
        debug!("Received {} chars from Anthropic API", completion.len());
        Ok(completion)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
