//! HTTP-based [`ExplanationGenerator`].

use std::time::Duration;

use async_trait::async_trait;
use kindred_core::{ExplanationError, ExplanationGenerator, ExplanationInput, Place, ProviderError};
use log::debug;
use reqwest::Client;
use url::Url;

use super::prompt::{
    ChatMessage, ChatRequest, ChatResponse, ResponseFormat, SYSTEM_PROMPT, render_prompt,
};
use crate::ProviderBuildError;
use crate::http::{build_client, convert_reqwest_error, parse_base_url, read_json};

/// Model requested when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Configuration for [`HttpExplanationGenerator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpExplanationGeneratorConfig {
    /// Base URL of the API (e.g. `"https://api.openai.com"`).
    pub base_url: String,
    /// Model name.
    pub model: String,
    /// Bearer token.
    pub api_key: Option<String>,
    /// Request timeout.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for HttpExplanationGeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_owned(),
            model: DEFAULT_MODEL.to_owned(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: crate::places::DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl HttpExplanationGeneratorConfig {
    /// Create a configuration for the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the model name.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the bearer token.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Generates explanations with one `POST v1/chat/completions` per batch.
#[derive(Debug)]
pub struct HttpExplanationGenerator {
    client: Client,
    config: HttpExplanationGeneratorConfig,
    endpoint: Url,
}

impl HttpExplanationGenerator {
    /// Create a generator with explicit configuration.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the HTTP client fails to build.
    pub fn with_config(config: HttpExplanationGeneratorConfig) -> Result<Self, ProviderBuildError> {
        let base = parse_base_url(&config.base_url)?;
        let endpoint = base
            .join("v1/chat/completions")
            .map_err(|source| ProviderBuildError::InvalidBaseUrl {
                url: config.base_url.clone(),
                source,
            })?;
        let client = build_client(&config.user_agent, config.timeout)?;
        Ok(Self {
            client,
            config,
            endpoint,
        })
    }
}

fn unavailable(error: ProviderError) -> ExplanationError {
    match error {
        ProviderError::ParseError { message } => ExplanationError::Malformed { message },
        other => ExplanationError::Unavailable {
            message: other.to_string(),
        },
    }
}

#[async_trait]
impl ExplanationGenerator for HttpExplanationGenerator {
    async fn explain(
        &self,
        source: &Place,
        candidates: &[ExplanationInput],
    ) -> Result<Vec<String>, ExplanationError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        let prompt = render_prompt(source, candidates);
        let body = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: 0.7,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };
        let url = self.endpoint.as_str();
        let mut request = self.client.post(self.endpoint.clone()).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .await
            .map_err(|error| unavailable(convert_reqwest_error(&error, url, self.config.timeout)))?;
        let reply: ChatResponse = read_json(response, url).await.map_err(unavailable)?;
        let sentences = reply.into_sentences(candidates.len())?;
        debug!(
            "{} of {} explanations generated for {}",
            sentences.len(),
            candidates.len(),
            source.name
        );
        Ok(sentences)
    }
}
