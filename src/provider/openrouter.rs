//! OpenRouter (OpenAI-compatible) chat-completion client.

use std::time::Duration;

use async_trait::async_trait;

use super::{ChatMessage, ChatProvider};
use crate::config::RelayConfig;
use crate::error::InvokeError;
use crate::util::truncate_excerpt;

/// How much of an error body is kept in `InvokeError::Provider`.
const EXCERPT_CHARS: usize = 300;

pub struct OpenRouterClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    http_referer: Option<String>,
    app_title: Option<String>,
}

impl OpenRouterClient {
    pub fn new(config: &RelayConfig) -> Result<Self, InvokeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/chat/completions",
                config.provider_url.trim_end_matches('/')
            ),
            api_key: config.api_key.clone(),
            http_referer: config.http_referer.clone(),
            app_title: config.app_title.clone(),
        })
    }
}

#[async_trait]
impl ChatProvider for OpenRouterClient {
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, InvokeError> {
        let api_key = self.api_key.as_deref().ok_or(InvokeError::MissingCredential)?;

        let body = serde_json::json!({
            "model": model,
            "messages": messages,
            "temperature": temperature,
            "max_tokens": max_tokens,
        });

        let mut request = self.client.post(&self.endpoint).bearer_auth(api_key).json(&body);
        // Attribution headers OpenRouter uses for app rankings
        if let Some(ref referer) = self.http_referer {
            request = request.header("HTTP-Referer", referer);
        }
        if let Some(ref title) = self.app_title {
            request = request.header("X-Title", title);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let text = response.text().await.unwrap_or_default();
            return Err(InvokeError::Provider {
                status: status.as_u16(),
                excerpt: truncate_excerpt(&text, EXCERPT_CHARS),
            });
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                InvokeError::from(e)
            } else {
                InvokeError::MalformedResponse(e.to_string())
            }
        })?;

        match body["choices"][0]["message"]["content"].as_str() {
            Some(content) => Ok(content.to_string()),
            None => Err(InvokeError::MalformedResponse(truncate_excerpt(
                &body.to_string(),
                EXCERPT_CHARS,
            ))),
        }
    }
}
