//! Request orchestration: mode policy, cache, fallback chain and extraction.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::cache::{fingerprint, short_key, ResponseCache};
use crate::config::RelayConfig;
use crate::error::{RelayError, Result};
use crate::mode::Mode;
use crate::provider::{complete_with_fallback, ChatMessage, ChatProvider};
use crate::scripts::{extract_scripts, strip_code_fences, ScriptDescriptor};
use crate::templates;
use crate::util::elapsed_ms;

/// Body of a successful `/generate` call; also what the cache stores.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub mode: Mode,
    pub model: String,
    pub cached: bool,
    pub scripts: Vec<ScriptDescriptor>,
    pub elapsed_ms: u64,
}

/// Body of a successful `/generate-simple` call.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimpleResponse {
    pub success: bool,
    pub code: String,
    pub model: String,
}

/// Owns the provider handle and the response cache for the whole process.
pub struct RelayService {
    config: Arc<RelayConfig>,
    provider: Arc<dyn ChatProvider>,
    cache: Mutex<ResponseCache<GenerateResponse>>,
}

/// Reject missing or blank prompts; returns the trimmed prompt.
pub fn validate_prompt(prompt: Option<&str>) -> Result<&str> {
    match prompt.map(str::trim) {
        Some(p) if !p.is_empty() => Ok(p),
        _ => Err(RelayError::Validation("No prompt provided".into())),
    }
}

impl RelayService {
    pub fn new(config: Arc<RelayConfig>, provider: Arc<dyn ChatProvider>) -> Self {
        let cache = ResponseCache::new(config.cache_max_size);
        Self {
            config,
            provider,
            cache: Mutex::new(cache),
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Current entry count and capacity of the response cache.
    pub async fn cache_usage(&self) -> (usize, usize) {
        let cache = self.cache.lock().await;
        (cache.len(), cache.capacity())
    }

    /// Generate structured scripts for `prompt`, serving repeats from the cache.
    pub async fn generate(
        &self,
        prompt: Option<&str>,
        mode: Option<&str>,
        max_tokens: Option<&Value>,
    ) -> Result<GenerateResponse> {
        let start = Instant::now();
        let prompt = validate_prompt(prompt)?;
        let params = self.config.resolve_mode(mode, max_tokens);
        let key = fingerprint(params.mode, prompt);

        // Copy the hit out so the lock isn't held past this statement.
        let hit = self.cache.lock().await.get(&key).cloned();
        if let Some(mut hit) = hit {
            tracing::debug!("cache hit {}", short_key(&key));
            hit.cached = true;
            hit.elapsed_ms = elapsed_ms(start);
            return Ok(hit);
        }

        let candidates = self.config.candidate_models(&params.model);
        let messages = [
            ChatMessage::system(params.system_instruction),
            ChatMessage::user(prompt),
        ];
        let completion = complete_with_fallback(
            self.provider.as_ref(),
            &candidates,
            &messages,
            params.temperature,
            params.max_tokens,
        )
        .await?;

        let scripts = extract_scripts(&completion.text);
        let response = GenerateResponse {
            success: true,
            mode: params.mode,
            model: completion.model,
            cached: false,
            scripts,
            elapsed_ms: elapsed_ms(start),
        };

        self.cache.lock().await.put(key, response.clone());
        tracing::info!(
            "generated {} script(s) in {} mode with {} ({} ms)",
            response.scripts.len(),
            response.mode.as_str(),
            response.model,
            response.elapsed_ms
        );
        Ok(response)
    }

    /// Generate plain Luau code for `prompt` with Markdown fences removed.
    pub async fn generate_simple(&self, prompt: Option<&str>) -> Result<SimpleResponse> {
        let prompt = validate_prompt(prompt)?;
        let params = self.config.resolve_mode(None, None);
        let candidates = self.config.candidate_models(&params.model);
        let messages = [
            ChatMessage::system(templates::simple_instruction()),
            ChatMessage::user(prompt),
        ];
        let completion = complete_with_fallback(
            self.provider.as_ref(),
            &candidates,
            &messages,
            params.temperature,
            params.max_tokens,
        )
        .await?;

        Ok(SimpleResponse {
            success: true,
            code: strip_code_fences(&completion.text),
            model: completion.model,
        })
    }
}
