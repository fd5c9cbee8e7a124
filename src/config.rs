use serde::Deserialize;
use std::path::PathBuf;

use anyhow::Context;

use crate::util::expand_tilde;

pub const DEFAULT_PROVIDER_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "nex-agi/deepseek-v3.1-nex-n1:free";

/// Lower bound for any token budget, also the floor for `max_tokens_cap`.
pub const MIN_TOKENS: u32 = 200;

/// Process-wide relay settings, read once at startup.
#[derive(Clone, Debug)]
pub struct RelayConfig {
    pub api_key: Option<String>,
    pub provider_url: String,
    pub default_model: String,
    pub fast_model: Option<String>,
    pub full_model: Option<String>,
    pub fallback_models: Vec<String>,
    /// Raw configured value; the mode policy collapses anything unknown to `fast`.
    pub default_mode: String,
    pub fast_temperature: f32,
    pub full_temperature: f32,
    pub fast_max_tokens: u32,
    pub full_max_tokens: u32,
    pub max_tokens_cap: u32,
    pub cache_max_size: usize,
    pub http_referer: Option<String>,
    pub app_title: Option<String>,
    pub timeout_secs: u64,
    pub host: String,
    pub port: u16,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider_url: DEFAULT_PROVIDER_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            fast_model: None,
            full_model: None,
            fallback_models: vec![],
            default_mode: "fast".to_string(),
            fast_temperature: 0.4,
            full_temperature: 0.7,
            fast_max_tokens: 2000,
            full_max_tokens: 4000,
            max_tokens_cap: 8000,
            cache_max_size: 100,
            http_referer: Some("https://roblox-ai-plugin.com".to_string()),
            app_title: Some("Roblox AI Code Generator".to_string()),
            timeout_secs: 120,
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Optional on-disk overrides (`~/.roxlit/relay.json`). Every key may be omitted.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigFile {
    pub api_key: Option<String>,
    pub provider_url: Option<String>,
    pub default_model: Option<String>,
    pub fast_model: Option<String>,
    pub full_model: Option<String>,
    pub fallback_models: Option<Vec<String>>,
    pub default_mode: Option<String>,
    pub fast_temperature: Option<f32>,
    pub full_temperature: Option<f32>,
    pub fast_max_tokens: Option<u32>,
    pub full_max_tokens: Option<u32>,
    pub max_tokens_cap: Option<u32>,
    pub cache_max_size: Option<usize>,
    pub http_referer: Option<String>,
    pub app_title: Option<String>,
    pub timeout_secs: Option<u64>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("RELAY_CONFIG") {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(expand_tilde(path.trim())));
        }
    }
    dirs::home_dir().map(|h| h.join(".roxlit").join("relay.json"))
}

impl RelayConfig {
    /// Defaults, then the config file if present, then the process environment.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path() {
            if path.exists() {
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?;
                let file: ConfigFile = serde_json::from_str(&content)
                    .with_context(|| format!("parsing {}", path.display()))?;
                config.apply_file(file);
                tracing::info!("loaded relay config from {}", path.display());
            }
        }

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config.sanitized())
    }

    pub fn apply_file(&mut self, file: ConfigFile) {
        if let Some(v) = file.api_key {
            self.api_key = non_empty(v);
        }
        if let Some(v) = file.provider_url {
            self.provider_url = v;
        }
        if let Some(v) = file.default_model {
            self.default_model = v;
        }
        if file.fast_model.is_some() {
            self.fast_model = file.fast_model.and_then(non_empty);
        }
        if file.full_model.is_some() {
            self.full_model = file.full_model.and_then(non_empty);
        }
        if let Some(v) = file.fallback_models {
            self.fallback_models = v.into_iter().filter_map(non_empty).collect();
        }
        if let Some(v) = file.default_mode {
            self.default_mode = v;
        }
        self.fast_temperature = file.fast_temperature.unwrap_or(self.fast_temperature);
        self.full_temperature = file.full_temperature.unwrap_or(self.full_temperature);
        self.fast_max_tokens = file.fast_max_tokens.unwrap_or(self.fast_max_tokens);
        self.full_max_tokens = file.full_max_tokens.unwrap_or(self.full_max_tokens);
        self.max_tokens_cap = file.max_tokens_cap.unwrap_or(self.max_tokens_cap);
        self.cache_max_size = file.cache_max_size.unwrap_or(self.cache_max_size);
        if file.http_referer.is_some() {
            self.http_referer = file.http_referer.and_then(non_empty);
        }
        if file.app_title.is_some() {
            self.app_title = file.app_title.and_then(non_empty);
        }
        self.timeout_secs = file.timeout_secs.unwrap_or(self.timeout_secs);
        if let Some(v) = file.host {
            self.host = v;
        }
        self.port = file.port.unwrap_or(self.port);
    }

    /// Apply environment-style overrides through `lookup` (a closure so tests
    /// don't have to touch the real process environment).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("OPENROUTER_API_KEY") {
            self.api_key = non_empty(v);
        }
        if let Some(v) = lookup("RELAY_PROVIDER_URL").and_then(non_empty) {
            self.provider_url = v;
        }
        if let Some(v) = lookup("RELAY_DEFAULT_MODEL").and_then(non_empty) {
            self.default_model = v;
        }
        if let Some(v) = lookup("RELAY_FAST_MODEL") {
            self.fast_model = non_empty(v);
        }
        if let Some(v) = lookup("RELAY_FULL_MODEL") {
            self.full_model = non_empty(v);
        }
        if let Some(v) = lookup("RELAY_FALLBACK_MODELS") {
            self.fallback_models = parse_model_list(&v);
        }
        if let Some(v) = lookup("RELAY_DEFAULT_MODE") {
            self.default_mode = v;
        }
        parse_into(&lookup, "RELAY_FAST_TEMPERATURE", &mut self.fast_temperature);
        parse_into(&lookup, "RELAY_FULL_TEMPERATURE", &mut self.full_temperature);
        parse_into(&lookup, "RELAY_FAST_MAX_TOKENS", &mut self.fast_max_tokens);
        parse_into(&lookup, "RELAY_FULL_MAX_TOKENS", &mut self.full_max_tokens);
        parse_into(&lookup, "RELAY_MAX_TOKENS_CAP", &mut self.max_tokens_cap);
        parse_into(&lookup, "RELAY_CACHE_MAX_SIZE", &mut self.cache_max_size);
        if let Some(v) = lookup("RELAY_HTTP_REFERER") {
            self.http_referer = non_empty(v);
        }
        if let Some(v) = lookup("RELAY_APP_TITLE") {
            self.app_title = non_empty(v);
        }
        parse_into(&lookup, "RELAY_TIMEOUT_SECS", &mut self.timeout_secs);
        if let Some(v) = lookup("HOST").and_then(non_empty) {
            self.host = v;
        }
        parse_into(&lookup, "PORT", &mut self.port);
    }

    /// Pull numeric settings back into their valid ranges.
    pub fn sanitized(mut self) -> Self {
        self.fast_temperature = clamp_temperature(self.fast_temperature);
        self.full_temperature = clamp_temperature(self.full_temperature);
        self.max_tokens_cap = self.max_tokens_cap.max(MIN_TOKENS);
        self.fast_max_tokens = self.fast_max_tokens.clamp(MIN_TOKENS, self.max_tokens_cap);
        self.full_max_tokens = self.full_max_tokens.clamp(MIN_TOKENS, self.max_tokens_cap);
        self.timeout_secs = self.timeout_secs.max(1);
        self
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Split a comma-separated model list, dropping blanks.
pub fn parse_model_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(String::from)
        .collect()
}

fn parse_into<T, F>(lookup: &F, key: &str, target: &mut T)
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(key) {
        match raw.trim().parse::<T>() {
            Ok(v) => *target = v,
            Err(_) => tracing::warn!("ignoring {key}={raw:?}: not a valid value"),
        }
    }
}

fn clamp_temperature(t: f32) -> f32 {
    if t.is_nan() {
        0.7
    } else {
        t.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> RelayConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut config = RelayConfig::default();
        config.apply_env(|key| env.get(key).cloned());
        config.sanitized()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = from_pairs(&[]);
        assert!(config.api_key.is_none());
        assert_eq!(config.default_model, DEFAULT_MODEL);
        assert_eq!(config.default_mode, "fast");
        assert_eq!(config.bind_addr(), "0.0.0.0:8000");
    }

    #[test]
    fn test_env_overrides() {
        let config = from_pairs(&[
            ("OPENROUTER_API_KEY", "sk-test"),
            ("RELAY_FALLBACK_MODELS", " a/one , ,b/two,"),
            ("RELAY_FULL_MODEL", "big/model"),
            ("RELAY_CACHE_MAX_SIZE", "5"),
            ("PORT", "9001"),
        ]);
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.fallback_models, vec!["a/one", "b/two"]);
        assert_eq!(config.full_model.as_deref(), Some("big/model"));
        assert_eq!(config.cache_max_size, 5);
        assert_eq!(config.port, 9001);
    }

    #[test]
    fn test_bad_numbers_keep_defaults() {
        let config = from_pairs(&[("RELAY_MAX_TOKENS_CAP", "lots"), ("PORT", "-1")]);
        assert_eq!(config.max_tokens_cap, 8000);
        assert_eq!(config.port, 8000);
    }

    #[test]
    fn test_sanitize_ranges() {
        let config = from_pairs(&[
            ("RELAY_FAST_TEMPERATURE", "3.5"),
            ("RELAY_MAX_TOKENS_CAP", "50"),
            ("RELAY_FULL_MAX_TOKENS", "9999"),
            ("OPENROUTER_API_KEY", "   "),
        ]);
        assert_eq!(config.fast_temperature, 1.0);
        assert_eq!(config.max_tokens_cap, MIN_TOKENS);
        assert_eq!(config.full_max_tokens, MIN_TOKENS);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_config_file_then_env() {
        let file: ConfigFile = serde_json::from_str(
            r#"{"defaultModel": "file/model", "fallbackModels": ["x", ""], "appTitle": ""}"#,
        )
        .unwrap();
        let mut config = RelayConfig::default();
        config.apply_file(file);
        assert_eq!(config.default_model, "file/model");
        assert_eq!(config.fallback_models, vec!["x"]);
        assert!(config.app_title.is_none());

        config.apply_env(|key| (key == "RELAY_DEFAULT_MODEL").then(|| "env/model".to_string()));
        assert_eq!(config.default_model, "env/model");
    }
}
