//! Mode policy: maps the `fast`/`full` selector onto concrete request parameters.

use serde::Serialize;
use serde_json::Value;

use crate::config::{RelayConfig, MIN_TOKENS};
use crate::templates;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Fast,
    Full,
}

impl Mode {
    /// Parse a mode token, ignoring case and surrounding whitespace.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "fast" => Some(Mode::Fast),
            "full" => Some(Mode::Full),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Fast => "fast",
            Mode::Full => "full",
        }
    }
}

/// Everything one generation request needs from the mode policy.
#[derive(Clone, Debug, PartialEq)]
pub struct ModeParameters {
    pub mode: Mode,
    pub system_instruction: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub model: String,
}

impl RelayConfig {
    /// The configured default mode, `fast` when the setting is unrecognized.
    pub fn effective_default_mode(&self) -> Mode {
        Mode::parse(&self.default_mode).unwrap_or(Mode::Fast)
    }

    /// Primary model for `mode`: the mode override if set, else the global default.
    pub fn model_for(&self, mode: Mode) -> &str {
        let specific = match mode {
            Mode::Fast => self.fast_model.as_deref(),
            Mode::Full => self.full_model.as_deref(),
        };
        specific.unwrap_or(&self.default_model)
    }

    /// Resolve request parameters from the requested mode and an optional
    /// `max_tokens` override (only honored when it is a JSON number).
    pub fn resolve_mode(
        &self,
        requested: Option<&str>,
        max_tokens: Option<&Value>,
    ) -> ModeParameters {
        let mode = requested
            .and_then(Mode::parse)
            .unwrap_or_else(|| self.effective_default_mode());

        let (system_instruction, temperature, default_tokens) = match mode {
            Mode::Fast => (
                templates::fast_instruction(),
                self.fast_temperature,
                self.fast_max_tokens,
            ),
            Mode::Full => (
                templates::full_instruction(),
                self.full_temperature,
                self.full_max_tokens,
            ),
        };

        let max_tokens = max_tokens
            .and_then(Value::as_f64)
            .map(|requested| self.clamp_tokens(requested))
            .unwrap_or(default_tokens);

        ModeParameters {
            mode,
            system_instruction,
            temperature,
            max_tokens,
            model: self.model_for(mode).to_string(),
        }
    }

    fn clamp_tokens(&self, requested: f64) -> u32 {
        let cap = self.max_tokens_cap.max(MIN_TOKENS);
        if requested.is_nan() {
            return MIN_TOKENS;
        }
        // Float-to-int casts saturate, so huge or negative values land on the bounds.
        (requested as u32).clamp(MIN_TOKENS, cap)
    }

    /// Primary model first, then fallbacks without duplicates or blanks.
    pub fn candidate_models(&self, primary: &str) -> Vec<String> {
        let mut candidates = vec![primary.to_string()];
        for model in &self.fallback_models {
            let model = model.trim();
            if !model.is_empty() && !candidates.iter().any(|c| c == model) {
                candidates.push(model.to_string());
            }
        }
        candidates
    }
}
