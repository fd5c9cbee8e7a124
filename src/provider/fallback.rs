//! Ordered model fallback over a [`ChatProvider`].

use super::{ChatMessage, ChatProvider};
use crate::error::{InvokeError, RelayError, Result};

/// A successful completion and the model that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub model: String,
}

/// Try each candidate model once, in order, returning the first success.
///
/// When every candidate fails, the error carries the last failure and the list
/// of models attempted. A missing credential stops the chain immediately since
/// no other model could succeed either.
pub async fn complete_with_fallback(
    provider: &dyn ChatProvider,
    candidates: &[String],
    messages: &[ChatMessage],
    temperature: f32,
    max_tokens: u32,
) -> Result<Completion> {
    let mut attempted = Vec::with_capacity(candidates.len());
    let mut last_error = None;

    for model in candidates {
        attempted.push(model.clone());
        match provider.complete(model, messages, temperature, max_tokens).await {
            Ok(text) => {
                if attempted.len() > 1 {
                    tracing::info!(
                        "model {model} succeeded after {} failed attempt(s)",
                        attempted.len() - 1
                    );
                }
                return Ok(Completion {
                    text,
                    model: model.clone(),
                });
            }
            Err(InvokeError::MissingCredential) => {
                return Err(RelayError::Configuration(
                    InvokeError::MissingCredential.to_string(),
                ));
            }
            Err(e) => {
                tracing::warn!("model {model} failed: {e}");
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(last) => Err(RelayError::AllModelsFailed { attempted, last }),
        None => Err(RelayError::Configuration("no models configured".into())),
    }
}
