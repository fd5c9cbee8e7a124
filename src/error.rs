use serde::Serialize;

/// Failure of a single provider call for one model.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InvokeError {
    #[error("provider returned HTTP {status}: {excerpt}")]
    Provider { status: u16, excerpt: String },

    /// `message` already says whether the call timed out or never connected.
    #[error("{message}")]
    Transport { timed_out: bool, message: String },

    #[error("provider response had no completion text: {0}")]
    MalformedResponse(String),

    #[error("provider API key is not configured (set OPENROUTER_API_KEY)")]
    MissingCredential,
}

impl From<reqwest::Error> for InvokeError {
    fn from(e: reqwest::Error) -> Self {
        let timed_out = e.is_timeout();
        let message = if timed_out {
            format!("provider request timed out: {e}")
        } else {
            format!("could not reach provider: {e}")
        };
        InvokeError::Transport { timed_out, message }
    }
}

/// All errors a relay request can end with.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("{0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("All models failed (tried {}): {last}", .attempted.join(", "))]
    AllModelsFailed {
        attempted: Vec<String>,
        last: InvokeError,
    },
}

impl RelayError {
    /// Whether the caller sent something unusable, as opposed to a server-side failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, RelayError::Validation(_))
    }
}

// Rendered into JSON error bodies as a plain message.
impl Serialize for RelayError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_models_failed_reports_last_error() {
        let err = RelayError::AllModelsFailed {
            attempted: vec!["a".into(), "b".into()],
            last: InvokeError::Provider {
                status: 503,
                excerpt: "overloaded".into(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("tried a, b"));
        assert!(msg.contains("HTTP 503: overloaded"));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_serializes_as_message() {
        let err = RelayError::Validation("No prompt provided".into());
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            serde_json::json!("No prompt provided")
        );
        assert!(err.is_client_error());
    }

    #[test]
    fn test_provider_error_message() {
        let err = InvokeError::Provider {
            status: 429,
            excerpt: "rate limited".into(),
        };
        assert_eq!(err.to_string(), "provider returned HTTP 429: rate limited");
    }
}
