use std::error::Error as StdError;
use std::fmt;

/// Categorized failures surfaced by the conversation engine.
///
/// Every provider, network and persistence failure is converted into one of
/// these variants before it reaches the caller of
/// [`ConversationController`](crate::core::controller::ConversationController).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// The requested model id is not in the catalog.
    UnknownModel(String),

    /// No API key is available for the provider backing the selected model.
    MissingCredential {
        /// Provider id (e.g. `openai`).
        provider: String,
        /// Environment variable that would supply the key.
        env_var: String,
    },

    /// The request never produced an HTTP response (timeout, DNS, refused).
    Transport(String),

    /// The provider answered with a non-2xx status.
    Provider { status: u16, body: String },

    /// The provider answered 2xx but the body did not have the expected shape.
    Protocol(String),

    /// The persisted log could not be decoded.
    CorruptState(String),

    /// Writing or clearing the persisted log failed.
    Persistence(String),

    /// A turn is already awaiting its reply.
    TurnInFlight,
}

impl ChatError {
    /// Short machine-friendly name of the error category.
    pub fn kind(&self) -> &'static str {
        match self {
            ChatError::UnknownModel(_) => "unknown_model",
            ChatError::MissingCredential { .. } => "missing_credential",
            ChatError::Transport(_) => "transport",
            ChatError::Provider { .. } => "provider",
            ChatError::Protocol(_) => "protocol",
            ChatError::CorruptState(_) => "corrupt_state",
            ChatError::Persistence(_) => "persistence",
            ChatError::TurnInFlight => "turn_in_flight",
        }
    }

    pub(crate) fn transport(err: &reqwest::Error) -> Self {
        let detail = if err.is_timeout() {
            format!("request timed out: {err}")
        } else if err.is_connect() {
            format!("connection failed: {err}")
        } else {
            err.to_string()
        };
        ChatError::Transport(detail)
    }
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatError::UnknownModel(id) => write!(f, "Unknown model '{id}'"),
            ChatError::MissingCredential { provider, env_var } => write!(
                f,
                "No API key configured for provider '{provider}'. Set {env_var} or run 'palaver auth {provider}'."
            ),
            ChatError::Transport(detail) => write!(f, "Network error: {detail}"),
            ChatError::Provider { status, body } => {
                write!(f, "Provider returned HTTP {status}: {body}")
            }
            ChatError::Protocol(detail) => write!(f, "Unexpected provider response: {detail}"),
            ChatError::CorruptState(detail) => {
                write!(f, "Stored conversation could not be read: {detail}")
            }
            ChatError::Persistence(detail) => {
                write!(f, "Failed to update stored conversation: {detail}")
            }
            ChatError::TurnInFlight => write!(f, "A reply is still pending"),
        }
    }
}

impl StdError for ChatError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_errors_carry_raw_body() {
        let err = ChatError::Provider {
            status: 401,
            body: "bad key".to_string(),
        };
        assert_eq!(err.to_string(), "Provider returned HTTP 401: bad key");
        assert_eq!(err.kind(), "provider");
    }

    #[test]
    fn missing_credential_names_env_var() {
        let err = ChatError::MissingCredential {
            provider: "anthropic".to_string(),
            env_var: "ANTHROPIC_API_KEY".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("ANTHROPIC_API_KEY"));
        assert!(text.contains("palaver auth anthropic"));
    }
}
