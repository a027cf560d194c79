//! Error types for image generation.

/// Message shown when a failure carries no message of its own.
pub const FALLBACK_MESSAGE: &str = "Failed to generate image. Please try again.";

/// Message for a response that contained no image data.
pub const EMPTY_RESULT_MESSAGE: &str = "No image data returned from model.";

/// Maximum length of a provider message surfaced to the user.
const MAX_MESSAGE_LEN: usize = 500;

/// Errors that can occur during image generation.
#[derive(Debug, thiserror::Error)]
pub enum LuminaError {
    /// API key rejected upstream.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Quota or rate limit exceeded.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The provider answered but returned no usable image data.
    #[error("{}", EMPTY_RESULT_MESSAGE)]
    EmptyResult,

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (e.g., exporting a file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    Config(String),
}

/// How a failed generation attempt is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The provider returned no image-bearing part.
    EmptyResult,
    /// Transport, authentication, server or payload failure.
    ProviderError,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyResult => write!(f, "empty result"),
            Self::ProviderError => write!(f, "provider error"),
        }
    }
}

impl LuminaError {
    /// Classifies this error for the generation lifecycle.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::EmptyResult => FailureKind::EmptyResult,
            _ => FailureKind::ProviderError,
        }
    }

    /// Returns the short message shown to the user.
    ///
    /// Provider-supplied messages are passed through verbatim; errors without
    /// a message fall back to [`FALLBACK_MESSAGE`].
    pub fn user_message(&self) -> String {
        let message = match self {
            Self::Auth(msg) | Self::RateLimited(msg) | Self::Api { message: msg, .. } => {
                msg.clone()
            }
            Self::EmptyResult => EMPTY_RESULT_MESSAGE.to_string(),
            other => other.to_string(),
        };
        if message.trim().is_empty() {
            FALLBACK_MESSAGE.to_string()
        } else {
            message
        }
    }
}

/// Extracts the provider's own message from an error body.
///
/// Google APIs answer with `{"error": {"message": ...}}`; anything else is
/// returned as sanitized raw text.
pub(crate) fn provider_message(body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|v| v.pointer("/error/message"))
        .and_then(|v| v.as_str())
        .unwrap_or(body);
    sanitize_error_message(message)
}

/// Collapses whitespace and truncates overly long messages.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= MAX_MESSAGE_LEN {
        return collapsed;
    }
    let truncated: String = collapsed.chars().take(MAX_MESSAGE_LEN).collect();
    format!("{truncated}...")
}

/// Result type alias for generation operations.
pub type Result<T> = std::result::Result<T, LuminaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kind() {
        assert_eq!(LuminaError::EmptyResult.failure_kind(), FailureKind::EmptyResult);
        assert_eq!(
            LuminaError::Auth("bad key".into()).failure_kind(),
            FailureKind::ProviderError
        );
        assert_eq!(
            LuminaError::Decode("bad base64".into()).failure_kind(),
            FailureKind::ProviderError
        );
        assert_eq!(
            LuminaError::RateLimited("quota".into()).failure_kind(),
            FailureKind::ProviderError
        );
    }

    #[test]
    fn test_user_message_passes_provider_text_verbatim() {
        let err = LuminaError::Api {
            status: 400,
            message: "API key not valid. Please pass a valid API key.".into(),
        };
        assert_eq!(
            err.user_message(),
            "API key not valid. Please pass a valid API key."
        );
    }

    #[test]
    fn test_user_message_fallback() {
        let err = LuminaError::Api {
            status: 500,
            message: "  ".into(),
        };
        assert_eq!(err.user_message(), FALLBACK_MESSAGE);
        assert_eq!(LuminaError::EmptyResult.user_message(), EMPTY_RESULT_MESSAGE);
    }

    #[test]
    fn test_provider_message_extracts_google_error() {
        let body = r#"{"error": {"code": 400, "message": "Invalid aspect ratio", "status": "INVALID_ARGUMENT"}}"#;
        assert_eq!(provider_message(body), "Invalid aspect ratio");
        assert_eq!(provider_message("Bad\n  gateway"), "Bad gateway");
        assert_eq!(provider_message(""), "");
    }

    #[test]
    fn test_sanitize_truncates() {
        let long = "x".repeat(MAX_MESSAGE_LEN + 10);
        let out = sanitize_error_message(&long);
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), MAX_MESSAGE_LEN + 3);
    }

    #[test]
    fn test_error_display() {
        let err = LuminaError::Api {
            status: 404,
            message: "Not found".into(),
        };
        assert_eq!(err.to_string(), "API error: 404 - Not found");
        assert_eq!(LuminaError::EmptyResult.to_string(), EMPTY_RESULT_MESSAGE);
    }
}
