use serde::Deserialize;
use thiserror::Error;

/// Errors raised by the Gemini backend.
#[derive(Debug, Error)]
pub enum GeminiError {
    /// HTTP transport errors.
    #[error("{}", transport_message(.0))]
    Http(#[from] reqwest::Error),
    /// JSON serialization/deserialization problems.
    #[error("invalid response format: {0}")]
    Json(#[from] serde_json::Error),
    /// The API answered with a non-success status.
    #[error("{message} (HTTP {status})")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error body.
        message: String,
    },
    /// Rate limit exceeded (includes retry delay if available).
    #[error("{message}{}", .retry_after_secs.map(|s| format!(" (retry after {s}s)")).unwrap_or_default())]
    RateLimit {
        /// Message extracted from the error body.
        message: String,
        /// Suggested delay before retrying.
        retry_after_secs: Option<u64>,
    },
    /// The response held no usable output.
    #[error("empty response: {0}")]
    EmptyResponse(String),
    /// No API key was configured.
    #[error("missing API key: set GOOGLE_API_KEY or GEMINI_API_KEY")]
    MissingApiKey,
}

/// Gemini API error response structure.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorResponse {
    pub error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorDetail {
    pub message: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub details: Vec<serde_json::Value>,
}

impl ApiErrorResponse {
    /// Extract a user-friendly message from the error response.
    pub fn friendly_message(&self) -> Option<String> {
        let error = self.error.as_ref()?;
        error.message.clone().or_else(|| error.status.clone())
    }

    /// Extract retry delay in seconds from a `RetryInfo` detail (`"20s"`).
    pub fn retry_delay_secs(&self) -> Option<u64> {
        self.error
            .as_ref()?
            .details
            .iter()
            .filter_map(|detail| detail.get("retryDelay")?.as_str())
            .find_map(|delay| delay.trim_end_matches('s').parse().ok())
    }
}

fn transport_message(err: &reqwest::Error) -> String {
    if err.is_connect() {
        "network connection failed - check your internet connection".to_string()
    } else if err.is_timeout() {
        "request timed out - please try again".to_string()
    } else {
        err.to_string()
    }
}

fn status_message(status: u16) -> String {
    match status {
        400 => "invalid request".to_string(),
        401 => "authentication failed - check your API key".to_string(),
        403 => "access denied - check your API key permissions".to_string(),
        404 => "model not found".to_string(),
        429 => "rate limit exceeded - please wait before retrying".to_string(),
        500 => "server error - please try again".to_string(),
        502..=504 => "service temporarily unavailable - please try again".to_string(),
        _ => format!("HTTP error {status}"),
    }
}

impl GeminiError {
    /// Build an error from a failed response's status and body, detecting rate limits.
    pub(crate) fn from_status(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<ApiErrorResponse>(body).ok();
        let message = parsed
            .as_ref()
            .and_then(ApiErrorResponse::friendly_message)
            .unwrap_or_else(|| status_message(status));
        if status == 429 {
            return Self::RateLimit {
                message,
                retry_after_secs: parsed.as_ref().and_then(ApiErrorResponse::retry_delay_secs),
            };
        }
        Self::Api { status, message }
    }

    /// Check if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(err) => err.is_connect() || err.is_timeout(),
            Self::Api { status, .. } => *status >= 500 || *status == 408,
            Self::RateLimit { .. } => true,
            _ => false,
        }
    }

    /// Get suggested retry delay in seconds.
    #[must_use]
    pub const fn retry_delay_secs(&self) -> Option<u64> {
        match self {
            Self::RateLimit {
                retry_after_secs, ..
            } => *retry_after_secs,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_body_is_parsed() {
        let body = r#"{
            "error": {
                "code": 429,
                "message": "Resource has been exhausted",
                "status": "RESOURCE_EXHAUSTED",
                "details": [
                    {"@type": "type.googleapis.com/google.rpc.RetryInfo", "retryDelay": "20s"}
                ]
            }
        }"#;
        let err = GeminiError::from_status(429, body);
        assert!(matches!(
            &err,
            GeminiError::RateLimit {
                retry_after_secs: Some(20),
                ..
            }
        ));
        assert!(err.is_retryable());
        assert_eq!(err.retry_delay_secs(), Some(20));
        assert_eq!(err.to_string(), "Resource has been exhausted (retry after 20s)");
    }

    #[test]
    fn unparseable_body_falls_back_to_status() {
        let err = GeminiError::from_status(401, "<html>nope</html>");
        assert_eq!(
            err.to_string(),
            "authentication failed - check your API key (HTTP 401)"
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn server_errors_are_retryable() {
        let err = GeminiError::from_status(503, r#"{"error":{"message":"overloaded"}}"#);
        assert!(matches!(&err, GeminiError::Api { status: 503, message } if message == "overloaded"));
        assert!(err.is_retryable());
    }
}
