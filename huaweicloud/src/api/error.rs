use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error (HTTP {status}){}: {message}", .code.as_deref().map(|c| format!(" [{}]", c)).unwrap_or_default())]
    ApiError {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Authentication failed (HTTP {0})")]
    AuthError(u16),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("Too many requests, rate limited")]
    RateLimited,

    #[error("Service unavailable, retry later")]
    ServiceUnavailable,

    #[error("{0} is not found in API response")]
    MissingField(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ApiError {
    /// True for HTTP 404, which delete paths may treat as "already gone".
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::RateLimited | ApiError::ServiceUnavailable | ApiError::Timeout(_)
        )
    }

    /// HuaweiCloud error code such as `BMS.0015`, when the body carried one.
    pub fn code(&self) -> Option<&str> {
        match self {
            ApiError::ApiError { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(ApiError::RateLimited.is_retryable());
        assert!(ApiError::ServiceUnavailable.is_retryable());
        assert!(ApiError::Timeout(30).is_retryable());
        assert!(!ApiError::NotFound("gone".into()).is_retryable());
        assert!(!ApiError::AuthError(401).is_retryable());
    }

    #[test]
    fn missing_field_message() {
        let err = ApiError::MissingField("job_id".into());
        assert_eq!(err.to_string(), "job_id is not found in API response");
    }

    #[test]
    fn api_error_message_includes_code_when_present() {
        let with_code = ApiError::ApiError {
            status: 400,
            code: Some("IMS.0001".into()),
            message: "bad image url".into(),
        };
        let without_code = ApiError::ApiError {
            status: 400,
            code: None,
            message: "bad image url".into(),
        };

        assert_eq!(
            with_code.to_string(),
            "API returned error (HTTP 400) [IMS.0001]: bad image url"
        );
        assert_eq!(
            without_code.to_string(),
            "API returned error (HTTP 400): bad image url"
        );
        assert_eq!(with_code.code(), Some("IMS.0001"));
    }
}
