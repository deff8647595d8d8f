use statewait::WaitError;
use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;

/// Error returned by the job-backed operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("error waiting for {operation}: {source}")]
    Wait {
        operation: String,
        #[source]
        source: WaitError<ApiError>,
    },
}

impl Error {
    pub fn wait(operation: impl Into<String>, source: WaitError<ApiError>) -> Self {
        Error::Wait {
            operation: operation.into(),
            source,
        }
    }

    /// Whether the underlying API call answered 404.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Api(e) => e.is_not_found(),
            Error::Wait {
                source: WaitError::Refresh(e),
                ..
            } => e.is_not_found(),
            _ => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Wait { source, .. } if source.is_timeout())
    }

    /// The wait error, when the failure happened while polling.
    pub fn wait_error(&self) -> Option<&WaitError<ApiError>> {
        match self {
            Error::Wait { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn wait_error_message_names_operation_and_job() {
        let err = Error::wait(
            "BMS server (s-1) power on",
            WaitError::Failed {
                job_id: "job-1".into(),
                status: "FAIL".into(),
            },
        );
        assert_eq!(
            err.to_string(),
            "error waiting for BMS server (s-1) power on: job (job-1) failed with status FAIL"
        );
        assert!(!err.is_timeout());
    }

    #[test]
    fn not_found_looks_through_wait() {
        let err = Error::wait(
            "image registration",
            WaitError::Refresh(ApiError::NotFound("job".into())),
        );
        assert!(err.is_not_found());
        assert!(Error::Api(ApiError::NotFound("x".into())).is_not_found());
        assert!(!Error::Api(ApiError::RateLimited).is_not_found());
    }

    #[test]
    fn timeout_is_detected() {
        let err = Error::wait(
            "CDN refresh",
            WaitError::Timeout {
                job_id: "t-1".into(),
                timeout: Duration::from_secs(5),
                last_status: Some("PENDING".into()),
            },
        );
        assert!(err.is_timeout());
        assert!(err.wait_error().is_some());
    }
}
