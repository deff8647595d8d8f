//! Error types for waits

use std::time::Duration;

/// Why a wait ended without reaching its target.
///
/// `E` is the error type of the status fetch; it is returned unchanged in
/// [`WaitError::Refresh`].
#[derive(Debug, thiserror::Error)]
pub enum WaitError<E> {
    /// The status fetch itself failed. The wait stops on the first failure.
    #[error(transparent)]
    Refresh(E),

    #[error("job ({job_id}) failed with status {status}")]
    Failed { job_id: String, status: String },

    #[error("job ({job_id}): status is not found in API response")]
    StatusNotFound { job_id: String },

    #[error("job ({job_id}) reported unexpected status {status}, expected one of {expected:?}")]
    UnexpectedStatus {
        job_id: String,
        status: String,
        expected: Vec<String>,
    },

    #[error("timeout after {timeout:?} waiting for job ({job_id}), last status: {}", .last_status.as_deref().unwrap_or("none"))]
    Timeout {
        job_id: String,
        timeout: Duration,
        last_status: Option<String>,
    },

    #[error("job ({job_id}) was not found after {checks} consecutive checks")]
    NotFound { job_id: String, checks: u32 },

    #[error("wait for job ({job_id}) was cancelled")]
    Cancelled { job_id: String },

    #[error("job ID must not be empty")]
    InvalidJobId,

    #[error("invalid wait configuration: {0}")]
    InvalidConfig(String),
}

impl<E> WaitError<E> {
    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitError::Timeout { .. })
    }

    /// Whether the server reported a terminal failure status.
    pub fn is_failure(&self) -> bool {
        matches!(self, WaitError::Failed { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, WaitError::Cancelled { .. })
    }

    pub fn job_id(&self) -> Option<&str> {
        match self {
            WaitError::Failed { job_id, .. }
            | WaitError::StatusNotFound { job_id }
            | WaitError::UnexpectedStatus { job_id, .. }
            | WaitError::Timeout { job_id, .. }
            | WaitError::NotFound { job_id, .. }
            | WaitError::Cancelled { job_id } => Some(job_id),
            WaitError::Refresh(_) | WaitError::InvalidJobId | WaitError::InvalidConfig(_) => None,
        }
    }

    /// The fetch error when the wait was aborted by one.
    pub fn into_refresh_error(self) -> Option<E> {
        match self {
            WaitError::Refresh(e) => Some(e),
            _ => None,
        }
    }

    /// Converts the fetch error, keeping every other variant as is.
    pub fn map_refresh<F, O>(self, f: F) -> WaitError<O>
    where
        F: FnOnce(E) -> O,
    {
        match self {
            WaitError::Refresh(e) => WaitError::Refresh(f(e)),
            WaitError::Failed { job_id, status } => WaitError::Failed { job_id, status },
            WaitError::StatusNotFound { job_id } => WaitError::StatusNotFound { job_id },
            WaitError::UnexpectedStatus {
                job_id,
                status,
                expected,
            } => WaitError::UnexpectedStatus {
                job_id,
                status,
                expected,
            },
            WaitError::Timeout {
                job_id,
                timeout,
                last_status,
            } => WaitError::Timeout {
                job_id,
                timeout,
                last_status,
            },
            WaitError::NotFound { job_id, checks } => WaitError::NotFound { job_id, checks },
            WaitError::Cancelled { job_id } => WaitError::Cancelled { job_id },
            WaitError::InvalidJobId => WaitError::InvalidJobId,
            WaitError::InvalidConfig(msg) => WaitError::InvalidConfig(msg),
        }
    }
}
