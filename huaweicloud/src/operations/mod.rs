//! Job-backed operations
//!
//! Each operation submits one mutating request, takes the job identifier
//! from the response and waits for the job to settle before returning.

mod bms;
mod cdn;
mod ims;
mod swr;

pub use bms::{
    AttachVolumeRequest, BmsApi, CreateServerRequest, NicRequest, PowerAction, ReinstallOsRequest,
    RootVolume, ServerDetail,
};
pub use cdn::{CdnApi, RefreshCacheRequest, RefreshType};
pub use ims::ImsApi;
pub use swr::SwrApi;

use crate::api::common::JobSubmitted;
use crate::api::ApiError;
use crate::error::Error;

/// What to do when waiting on a delete does not end in the target state.
///
/// Some delete paths in the provider must not fail the whole destroy when
/// the cloud is slow to converge, so the decision is left to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Surface the wait error.
    #[default]
    Strict,
    /// Log a server-reported failure or a timeout and report success.
    /// Transport errors, cancellation and invalid waits still surface.
    BestEffort,
}

impl DeletePolicy {
    pub(crate) fn apply(self, operation: &str, result: Result<(), Error>) -> Result<(), Error> {
        match (self, result) {
            (DeletePolicy::BestEffort, Err(Error::Wait { source, .. }))
                if source.is_failure() || source.is_timeout() =>
            {
                tracing::warn!("{} did not complete, continuing: {}", operation, source);
                Ok(())
            }
            (_, result) => result,
        }
    }
}

/// Job ID of a submitted request, or the "not found in API response" error.
pub(crate) fn job_id(submitted: &JobSubmitted) -> Result<&str, ApiError> {
    submitted
        .job_id()
        .ok_or_else(|| ApiError::MissingField("job_id".to_string()))
}
