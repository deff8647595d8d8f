//! Typed job-status endpoints
//!
//! Each HuaweiCloud service reports asynchronous work through its own job
//! resource and status spelling. [`JobStatus`] maps one of those responses
//! onto the `PENDING` / `SUCCESS` / `FAIL` vocabulary of
//! [`StatusSet::job`], so a single [`wait_for_job`] drives all of them.

mod cdn;
mod common;
mod swr;

pub use cdn::CdnTask;
pub use common::{CommonJob, JobEntities, SubJob};
pub use swr::SwrJob;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use statewait::{Context, Refresh, Snapshot, StatusSet, WaitConfig, Waiter};
use std::marker::PhantomData;

use crate::api::{ApiError, ServiceClient};
use crate::error::{Error, Result};

/// A job-status response that can be polled.
pub trait JobStatus: DeserializeOwned + Send + Sync + 'static {
    /// Human readable name used in errors, e.g. `SWR job`.
    const KIND: &'static str;

    /// Path of the status endpoint relative to the service endpoint.
    fn path(job_id: &str) -> String;

    /// Status normalised to `PENDING`, `SUCCESS` or `FAIL`. Values outside
    /// that vocabulary are passed through unchanged.
    fn status(&self) -> String;

    /// Server-supplied explanation of a failure, if any.
    fn failure_reason(&self) -> Option<String> {
        None
    }
}

/// Fetches a job's status through its service client.
pub struct JobRefresh<'a, J> {
    client: &'a ServiceClient,
    job_id: &'a str,
    _job: PhantomData<fn() -> J>,
}

impl<'a, J: JobStatus> JobRefresh<'a, J> {
    pub fn new(client: &'a ServiceClient, job_id: &'a str) -> Self {
        Self {
            client,
            job_id,
            _job: PhantomData,
        }
    }
}

#[async_trait]
impl<'a, J: JobStatus> Refresh for JobRefresh<'a, J> {
    type Payload = J;
    type Error = ApiError;

    async fn refresh(&self) -> std::result::Result<Option<Snapshot<J>>, ApiError> {
        let job: J = self.client.get(&J::path(self.job_id)).await?;
        let status = job.status();

        if status == "FAIL" {
            if let Some(reason) = job.failure_reason() {
                tracing::warn!(job_id = self.job_id, "{} failed: {}", J::KIND, reason);
            }
        }

        Ok(Some(Snapshot::new(status, job)))
    }
}

/// Polls the job until it succeeds and returns its final state.
pub async fn wait_for_job<J: JobStatus>(
    client: &ServiceClient,
    ctx: &Context,
    job_id: &str,
    config: &WaitConfig,
) -> Result<J> {
    let refresh = JobRefresh::<J>::new(client, job_id);
    let outcome = Waiter::new(config.clone(), StatusSet::job())
        .wait(ctx, job_id, &refresh)
        .await
        .map_err(|e| Error::wait(format!("{} ({}) to complete", J::KIND, job_id), e))?;

    outcome
        .into_payload()
        .ok_or_else(|| Error::Api(ApiError::MissingField(J::KIND.to_string())))
}
