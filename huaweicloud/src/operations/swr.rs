//! Software Repository for Container (SWR) jobs

use statewait::{Context, WaitConfig};
use std::time::Duration;

use crate::api::{ApiError, Client, ServiceClient};
use crate::error::Result;
use crate::jobs::{wait_for_job, SwrJob};

pub struct SwrApi {
    client: ServiceClient,
}

impl SwrApi {
    pub fn new(client: &Client) -> std::result::Result<Self, ApiError> {
        Ok(Self {
            client: client.service("swr")?,
        })
    }

    /// Wait settings for enterprise instance jobs: 120 s before the first
    /// poll, then every 20 s.
    pub fn job_wait(timeout: Duration) -> WaitConfig {
        WaitConfig::default()
            .timeout(timeout)
            .delay(Duration::from_secs(120))
            .interval(Duration::from_secs(20))
    }

    /// Waits for a job returned by an SWR enterprise call.
    pub async fn wait_for_swr_job(
        &self,
        ctx: &Context,
        job_id: &str,
        wait: &WaitConfig,
    ) -> Result<SwrJob> {
        wait_for_job(&self.client, ctx, job_id, wait).await
    }
}
