//! Image Management Service (IMS) operations

use serde::Serialize;
use statewait::{Context, WaitConfig};
use std::time::Duration;

use super::job_id;
use crate::api::common::JobSubmitted;
use crate::api::{ApiError, Client, ServiceClient};
use crate::error::Result;
use crate::jobs::{wait_for_job, CommonJob};

pub struct ImsApi {
    client: ServiceClient,
}

#[derive(Debug, Serialize)]
struct RegisterImageBody<'a> {
    image_url: &'a str,
}

impl ImsApi {
    pub fn new(client: &Client) -> std::result::Result<Self, ApiError> {
        Ok(Self {
            client: client.service("ims")?,
        })
    }

    /// Wait settings for image registration: 10 s before the first poll, then a
    /// backoff floored at 10 s. The floor already meets the 10 s ceiling, so polls stay 10 s apart.
    pub fn registration_wait(timeout: Duration) -> WaitConfig {
        WaitConfig::job(timeout)
            .delay(Duration::from_secs(10))
            .backoff(Duration::from_secs(10), Duration::from_secs(10))
    }

    /// PUT v1/cloudimages/{image_id}/upload
    ///
    /// Registers the image file at `image_url` (an OBS object) as the
    /// content of `image_id` and returns the image ID reported by the job.
    pub async fn register_image(
        &self,
        ctx: &Context,
        image_id: &str,
        image_url: &str,
        wait: &WaitConfig,
    ) -> Result<String> {
        let path = format!("v1/cloudimages/{}/upload", image_id);
        let submitted: JobSubmitted = self
            .client
            .put(&path, &RegisterImageBody { image_url })
            .await?;
        let job_id = job_id(&submitted)?;
        tracing::info!(job_id, image_id, "Registering IMS image");

        let job: CommonJob = wait_for_job(&self.client, ctx, job_id, wait).await?;
        Ok(job.entities.require_image_id()?.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statewait::PollSchedule;

    #[test]
    fn registration_wait_matches_service_pacing() {
        let wait = ImsApi::registration_wait(Duration::from_secs(600));
        assert_eq!(wait.timeout, Duration::from_secs(600));
        assert_eq!(wait.delay, Duration::from_secs(10));
        assert_eq!(
            wait.schedule,
            PollSchedule::Backoff {
                min: Duration::from_secs(10),
                max: Duration::from_secs(10),
            }
        );
        assert_eq!(wait.schedule.interval(0), Duration::from_secs(10));
        assert_eq!(wait.schedule.interval(5), Duration::from_secs(10));
    }
}
