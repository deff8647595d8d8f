use serde::Deserialize;

use super::JobStatus;
use crate::api::ApiError;

/// Job resource shared by ECS, BMS, EVS and IMS: `GET v1/{project_id}/jobs/{job_id}`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct CommonJob {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub entities: JobEntities,
    #[serde(default)]
    pub begin_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub fail_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct JobEntities {
    #[serde(default)]
    pub server_id: Option<String>,
    #[serde(default)]
    pub image_id: Option<String>,
    #[serde(default)]
    pub volume_id: Option<String>,
    #[serde(default)]
    pub sub_jobs_total: Option<u32>,
    #[serde(default)]
    pub sub_jobs: Vec<SubJob>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SubJob {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub entities: SubJobEntities,
    #[serde(default)]
    pub fail_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SubJobEntities {
    #[serde(default)]
    pub server_id: Option<String>,
    #[serde(default)]
    pub volume_id: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl JobEntities {
    /// Server created by the job. Batch creates report it on the first sub-job.
    pub fn server_id(&self) -> Option<&str> {
        non_empty(&self.server_id).or_else(|| {
            self.sub_jobs
                .iter()
                .find_map(|job| non_empty(&job.entities.server_id))
        })
    }

    pub fn image_id(&self) -> Option<&str> {
        non_empty(&self.image_id)
    }

    pub fn volume_id(&self) -> Option<&str> {
        non_empty(&self.volume_id).or_else(|| {
            self.sub_jobs
                .iter()
                .find_map(|job| non_empty(&job.entities.volume_id))
        })
    }

    pub fn require_server_id(&self) -> Result<&str, ApiError> {
        self.server_id()
            .ok_or_else(|| ApiError::MissingField("server_id".to_string()))
    }

    pub fn require_image_id(&self) -> Result<&str, ApiError> {
        self.image_id()
            .ok_or_else(|| ApiError::MissingField("image_id".to_string()))
    }

    pub fn require_volume_id(&self) -> Result<&str, ApiError> {
        self.volume_id()
            .ok_or_else(|| ApiError::MissingField("volume_id".to_string()))
    }
}

impl JobStatus for CommonJob {
    const KIND: &'static str = "job";

    fn path(job_id: &str) -> String {
        format!("v1/{{project_id}}/jobs/{}", job_id)
    }

    fn status(&self) -> String {
        match self.status.as_str() {
            "INIT" | "RUNNING" => "PENDING".to_string(),
            other => other.to_string(),
        }
    }

    fn failure_reason(&self) -> Option<String> {
        let reason = non_empty(&self.fail_reason)?;
        Some(match non_empty(&self.error_code) {
            Some(code) => format!("{} ({})", reason, code),
            None => reason.to_string(),
        })
    }
}
