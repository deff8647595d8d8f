use serde::Deserialize;

use super::JobStatus;

/// SWR enterprise job: `GET v2/{project_id}/jobs/{job_id}`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SwrJob {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub resource_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl JobStatus for SwrJob {
    const KIND: &'static str = "SWR job";

    fn path(job_id: &str) -> String {
        format!("v2/{{project_id}}/jobs/{}", job_id)
    }

    fn status(&self) -> String {
        match self.status.as_str() {
            "Success" => "SUCCESS".to_string(),
            "Failed" => "FAIL".to_string(),
            "Running" | "Initial" => "PENDING".to_string(),
            other => other.to_string(),
        }
    }

    fn failure_reason(&self) -> Option<String> {
        self.reason.clone().filter(|r| !r.is_empty())
    }
}
