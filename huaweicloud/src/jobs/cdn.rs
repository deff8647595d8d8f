use serde::Deserialize;

use super::JobStatus;

/// CDN cache refresh/preheat task: `GET v1.0/cdn/historytasks/{id}/detail`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct CdnTask {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub task_type: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub processing: u32,
    #[serde(default)]
    pub succeed: u32,
    #[serde(default)]
    pub failed: u32,
    #[serde(default)]
    pub total: u32,
}

impl JobStatus for CdnTask {
    const KIND: &'static str = "CDN task";

    fn path(job_id: &str) -> String {
        format!("v1.0/cdn/historytasks/{}/detail", job_id)
    }

    fn status(&self) -> String {
        match self.status.as_str() {
            "task_inprocess" => "PENDING".to_string(),
            "task_done" if self.failed > 0 => "FAIL".to_string(),
            "task_done" => "SUCCESS".to_string(),
            other => other.to_string(),
        }
    }

    fn failure_reason(&self) -> Option<String> {
        (self.failed > 0).then(|| format!("{} of {} URLs failed", self.failed, self.total))
    }
}
