//! Content Delivery Network (CDN) cache operations

use serde::{Deserialize, Serialize};
use statewait::{Context, WaitConfig};
use std::time::Duration;

use crate::api::common::ApiQueryParams;
use crate::api::{ApiError, Client, ServiceClient};
use crate::error::Result;
use crate::jobs::{wait_for_job, CdnTask};

pub struct CdnApi {
    client: ServiceClient,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RefreshType {
    #[default]
    File,
    Directory,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RefreshCacheRequest {
    #[serde(rename = "type")]
    pub refresh_type: RefreshType,
    pub urls: Vec<String>,
    /// Directory refresh mode, `all` or `detect_modify_refresh`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zh_url_encode: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RefreshTaskCreated {
    #[serde(default)]
    refresh_task: Option<String>,
}

impl CdnApi {
    pub fn new(client: &Client) -> std::result::Result<Self, ApiError> {
        Ok(Self {
            client: client.service("cdn")?,
        })
    }

    /// Wait settings for cache tasks: 20 s before the first poll, then every 20 s.
    pub fn task_wait(timeout: Duration) -> WaitConfig {
        WaitConfig::default()
            .timeout(timeout)
            .delay(Duration::from_secs(20))
            .interval(Duration::from_secs(20))
    }

    /// POST v1.0/cdn/content/refresh-tasks, then waits on the history task.
    pub async fn refresh_cache(
        &self,
        ctx: &Context,
        request: &RefreshCacheRequest,
        enterprise_project_id: Option<&str>,
        wait: &WaitConfig,
    ) -> Result<CdnTask> {
        let query = ApiQueryParams::new()
            .add_optional("enterprise_project_id", enterprise_project_id)
            .to_query_string();
        let path = format!("v1.0/cdn/content/refresh-tasks{}", query);
        let body = serde_json::json!({ "refresh_task": request });

        let created: RefreshTaskCreated = self.client.post(&path, &body).await?;
        let task_id = created
            .refresh_task
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::MissingField("refresh_task".to_string()))?;
        tracing::info!(task_id = %task_id, urls = request.urls.len(), "Refreshing CDN cache");

        wait_for_job(&self.client, ctx, &task_id, wait).await
    }
}
