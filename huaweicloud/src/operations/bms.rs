//! Bare Metal Server (BMS) operations

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use statewait::{Context, Refresh, Snapshot, StatusSet, WaitConfig, Waiter};
use std::collections::HashMap;

use super::{job_id, DeletePolicy};
use crate::api::common::{IdRef, JobSubmitted};
use crate::api::{ApiError, Client, ServiceClient};
use crate::error::{Error, Result};
use crate::jobs::{wait_for_job, CommonJob};

/// BMS API providing job-backed server operations
pub struct BmsApi {
    client: ServiceClient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    On,
    Off,
    Reboot,
}

impl PowerAction {
    fn verb(self) -> &'static str {
        match self {
            PowerAction::On => "starting",
            PowerAction::Off => "stopping",
            PowerAction::Reboot => "rebooting",
        }
    }

    fn body(self, server_id: &str) -> serde_json::Value {
        let servers = vec![IdRef::new(server_id)];
        match self {
            PowerAction::On => serde_json::json!({ "os-start": { "servers": servers } }),
            PowerAction::Off => {
                serde_json::json!({ "os-stop": { "type": "HARD", "servers": servers } })
            }
            PowerAction::Reboot => {
                serde_json::json!({ "reboot": { "type": "HARD", "servers": servers } })
            }
        }
    }
}

impl std::str::FromStr for PowerAction {
    type Err = ApiError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "ON" => Ok(PowerAction::On),
            "OFF" => Ok(PowerAction::Off),
            "REBOOT" => Ok(PowerAction::Reboot),
            other => Err(ApiError::ParseError(format!(
                "invalid power action {}, expected one of ON, OFF, REBOOT",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateServerRequest {
    pub name: String,
    #[serde(rename = "imageRef")]
    pub image_id: String,
    #[serde(rename = "flavorRef")]
    pub flavor_id: String,
    #[serde(rename = "vpcid")]
    pub vpc_id: String,
    pub availability_zone: String,
    pub nics: Vec<NicRequest>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security_groups: Vec<IdRef>,
    #[serde(rename = "adminPass", skip_serializing_if = "Option::is_none")]
    pub admin_pass: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,
    /// Base64 encoded user data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_volume: Option<RootVolume>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub data_volumes: Vec<RootVolume>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RootVolume {
    pub volumetype: String,
    pub size: u32,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct NicRequest {
    pub subnet_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security_groups: Vec<IdRef>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttachVolumeRequest {
    #[serde(rename = "volumeId")]
    pub volume_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReinstallOsRequest {
    #[serde(rename = "imageid")]
    pub image_id: String,
    #[serde(rename = "adminpass", skip_serializing_if = "Option::is_none")]
    pub admin_pass: Option<String>,
    #[serde(rename = "keyname", skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,
    #[serde(rename = "userid", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ServerDetail {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct ServerResponse {
    server: ServerDetail,
}

impl BmsApi {
    pub fn new(client: &Client) -> std::result::Result<Self, ApiError> {
        Ok(Self {
            client: client.service("bms")?,
        })
    }

    /// POST v1/{project_id}/baremetalservers, returning the new server ID.
    pub async fn create_server(
        &self,
        ctx: &Context,
        request: &CreateServerRequest,
        wait: &WaitConfig,
    ) -> Result<String> {
        let body = serde_json::json!({ "server": request });
        let submitted: JobSubmitted = self
            .client
            .post("v1/{project_id}/baremetalservers", &body)
            .await?;
        let job_id = job_id(&submitted)?;
        tracing::info!(job_id, name = %request.name, "Creating BMS server");

        let job: CommonJob = wait_for_job(&self.client, ctx, job_id, wait).await?;
        Ok(job.entities.require_server_id()?.to_string())
    }

    /// GET v1/{project_id}/baremetalservers/{server_id}
    pub async fn get_server(&self, server_id: &str) -> std::result::Result<ServerDetail, ApiError> {
        let path = format!("v1/{{project_id}}/baremetalservers/{}", server_id);
        let response: ServerResponse = self.client.get(&path).await?;
        Ok(response.server)
    }

    /// POST v1/{project_id}/baremetalservers/action
    pub async fn power_action(
        &self,
        ctx: &Context,
        server_id: &str,
        action: PowerAction,
        wait: &WaitConfig,
    ) -> Result<()> {
        let submitted: JobSubmitted = self
            .client
            .post("v1/{project_id}/baremetalservers/action", &action.body(server_id))
            .await?;
        let job_id = job_id(&submitted)?;
        tracing::info!(job_id, server_id, "{} BMS server", action.verb());

        wait_for_job::<CommonJob>(&self.client, ctx, job_id, wait).await?;
        Ok(())
    }

    /// POST v1/{project_id}/baremetalservers/{server_id}/nics
    pub async fn add_nics(
        &self,
        ctx: &Context,
        server_id: &str,
        nics: &[NicRequest],
        wait: &WaitConfig,
    ) -> Result<()> {
        let path = format!("v1/{{project_id}}/baremetalservers/{}/nics", server_id);
        let body = serde_json::json!({ "nics": nics });
        self.submit_and_wait(ctx, &path, &body, wait).await
    }

    /// POST v1/{project_id}/baremetalservers/{server_id}/nics/delete
    pub async fn delete_nics(
        &self,
        ctx: &Context,
        server_id: &str,
        port_ids: &[String],
        wait: &WaitConfig,
    ) -> Result<()> {
        let path = format!("v1/{{project_id}}/baremetalservers/{}/nics/delete", server_id);
        let nics: Vec<IdRef> = port_ids.iter().map(IdRef::new).collect();
        let body = serde_json::json!({ "nics": nics });
        self.submit_and_wait(ctx, &path, &body, wait).await
    }

    /// POST v1/{project_id}/baremetalservers/{server_id}/attachvolume
    pub async fn attach_volume(
        &self,
        ctx: &Context,
        server_id: &str,
        request: &AttachVolumeRequest,
        wait: &WaitConfig,
    ) -> Result<()> {
        let path = format!("v1/{{project_id}}/baremetalservers/{}/attachvolume", server_id);
        let body = serde_json::json!({ "volumeAttachment": request });
        self.submit_and_wait(ctx, &path, &body, wait).await
    }

    /// DELETE v1/{project_id}/baremetalservers/{server_id}/detachvolume/{volume_id}
    pub async fn detach_volume(
        &self,
        ctx: &Context,
        server_id: &str,
        volume_id: &str,
        wait: &WaitConfig,
    ) -> Result<()> {
        let path = format!(
            "v1/{{project_id}}/baremetalservers/{}/detachvolume/{}",
            server_id, volume_id
        );
        let submitted: JobSubmitted = self.client.delete(&path).await?;
        let job_id = job_id(&submitted)?;
        wait_for_job::<CommonJob>(&self.client, ctx, job_id, wait).await?;
        Ok(())
    }

    /// POST v1/{project_id}/baremetalservers/{server_id}/changeos
    ///
    /// Only a stopped server (or one whose last OS change failed) accepts
    /// this call; the server is started again once the OS is installed.
    pub async fn reinstall_os(
        &self,
        ctx: &Context,
        server_id: &str,
        request: &ReinstallOsRequest,
        wait: &WaitConfig,
    ) -> Result<()> {
        let path = format!("v1/{{project_id}}/baremetalservers/{}/changeos", server_id);
        let body = serde_json::json!({ "os-change": request });
        self.submit_and_wait(ctx, &path, &body, wait).await
    }

    /// POST v1/{project_id}/baremetalservers/delete, then waits until the
    /// server reports `DELETED` or is gone.
    ///
    /// A 404 on submission means the server is already gone.
    pub async fn delete_server(
        &self,
        ctx: &Context,
        server_id: &str,
        policy: DeletePolicy,
        wait: &WaitConfig,
    ) -> Result<()> {
        let body = serde_json::json!({ "servers": [IdRef::new(server_id)] });
        match self
            .client
            .post::<serde_json::Value, _>("v1/{project_id}/baremetalservers/delete", &body)
            .await
        {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                tracing::debug!(server_id, "BMS server already deleted");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }

        let operation = format!("BMS server ({}) to be deleted", server_id);
        let result = self
            .wait_for_deleted(ctx, server_id, wait)
            .await
            .map_err(|e| Error::wait(operation.clone(), e));
        policy.apply(&operation, result)
    }

    async fn wait_for_deleted(
        &self,
        ctx: &Context,
        server_id: &str,
        wait: &WaitConfig,
    ) -> std::result::Result<(), statewait::WaitError<ApiError>> {
        let vocabulary = StatusSet::new()
            .pending(["Deleting", "ACTIVE", "SHUTOFF"])
            .target(["DELETED"])
            .failed(["ERROR"])
            .absence_is_target();
        let refresh = ServerStatusRefresh {
            api: self,
            server_id,
        };

        Waiter::new(wait.clone(), vocabulary)
            .wait(ctx, server_id, &refresh)
            .await?;
        Ok(())
    }

    async fn submit_and_wait(
        &self,
        ctx: &Context,
        path: &str,
        body: &serde_json::Value,
        wait: &WaitConfig,
    ) -> Result<()> {
        let submitted: JobSubmitted = self.client.post(path, body).await?;
        let job_id = job_id(&submitted)?;
        tracing::debug!(job_id, path, "Submitted BMS job");

        wait_for_job::<CommonJob>(&self.client, ctx, job_id, wait).await?;
        Ok(())
    }
}

/// Polls the server itself; a 404 means it is gone.
struct ServerStatusRefresh<'a> {
    api: &'a BmsApi,
    server_id: &'a str,
}

#[async_trait]
impl<'a> Refresh for ServerStatusRefresh<'a> {
    type Payload = ServerDetail;
    type Error = ApiError;

    async fn refresh(&self) -> std::result::Result<Option<Snapshot<ServerDetail>>, ApiError> {
        match self.api.get_server(self.server_id).await {
            Ok(server) => Ok(Some(Snapshot::new(server.status.clone(), server))),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    #[test]
    fn power_action_parses_provider_values() {
        assert_eq!("ON".parse::<PowerAction>().unwrap(), PowerAction::On);
        assert_eq!("OFF".parse::<PowerAction>().unwrap(), PowerAction::Off);
        assert_eq!("REBOOT".parse::<PowerAction>().unwrap(), PowerAction::Reboot);
        assert!("off".parse::<PowerAction>().is_err());
    }

    #[test]
    fn power_action_bodies() {
        assert_eq!(
            PowerAction::On.body("s-1"),
            serde_json::json!({"os-start": {"servers": [{"id": "s-1"}]}})
        );
        assert_eq!(
            PowerAction::Off.body("s-1"),
            serde_json::json!({"os-stop": {"type": "HARD", "servers": [{"id": "s-1"}]}})
        );
        assert_eq!(
            PowerAction::Reboot.body("s-1"),
            serde_json::json!({"reboot": {"type": "HARD", "servers": [{"id": "s-1"}]}})
        );
    }

    #[test]
    fn create_request_uses_api_field_names() {
        let request = CreateServerRequest {
            name: "bms-1".into(),
            image_id: "img".into(),
            flavor_id: "physical.s4.large".into(),
            vpc_id: "vpc".into(),
            availability_zone: "cn-north-4a".into(),
            nics: vec![NicRequest {
                subnet_id: "subnet".into(),
                ..Default::default()
            }],
            key_name: Some("kp".into()),
            ..Default::default()
        };
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["imageRef"], "img");
        assert_eq!(value["flavorRef"], "physical.s4.large");
        assert_eq!(value["vpcid"], "vpc");
        assert_eq!(value["nics"][0], serde_json::json!({"subnet_id": "subnet"}));
        assert_eq!(value["key_name"], "kp");
        assert!(value.get("adminPass").is_none());
        assert!(value.get("security_groups").is_none());
    }

    #[test]
    fn reinstall_request_uses_api_field_names() {
        let request = ReinstallOsRequest {
            image_id: "img-2".into(),
            admin_pass: Some("secret".into()),
            ..Default::default()
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"imageid": "img-2", "adminpass": "secret"})
        );
    }
}
