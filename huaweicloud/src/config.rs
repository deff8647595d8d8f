//! Client configuration
//!
//! Region, project and credentials are carried by an explicit [`Config`]
//! value handed to [`crate::api::Client::new`]; nothing is read from global
//! state after construction.

use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_CLOUD: &str = "myhuaweicloud.com";
pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required (set it explicitly or via the {1} environment variable)")]
    Missing(&'static str, &'static str),

    #[error("invalid endpoint for service {service}: {reason}")]
    InvalidEndpoint { service: String, reason: String },

    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Clone)]
pub struct Config {
    pub region: String,
    pub project_id: String,
    pub auth_token: String,
    pub security_token: Option<String>,
    pub cloud: String,
    /// Custom endpoints keyed by service name, overriding the default URL.
    pub endpoints: HashMap<String, String>,
    pub insecure: bool,
    pub max_retries: u32,
    pub request_timeout: Duration,
}

impl Config {
    pub fn new(
        region: impl Into<String>,
        project_id: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> Self {
        Self {
            region: region.into(),
            project_id: project_id.into(),
            auth_token: auth_token.into(),
            security_token: None,
            cloud: DEFAULT_CLOUD.to_string(),
            endpoints: HashMap::new(),
            insecure: false,
            max_retries: DEFAULT_MAX_RETRIES,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Builds a configuration from `HW_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let region = required_env("region", "HW_REGION_NAME")?;
        let project_id = required_env("project_id", "HW_PROJECT_ID")?;
        let auth_token = required_env("auth_token", "HW_AUTH_TOKEN")?;

        let mut config = Self::new(region, project_id, auth_token);
        config.security_token = optional_env("HW_SECURITY_TOKEN");

        if let Some(cloud) = optional_env("HW_CLOUD") {
            config.cloud = cloud;
        }

        if let Some(insecure) = optional_env("HW_INSECURE") {
            config.insecure = insecure
                .parse::<bool>()
                .map_err(|_| ConfigError::InvalidValue {
                    name: "insecure",
                    value: insecure,
                })?;
        }

        if let Some(retries) = optional_env("HW_MAX_RETRIES") {
            config.max_retries = retries
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidValue {
                    name: "max_retries",
                    value: retries,
                })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_endpoint(mut self, service: impl Into<String>, endpoint: impl Into<String>) -> Self {
        self.endpoints.insert(service.into(), endpoint.into());
        self
    }

    pub fn with_security_token(mut self, token: impl Into<String>) -> Self {
        self.security_token = Some(token.into());
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.region.is_empty() {
            return Err(ConfigError::Missing("region", "HW_REGION_NAME"));
        }
        if self.project_id.is_empty() {
            return Err(ConfigError::Missing("project_id", "HW_PROJECT_ID"));
        }
        if self.auth_token.is_empty() {
            return Err(ConfigError::Missing("auth_token", "HW_AUTH_TOKEN"));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "request_timeout",
                value: format!("{:?}", self.request_timeout),
            });
        }
        for service in self.endpoints.keys() {
            self.endpoint_for(service)?;
        }
        Ok(())
    }

    /// Base URL for `service`, always ending in `/`.
    pub fn endpoint_for(&self, service: &str) -> Result<String, ConfigError> {
        let raw = match self.endpoints.get(service) {
            Some(custom) => custom.clone(),
            None => format!("https://{}.{}.{}/", service, self.region, self.cloud),
        };

        let url = Url::parse(&raw).map_err(|e| ConfigError::InvalidEndpoint {
            service: service.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEndpoint {
                service: service.to_string(),
                reason: format!("unsupported scheme {}", url.scheme()),
            });
        }

        let mut endpoint = url.to_string();
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }
        Ok(endpoint)
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("region", &self.region)
            .field("project_id", &self.project_id)
            .field("auth_token", &"<redacted>")
            .field("cloud", &self.cloud)
            .field("endpoints", &self.endpoints)
            .field("insecure", &self.insecure)
            .field("max_retries", &self.max_retries)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

fn required_env(name: &'static str, var: &'static str) -> Result<String, ConfigError> {
    optional_env(var).ok_or(ConfigError::Missing(name, var))
}

fn optional_env(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.is_empty())
}
