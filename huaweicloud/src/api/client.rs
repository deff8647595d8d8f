use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use super::common::ApiErrorResponse;
use super::error::ApiError;
use super::pool::{ConnectionPoolConfig, ConnectionPoolManager, ConnectionStats};
use crate::config::Config;

const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
const SECURITY_TOKEN_HEADER: &str = "X-Security-Token";

/// HuaweiCloud API client shared by every service.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    config: Config,
    retry_config: RetryConfig,
    pool_manager: ConnectionPoolManager,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: crate::config::DEFAULT_MAX_RETRIES,
            initial_backoff_ms: 100,
            max_backoff_ms: 10000,
        }
    }
}

impl Client {
    /// Create a client, validating `config` first.
    pub fn new(config: Config) -> Result<Self, ApiError> {
        let retry_config = RetryConfig {
            max_retries: config.max_retries,
            ..Default::default()
        };
        Self::with_retry_config(config, retry_config)
    }

    pub fn with_retry_config(config: Config, retry_config: RetryConfig) -> Result<Self, ApiError> {
        config.validate()?;

        let pool_manager = ConnectionPoolManager::new(ConnectionPoolConfig::from(&config));
        let http_client = pool_manager.build_client(config.insecure)?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                config,
                retry_config,
                pool_manager,
            }),
        })
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Client bound to the endpoint of `service` (e.g. `bms`, `ims`, `cdn`).
    pub fn service(&self, service: &str) -> Result<ServiceClient, ApiError> {
        let endpoint = self.inner.config.endpoint_for(service)?;
        Ok(ServiceClient {
            client: self.clone(),
            service: service.to_string(),
            endpoint,
        })
    }

    pub async fn get_connection_stats(&self) -> ConnectionStats {
        self.inner.pool_manager.get_stats().await
    }

    /// Execute request with retry logic
    async fn execute_with_retry<F, Fut, T>(&self, request_fn: F, path: &str) -> Result<T, ApiError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
        T: DeserializeOwned,
    {
        let retry = &self.inner.retry_config;
        let mut attempt = 0;
        let mut last_error = None;

        while attempt <= retry.max_retries {
            if attempt > 0 {
                let backoff = std::cmp::min(
                    retry
                        .initial_backoff_ms
                        .saturating_mul(2_u64.saturating_pow(attempt - 1)),
                    retry.max_backoff_ms,
                );
                tracing::debug!(
                    "Retrying request to {} after {}ms (attempt {})",
                    path,
                    backoff,
                    attempt
                );
                self.inner.pool_manager.record_retry().await;
                tokio::time::sleep(tokio::time::Duration::from_millis(backoff)).await;
            }

            match request_fn().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        self.inner.pool_manager.record_request(true).await;
                        return self.parse_success_response(response).await;
                    }

                    self.inner.pool_manager.record_request(false).await;

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(ApiError::RateLimited);
                    } else if status.is_server_error() {
                        last_error = Some(ApiError::ServiceUnavailable);
                    } else {
                        return self.handle_error_response(response).await;
                    }
                }
                Err(e) => {
                    self.inner.pool_manager.record_request(false).await;

                    if e.is_timeout() {
                        last_error = Some(ApiError::Timeout(
                            self.inner.pool_manager.request_timeout().as_secs(),
                        ));
                    } else if e.is_connect() {
                        last_error = Some(ApiError::ServiceUnavailable);
                    } else {
                        return Err(ApiError::RequestError(e));
                    }
                }
            }

            attempt += 1;
        }

        Err(last_error.unwrap_or(ApiError::ServiceUnavailable))
    }

    /// Parse successful response. An empty body decodes as JSON `null`.
    async fn parse_success_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let text = response.text().await?;
        tracing::debug!("API response body: {}", text);

        let body = if text.trim().is_empty() { "null" } else { &text };
        serde_json::from_str::<T>(body).map_err(|e| {
            tracing::error!("Failed to deserialize response: {}, body: {}", e, text);
            ApiError::ParseError(format!("Failed to parse response: {}", e))
        })
    }

    /// Handle error response
    async fn handle_error_response<T>(&self, response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        let (code, message) = match serde_json::from_str::<ApiErrorResponse>(&text) {
            Ok(err_resp) => {
                let (code, message) = err_resp.into_parts();
                (Some(code), message)
            }
            Err(_) => (None, text),
        };

        tracing::debug!(status = status.as_u16(), ?code, "API error response: {}", message);

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(ApiError::AuthError(status.as_u16()))
            }
            StatusCode::NOT_FOUND => Err(ApiError::NotFound(message)),
            _ => Err(ApiError::ApiError {
                status: status.as_u16(),
                code,
                message,
            }),
        }
    }
}

/// Client for a single service endpoint.
///
/// Paths are relative to the service endpoint and may contain a
/// `{project_id}` placeholder.
#[derive(Clone)]
pub struct ServiceClient {
    client: Client,
    service: String,
    endpoint: String,
}

impl ServiceClient {
    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn project_id(&self) -> &str {
        &self.client.inner.config.project_id
    }

    /// Full URL for `path`, with `{project_id}` filled in.
    pub fn url(&self, path: &str) -> String {
        let path = path
            .trim_start_matches('/')
            .replace("{project_id}", self.project_id());
        format!("{}{}", self.endpoint, path)
    }

    /// Execute a GET request with retry logic
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send::<T, ()>(Method::GET, path, None).await
    }

    /// Execute a POST request with retry logic
    pub async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(Method::POST, path, Some(body)).await
    }

    /// Execute a PUT request with retry logic
    pub async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(Method::PUT, path, Some(body)).await
    }

    /// Execute a DELETE request with retry logic
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send::<T, ()>(Method::DELETE, path, None).await
    }

    async fn send<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        let inner = &self.client.inner;

        self.client
            .execute_with_retry(
                || {
                    tracing::debug!("{} request to: {}", method, url);

                    let mut request = inner
                        .http_client
                        .request(method.clone(), &url)
                        .header(AUTH_TOKEN_HEADER, &inner.config.auth_token);
                    if let Some(token) = &inner.config.security_token {
                        request = request.header(SECURITY_TOKEN_HEADER, token);
                    }
                    if let Some(body) = body {
                        request = request.json(body);
                    }
                    request.send()
                },
                path,
            )
            .await
    }
}
