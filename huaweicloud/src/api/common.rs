//! Common types and utilities for HuaweiCloud APIs

use serde::{Deserialize, Serialize};

/// Error body returned by HuaweiCloud services.
///
/// Services use either a flat `error_code`/`error_msg` pair or a nested
/// `error` object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ApiErrorResponse {
    Flat {
        error_code: String,
        error_msg: String,
    },
    Nested {
        error: ApiErrorBody,
    },
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiErrorResponse {
    pub fn into_parts(self) -> (String, String) {
        match self {
            ApiErrorResponse::Flat {
                error_code,
                error_msg,
            } => (error_code, error_msg),
            ApiErrorResponse::Nested { error } => (error.code, error.message),
        }
    }
}

/// Response of a mutating call that started an asynchronous job.
///
/// Most services answer with `job_id`; a few (OS change) use `jobId`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct JobSubmitted {
    #[serde(default, alias = "jobId", skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}

impl JobSubmitted {
    /// The job ID, treating an empty string as absent.
    pub fn job_id(&self) -> Option<&str> {
        self.job_id.as_deref().filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ApiQueryParams {
    params: Vec<(String, String)>,
}

impl ApiQueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<K: Into<String>, V: ToString>(mut self, key: K, value: V) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn add_optional<K: Into<String>, V: ToString>(mut self, key: K, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.params.push((key.into(), v.to_string()));
        }
        self
    }

    pub fn to_query_string(&self) -> String {
        if self.params.is_empty() {
            String::new()
        } else {
            format!(
                "?{}",
                self.params
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
                    .collect::<Vec<_>>()
                    .join("&")
            )
        }
    }
}

/// `{"id": "..."}` reference used throughout request bodies.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct IdRef {
    pub id: String,
}

impl IdRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    #[test]
    fn flat_error_body_parses() {
        let body = r#"{"error_code":"BMS.0015","error_msg":"server not found"}"#;
        let parsed: ApiErrorResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            parsed.into_parts(),
            ("BMS.0015".to_string(), "server not found".to_string())
        );
    }

    #[test]
    fn nested_error_body_parses() {
        let body = r#"{"error":{"code":"CDN.0001","message":"invalid token"}}"#;
        let parsed: ApiErrorResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.into_parts().0, "CDN.0001");
    }

    #[test]
    fn job_submitted_accepts_both_spellings() {
        let snake: JobSubmitted = serde_json::from_str(r#"{"job_id":"j1"}"#).unwrap();
        let camel: JobSubmitted = serde_json::from_str(r#"{"jobId":"j2"}"#).unwrap();
        let empty: JobSubmitted = serde_json::from_str(r#"{"job_id":""}"#).unwrap();

        assert_eq!(snake.job_id(), Some("j1"));
        assert_eq!(camel.job_id(), Some("j2"));
        assert_eq!(empty.job_id(), None);
    }

    #[test]
    fn query_params_encode_values() {
        let query = ApiQueryParams::new()
            .add("enterprise_project_id", "all_granted_eps")
            .add_optional("name", Some("a b"))
            .add_optional("none", None::<String>)
            .to_query_string();

        assert_eq!(query, "?enterprise_project_id=all_granted_eps&name=a%20b");
        assert_eq!(ApiQueryParams::new().to_query_string(), "");
    }
}
