//! Test helpers for the HuaweiCloud API

use crate::config::Config;

/// Services whose endpoints the helpers point at the mock server.
pub const TEST_SERVICES: &[&str] = &["bms", "ims", "cdn", "swr", "ecs", "evs"];

#[allow(dead_code)]
pub fn test_config(url: &str) -> Config {
    TEST_SERVICES.iter().fold(
        Config::new("cn-north-4", "test-project", "test-token").with_max_retries(0),
        |config, service| config.with_endpoint(*service, url),
    )
}

#[allow(dead_code)]
#[allow(clippy::disallowed_methods)]
pub fn create_test_client(url: &str) -> super::Client {
    super::Client::new(test_config(url)).unwrap()
}

#[cfg(test)]
mod tests {
    use super::super::*;
    use super::*;

    #[test]
    fn test_retry_config() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.initial_backoff_ms, 100);
        assert_eq!(config.max_backoff_ms, 10000);
    }

    #[test]
    fn test_client_points_every_service_at_mock() {
        let client = create_test_client("http://127.0.0.1:9");
        for service in TEST_SERVICES {
            let svc = client.service(service).unwrap();
            assert_eq!(svc.endpoint(), "http://127.0.0.1:9/");
            assert_eq!(svc.project_id(), "test-project");
        }
    }
}
