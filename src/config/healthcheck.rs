// ABOUTME: HTTP health probe configuration for the new slot.
// ABOUTME: The endpoint is a template resolved per run from the service and target color.

use hyper::Uri;
use serde::Deserialize;
use std::time::Duration;

use crate::health::{HealthCheckPolicy, ProbeError, SuccessPredicate};
use crate::types::{DeploymentColor, ServiceName};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthcheckConfig {
    /// URL template; `{service}`, `{color}` and `{slot}` are substituted.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_attempts")]
    pub attempts: u32,

    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,

    #[serde(default = "default_connect_timeout", with = "humantime_serde")]
    pub connect_timeout: Duration,

    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    #[serde(default = "default_expected_status")]
    pub expected_status: u16,
}

fn default_endpoint() -> String {
    "http://{service}-{color}:8080/health".to_string()
}

fn default_attempts() -> u32 {
    HealthCheckPolicy::DEFAULT_ATTEMPTS
}

fn default_interval() -> Duration {
    HealthCheckPolicy::DEFAULT_INTERVAL
}

fn default_connect_timeout() -> Duration {
    HealthCheckPolicy::DEFAULT_CONNECT_TIMEOUT
}

fn default_request_timeout() -> Duration {
    HealthCheckPolicy::DEFAULT_REQUEST_TIMEOUT
}

fn default_expected_status() -> u16 {
    200
}

impl Default for HealthcheckConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            attempts: default_attempts(),
            interval: default_interval(),
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
            expected_status: default_expected_status(),
        }
    }
}

impl HealthcheckConfig {
    pub fn endpoint_for(&self, service: &ServiceName, color: DeploymentColor) -> String {
        self.endpoint
            .replace("{slot}", &service.slot_name(color))
            .replace("{service}", service.as_str())
            .replace("{color}", color.as_str())
    }

    /// Resolve the probing policy for one slot.
    pub fn policy(
        &self,
        service: &ServiceName,
        color: DeploymentColor,
    ) -> Result<HealthCheckPolicy, ProbeError> {
        let raw = self.endpoint_for(service, color);
        let endpoint: Uri = raw
            .parse()
            .map_err(|e| ProbeError::InvalidEndpoint(format!("'{}': {}", raw, e)))?;

        if endpoint.scheme_str() != Some("http") || endpoint.authority().is_none() {
            return Err(ProbeError::InvalidEndpoint(format!(
                "'{}' is not an absolute http:// URL",
                raw
            )));
        }

        Ok(HealthCheckPolicy {
            max_attempts: self.attempts,
            interval: self.interval,
            connect_timeout: self.connect_timeout,
            request_timeout: self.request_timeout,
            endpoint,
            success: SuccessPredicate::Status(self.expected_status),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> ServiceName {
        ServiceName::new("api").unwrap()
    }

    #[test]
    fn default_template_targets_slot_alias() {
        let policy = HealthcheckConfig::default()
            .policy(&service(), DeploymentColor::Green)
            .unwrap();
        assert_eq!(policy.endpoint.to_string(), "http://api-green:8080/health");
        assert_eq!(policy.max_attempts, 12);
    }

    #[test]
    fn slot_placeholder_expands() {
        let config = HealthcheckConfig {
            endpoint: "http://{slot}/ready".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.endpoint_for(&service(), DeploymentColor::Blue),
            "http://api-blue/ready"
        );
    }

    #[test]
    fn relative_endpoint_is_rejected() {
        let config = HealthcheckConfig {
            endpoint: "/health".to_string(),
            ..Default::default()
        };
        assert!(config.policy(&service(), DeploymentColor::Blue).is_err());
    }
}
