// ABOUTME: Fixed-count health polling against a single slot endpoint.
// ABOUTME: Probe failures count as a non-matching status; the loop itself never errors.

use async_trait::async_trait;
use hyper::Uri;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Why a single probe request produced no status code.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("invalid health endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("connect timed out after {0:?}")]
    ConnectTimeout(Duration),

    #[error("connection failed: {0}")]
    Connect(#[source] std::io::Error),

    #[error("no response within {0:?}")]
    RequestTimeout(Duration),

    #[error("http error: {0}")]
    Http(String),
}

/// Issues one GET against an endpoint and reports the status code.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, endpoint: &Uri, connect_timeout: Duration) -> Result<u16, ProbeError>;
}

#[async_trait]
impl<T: Prober + ?Sized> Prober for &T {
    async fn probe(&self, endpoint: &Uri, connect_timeout: Duration) -> Result<u16, ProbeError> {
        (**self).probe(endpoint, connect_timeout).await
    }
}

#[async_trait]
impl<T: Prober + ?Sized> Prober for Arc<T> {
    async fn probe(&self, endpoint: &Uri, connect_timeout: Duration) -> Result<u16, ProbeError> {
        (**self).probe(endpoint, connect_timeout).await
    }
}

/// When a probe response counts as healthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessPredicate {
    /// Exact status code match.
    Status(u16),
}

impl SuccessPredicate {
    pub fn matches(&self, status: u16) -> bool {
        match self {
            SuccessPredicate::Status(expected) => status == *expected,
        }
    }
}

impl Default for SuccessPredicate {
    fn default() -> Self {
        SuccessPredicate::Status(200)
    }
}

/// Polling schedule for one run. Constant once the run starts.
#[derive(Debug, Clone)]
pub struct HealthCheckPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
    pub connect_timeout: Duration,
    /// Bound on the whole exchange, enforced by the prober.
    pub request_timeout: Duration,
    pub endpoint: Uri,
    pub success: SuccessPredicate,
}

impl HealthCheckPolicy {
    pub const DEFAULT_ATTEMPTS: u32 = 12;
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    /// Default schedule against `endpoint`: 12 attempts, 5s apart, 2s connect, exact 200.
    pub fn new(endpoint: Uri) -> Self {
        Self {
            max_attempts: Self::DEFAULT_ATTEMPTS,
            interval: Self::DEFAULT_INTERVAL,
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
            request_timeout: Self::DEFAULT_REQUEST_TIMEOUT,
            endpoint,
            success: SuccessPredicate::default(),
        }
    }
}

/// Result of a poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthOutcome {
    pub healthy: bool,
    /// Probes issued, including the successful one.
    pub attempts: u32,
    /// Status returned by the final attempt, if it got one.
    pub last_status: Option<u16>,
    /// Error from the final attempt, if it failed to get a status.
    pub last_error: Option<String>,
}

/// Sequential poller: one outstanding probe at a time.
#[derive(Debug, Clone)]
pub struct HealthProbe<H> {
    prober: H,
}

impl<H: Prober> HealthProbe<H> {
    pub fn new(prober: H) -> Self {
        Self { prober }
    }

    pub fn prober(&self) -> &H {
        &self.prober
    }

    /// Probe until the predicate holds or attempts run out.
    ///
    /// Waits `interval` between attempts, never after the last one.
    pub async fn poll(&self, policy: &HealthCheckPolicy) -> HealthOutcome {
        let mut outcome = HealthOutcome {
            healthy: false,
            attempts: 0,
            last_status: None,
            last_error: None,
        };

        for attempt in 1..=policy.max_attempts {
            outcome.attempts = attempt;

            match self
                .prober
                .probe(&policy.endpoint, policy.connect_timeout)
                .await
            {
                Ok(status) => {
                    outcome.last_status = Some(status);
                    outcome.last_error = None;
                    if policy.success.matches(status) {
                        tracing::debug!(attempt, status, "health probe succeeded");
                        outcome.healthy = true;
                        return outcome;
                    }
                    tracing::debug!(attempt, status, "health probe returned unexpected status");
                }
                Err(e) => {
                    tracing::debug!(attempt, "health probe failed: {}", e);
                    outcome.last_status = None;
                    outcome.last_error = Some(e.to_string());
                }
            }

            if attempt < policy.max_attempts && !policy.interval.is_zero() {
                tokio::time::sleep(policy.interval).await;
            }
        }

        outcome
    }
}
