// ABOUTME: Test support utilities.
// ABOUTME: Provides scripted approval and probe doubles plus shared fixtures.

use async_trait::async_trait;
use hyper::Uri;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Once;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use slotswap::approval::{ApprovalChannel, ApprovalDecision, ApprovalRequest, Gate};
use slotswap::deploy::DeploySettings;
use slotswap::health::{ProbeError, Prober};
use slotswap::types::{ImageReference, ServiceName};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("slotswap=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

#[allow(dead_code)]
pub fn service() -> ServiceName {
    ServiceName::new("api").unwrap()
}

#[allow(dead_code)]
pub fn image() -> ImageReference {
    ImageReference::parse("ghcr.io/acme/api:2.4.0-9f3c2d1").unwrap()
}

/// Settings with a fast, two-attempt health check.
#[allow(dead_code)]
pub fn fast_settings() -> DeploySettings {
    let mut settings = DeploySettings::default();
    settings.health.attempts = 2;
    settings.health.interval = Duration::ZERO;
    settings
}

/// How a scripted gate answers.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Approve,
    Deny,
    Cancel,
    /// Never answer; only an interrupt releases the gate.
    Hold,
}

/// Approval channel with a fixed answer per gate.
#[allow(dead_code)]
pub struct ScriptedApproval {
    deploy: Answer,
    promote: Answer,
    asked: Mutex<Vec<Gate>>,
}

#[allow(dead_code)]
impl ScriptedApproval {
    pub fn new(deploy: Answer, promote: Answer) -> Self {
        Self {
            deploy,
            promote,
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn approving() -> Self {
        Self::new(Answer::Approve, Answer::Approve)
    }

    /// Gates reached, in order.
    pub fn asked(&self) -> Vec<Gate> {
        self.asked.lock().clone()
    }
}

#[async_trait]
impl ApprovalChannel for ScriptedApproval {
    async fn decide(&self, request: &ApprovalRequest) -> ApprovalDecision {
        self.asked.lock().push(request.gate);
        let answer = match request.gate {
            Gate::Deploy => self.deploy,
            Gate::Promote => self.promote,
        };
        match answer {
            Answer::Approve => ApprovalDecision::Approved,
            Answer::Deny => ApprovalDecision::Denied,
            Answer::Cancel => ApprovalDecision::Cancelled,
            Answer::Hold => std::future::pending().await,
        }
    }
}

/// One scripted probe reply.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy)]
pub enum Reply {
    Status(u16),
    Refused,
}

/// Prober that replays a script; the last reply repeats once it runs out.
#[allow(dead_code)]
pub struct ScriptedProber {
    replies: Mutex<VecDeque<Reply>>,
    last: Reply,
    calls: AtomicU32,
}

#[allow(dead_code)]
impl ScriptedProber {
    pub fn sequence(replies: impl IntoIterator<Item = Reply>) -> Self {
        let replies: VecDeque<Reply> = replies.into_iter().collect();
        let last = replies.back().copied().unwrap_or(Reply::Refused);
        Self {
            replies: Mutex::new(replies),
            last,
            calls: AtomicU32::new(0),
        }
    }

    pub fn statuses(statuses: impl IntoIterator<Item = u16>) -> Self {
        Self::sequence(statuses.into_iter().map(Reply::Status))
    }

    pub fn always(status: u16) -> Self {
        Self::sequence([Reply::Status(status)])
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self, _endpoint: &Uri, _connect_timeout: Duration) -> Result<u16, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.replies.lock().pop_front().unwrap_or(self.last);
        match reply {
            Reply::Status(status) => Ok(status),
            Reply::Refused => Err(ProbeError::Connect(std::io::Error::from(
                std::io::ErrorKind::ConnectionRefused,
            ))),
        }
    }
}
