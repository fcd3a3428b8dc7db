// ABOUTME: Hooks system for deployment lifecycle events.
// ABOUTME: Discovers and executes executables at pre-deploy, post-deploy, and on-error points.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::deploy::RunReport;
use crate::types::{DeploymentColor, ImageReference, ServiceName};

/// Hook execution points in the deployment lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPoint {
    /// Before planning. Failure aborts the run.
    PreDeploy,
    /// After promotion. Receives the released tag.
    PostDeploy,
    /// After a rollback or abort.
    OnError,
}

impl HookPoint {
    pub fn filename(&self) -> &'static str {
        match self {
            HookPoint::PreDeploy => "pre-deploy",
            HookPoint::PostDeploy => "post-deploy",
            HookPoint::OnError => "on-error",
        }
    }

    /// Whether failure at this hook point should abort deployment.
    pub fn is_fatal(&self) -> bool {
        matches!(self, HookPoint::PreDeploy)
    }
}

/// Context passed to hooks via `SLOTSWAP_*` environment variables.
#[derive(Debug, Clone)]
pub struct HookContext {
    pub service: ServiceName,
    pub image: ImageReference,
    pub color: Option<DeploymentColor>,
    pub previous_color: Option<DeploymentColor>,
    pub outcome: Option<&'static str>,
}

impl HookContext {
    pub fn new(service: ServiceName, image: ImageReference) -> Self {
        Self {
            service,
            image,
            color: None,
            previous_color: None,
            outcome: None,
        }
    }

    /// Fill in what the run decided.
    pub fn with_report(mut self, report: &RunReport) -> Self {
        self.color = report.target;
        self.previous_color = report.previous.as_ref().and_then(|r| r.live_color());
        self.outcome = Some(report.outcome.classification());
        self
    }

    pub fn to_env(&self) -> HashMap<String, String> {
        let mut env = HashMap::new();
        env.insert("SLOTSWAP_SERVICE".to_string(), self.service.to_string());
        env.insert("SLOTSWAP_IMAGE".to_string(), self.image.to_string());
        env.insert("SLOTSWAP_TAG".to_string(), self.image.tag().to_string());
        if let Some(color) = self.color {
            env.insert("SLOTSWAP_COLOR".to_string(), color.to_string());
        }
        if let Some(prev) = self.previous_color {
            env.insert("SLOTSWAP_PREVIOUS_COLOR".to_string(), prev.to_string());
        }
        if let Some(outcome) = self.outcome {
            env.insert("SLOTSWAP_OUTCOME".to_string(), outcome.to_string());
        }
        env
    }
}

#[derive(Debug)]
pub struct HookResult {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl HookResult {
    /// One-line failure summary for diagnostics.
    pub fn describe(&self, point: HookPoint) -> String {
        let detail = self.stderr.trim();
        match (self.exit_code, detail.is_empty()) {
            (Some(code), true) => format!("{} hook exited with {}", point.filename(), code),
            (Some(code), false) => {
                format!("{} hook exited with {}: {}", point.filename(), code, detail)
            }
            (None, _) => format!("{} hook did not complete: {}", point.filename(), detail),
        }
    }
}

/// Discovers and runs hooks from a project directory.
pub struct HookRunner {
    hooks_dir: PathBuf,
}

impl HookRunner {
    pub fn new(project_dir: &Path) -> Self {
        Self {
            hooks_dir: project_dir.join(".slotswap").join("hooks"),
        }
    }

    pub fn hook_exists(&self, point: HookPoint) -> bool {
        self.hook_path(point).is_file()
    }

    fn hook_path(&self, point: HookPoint) -> PathBuf {
        self.hooks_dir.join(point.filename())
    }

    /// Run a hook if it exists.
    ///
    /// Returns None if the hook doesn't exist, or Some(HookResult) if it was run.
    pub async fn run(&self, point: HookPoint, context: &HookContext) -> Option<HookResult> {
        let hook_path = self.hook_path(point);

        if !hook_path.is_file() {
            return None;
        }

        tracing::info!(hook = point.filename(), path = %hook_path.display(), "running hook");

        let output = Command::new(&hook_path)
            .envs(context.to_env())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        let result = match output {
            Ok(output) => HookResult {
                success: output.status.success(),
                exit_code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            },
            Err(e) => {
                tracing::error!(hook = point.filename(), "failed to execute hook: {}", e);
                HookResult {
                    success: false,
                    exit_code: None,
                    stdout: String::new(),
                    stderr: e.to_string(),
                }
            }
        };

        if result.success {
            tracing::info!(hook = point.filename(), "hook completed");
        } else {
            tracing::warn!(hook = point.filename(), exit_code = ?result.exit_code, "hook failed");
        }

        Some(result)
    }
}
