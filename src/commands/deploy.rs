// ABOUTME: Deploy command implementation.
// ABOUTME: Handles locking, hooks, approval wiring and the blue/green run.

use super::platform_connection::connect_platform;
use slotswap::approval::{ApprovalChannel, AutoApprove, TerminalApproval, interrupt_pair};
use slotswap::config::Config;
use slotswap::deploy::{DeployLock, DeploySettings, Orchestrator, Outcome, default_state_dir};
use slotswap::diagnostics::{Diagnostics, Warning};
use slotswap::error::{Error, Result};
use slotswap::health::HttpProber;
use slotswap::hooks::{HookContext, HookPoint, HookRunner};
use slotswap::output::Output;
use slotswap::types::ImageReference;
use std::env;

/// Per-invocation flags for `slotswap deploy`.
#[derive(Debug, Default)]
pub struct DeployOptions {
    pub image: Option<String>,
    pub tag: Option<String>,
    pub yes: bool,
    pub force: bool,
}

pub async fn deploy(config: Config, options: DeployOptions, mut output: Output) -> Result<()> {
    let config = match (&options.image, &options.tag) {
        (Some(image), _) => config.with_image(ImageReference::parse(image)?),
        (None, Some(tag)) => config.with_tag(tag)?,
        (None, None) => config,
    };

    output.start_timer();
    let cwd = env::current_dir()?;
    let hook_runner = HookRunner::new(&cwd);
    let mut diag = Diagnostics::default();

    output.progress(&format!("Deploying {} ({})", config.service, config.image));

    output.progress("  → Acquiring deploy lock...");
    let lock = DeployLock::acquire(&default_state_dir(), &config.service, options.force)?;

    let hook_context = HookContext::new(config.service.clone(), config.image.clone());
    if let Some(result) = hook_runner.run(HookPoint::PreDeploy, &hook_context).await
        && !result.success
    {
        if !result.stderr.is_empty() {
            eprintln!("{}", result.stderr);
        }
        return Err(Error::Hook(result.describe(HookPoint::PreDeploy)));
    }

    let platform = connect_platform(&config, &output).await?;

    let approvals: Box<dyn ApprovalChannel> = if options.yes {
        Box::new(AutoApprove)
    } else {
        Box::new(TerminalApproval::stdin())
    };

    let (handle, interrupt) = interrupt_pair();
    handle.trigger_on_ctrl_c();
    if let Some(deadline) = config.deadline {
        handle.trigger_after(deadline);
    }

    let settings = DeploySettings {
        health: config.healthcheck.clone(),
        rollout_timeout: config.rollout.timeout,
    };
    let prober = HttpProber::new(config.healthcheck.request_timeout);
    let orchestrator =
        Orchestrator::new(platform, approvals, prober, settings).with_interrupt(interrupt);

    let report = orchestrator.run(&config.service, &config.image).await;
    output.outcome(&report);

    if let Outcome::RolledBack {
        color,
        rollback_error: Some(err),
        ..
    } = &report.outcome
    {
        diag.warn(Warning::rollback(format!(
            "{} was not removed and needs manual cleanup: {}",
            config.service.slot_name(*color),
            err
        )));
    }

    let point = if report.outcome.is_success() {
        HookPoint::PostDeploy
    } else {
        HookPoint::OnError
    };
    let hook_context = hook_context.with_report(&report);
    if let Some(result) = hook_runner.run(point, &hook_context).await
        && !result.success
    {
        diag.warn(Warning::hook(result.describe(point)));
    }

    if let Err(e) = lock.release() {
        diag.warn(Warning::lock_release(e.to_string()));
    }

    for warning in diag.warnings() {
        output.warning(&warning.message);
    }

    match report.outcome {
        Outcome::Promoted { .. } => Ok(()),
        Outcome::RolledBack { .. } => Err(Error::RolledBack(report.outcome.reason())),
        Outcome::Aborted { .. } => Err(Error::Aborted(report.outcome.reason())),
    }
}
