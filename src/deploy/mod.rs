// ABOUTME: Blue/green deployment state machine using the type state pattern.
// ABOUTME: Exports the selector, planner, typestate Deployment, orchestrator and deploy lock.

mod attempt;
mod color;
mod deployment;
mod error;
mod lock;
mod orchestrator;
mod outcome;
mod plan;
mod state;
mod transitions;

pub use attempt::DeploymentAttempt;
pub use color::select_color;
pub use deployment::Deployment;
pub use error::{DeployError, DeployErrorKind, LockHolderInfo};
pub use lock::{DeployLock, LockInfo, default_state_dir};
pub use orchestrator::{DeploySettings, Orchestrator};
pub use outcome::{AbortCause, Outcome, RunReport};
pub use plan::{DeploymentPlan, InvalidPlanError};
pub use state::{
    Applied, DeployApproved, DeployState, HealthChecked, Planned, PromotionApproved, Promoted,
    RolledBack, RolledOut,
};
pub use transitions::TransitionResult;
