// ABOUTME: HTTP health probing of a freshly rolled-out slot.
// ABOUTME: Exports the poller, its policy, and the hyper-based prober.

mod http;
mod probe;

pub use http::HttpProber;
pub use probe::{
    HealthCheckPolicy, HealthOutcome, HealthProbe, ProbeError, Prober, SuccessPredicate,
};
