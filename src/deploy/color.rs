// ABOUTME: Target slot selection from the current routing state.
// ABOUTME: Unprovisioned services always bootstrap into blue.

use crate::types::{DeploymentColor, RoutingState};

/// Pick the slot the next release is deployed into.
///
/// Returns the color and, when the routing state could not be interpreted,
/// a note explaining why blue was chosen anyway.
///
/// | current        | target |
/// |----------------|--------|
/// | absent         | blue   |
/// | green          | blue   |
/// | blue           | green  |
/// | unrecognized   | blue   |
pub fn select_color(current: &RoutingState) -> (DeploymentColor, Option<&'static str>) {
    match current {
        RoutingState::Live(DeploymentColor::Blue) => (DeploymentColor::Green, None),
        RoutingState::Live(DeploymentColor::Green) | RoutingState::Absent => {
            (DeploymentColor::Blue, None)
        }
        RoutingState::Unrecognized(_) => (
            DeploymentColor::Blue,
            Some("live slot label is neither blue nor green; defaulting to blue"),
        ),
    }
}
