// ABOUTME: Validated domain types shared by the planner, platform and CLI.
// ABOUTME: Slot colors, routing state, service names and image references.

mod color;
mod image_ref;
mod service_name;

pub use color::{DeploymentColor, ParseColorError, RoutingState};
pub use image_ref::{ImageReference, ParseImageRefError};
pub use service_name::{MAX_SERVICE_NAME_LEN, ServiceName, ServiceNameError};
