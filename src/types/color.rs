// ABOUTME: Deployment slot colors and the live routing pointer.
// ABOUTME: RoutingState is read from the platform and only ever written at promotion.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One of the two parallel deployment slots of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentColor {
    Blue,
    Green,
}

impl DeploymentColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentColor::Blue => "blue",
            DeploymentColor::Green => "green",
        }
    }

    /// The opposite slot.
    pub fn other(self) -> Self {
        match self {
            DeploymentColor::Blue => DeploymentColor::Green,
            DeploymentColor::Green => DeploymentColor::Blue,
        }
    }
}

impl fmt::Display for DeploymentColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown deployment color: {0:?} (expected blue or green)")]
pub struct ParseColorError(pub String);

impl FromStr for DeploymentColor {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blue" => Ok(DeploymentColor::Blue),
            "green" => Ok(DeploymentColor::Green),
            _ => Err(ParseColorError(s.to_string())),
        }
    }
}

/// Which slot currently receives live traffic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "color")]
pub enum RoutingState {
    /// The service has never been promoted.
    Absent,
    /// Traffic is routed to this slot.
    Live(DeploymentColor),
    /// The platform reports a live slot whose label is neither blue nor green.
    Unrecognized(String),
}

impl RoutingState {
    /// Interpret a raw slot label read from the platform.
    pub fn from_label(label: &str) -> Self {
        match label.parse() {
            Ok(color) => RoutingState::Live(color),
            Err(_) => RoutingState::Unrecognized(label.to_string()),
        }
    }

    pub fn live_color(&self) -> Option<DeploymentColor> {
        match self {
            RoutingState::Live(color) => Some(*color),
            _ => None,
        }
    }
}

impl fmt::Display for RoutingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingState::Absent => f.write_str("absent"),
            RoutingState::Live(color) => write!(f, "{}", color),
            RoutingState::Unrecognized(raw) => write!(f, "unrecognized ({:?})", raw),
        }
    }
}
