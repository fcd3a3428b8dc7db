// ABOUTME: Immutable image reference produced by the artifact pipeline.
// ABOUTME: Parses registry/name:tag and requires an explicit tag for every release.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseImageRefError {
    #[error("image reference cannot be empty")]
    Empty,

    #[error("invalid character in image reference: {0}")]
    InvalidChar(char),

    #[error("image reference {0:?} has no registry (expected registry/name:tag)")]
    MissingRegistry(String),

    #[error("image reference {0:?} has no tag; releases must be pinned to a version tag")]
    MissingTag(String),

    #[error("digest references are not supported: {0}")]
    Digest(String),
}

/// A pushed, immutable image: `{registry}/{name}:{tag}`.
///
/// The tag is supplied by the artifact pipeline (version plus short commit hash)
/// and treated as opaque for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageReference {
    registry: String,
    name: String,
    tag: String,
}

impl ImageReference {
    /// Assemble a reference from its parts without validation.
    ///
    /// Empty parts are rejected later when a deployment plan is built.
    pub fn new(
        registry: impl Into<String>,
        name: impl Into<String>,
        tag: impl Into<String>,
    ) -> Self {
        Self {
            registry: registry.into(),
            name: name.into(),
            tag: tag.into(),
        }
    }

    pub fn parse(input: &str) -> Result<Self, ParseImageRefError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseImageRefError::Empty);
        }

        if let Some(c) = input.chars().find(|c| {
            !c.is_ascii_alphanumeric() && !matches!(c, '/' | ':' | '.' | '-' | '_' | '@')
        }) {
            return Err(ParseImageRefError::InvalidChar(c));
        }

        if input.contains('@') {
            return Err(ParseImageRefError::Digest(input.to_string()));
        }

        // A colon after the last slash separates the tag; earlier colons belong to a registry port.
        let last_slash = input.rfind('/').unwrap_or(0);
        let (repository, tag) = match input.rfind(':') {
            Some(colon) if colon > last_slash => (&input[..colon], &input[colon + 1..]),
            _ => return Err(ParseImageRefError::MissingTag(input.to_string())),
        };
        if tag.is_empty() {
            return Err(ParseImageRefError::MissingTag(input.to_string()));
        }

        let (registry, name) = match repository.split_once('/') {
            Some((first, rest))
                if first.contains('.') || first.contains(':') || first == "localhost" =>
            {
                (first, rest)
            }
            _ => return Err(ParseImageRefError::MissingRegistry(input.to_string())),
        };

        Ok(Self::new(registry, name, tag))
    }

    pub fn registry(&self) -> &str {
        &self.registry
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Same repository, different release tag.
    pub fn with_tag(&self, tag: impl Into<String>) -> Self {
        Self {
            registry: self.registry.clone(),
            name: self.name.clone(),
            tag: tag.into(),
        }
    }
}

impl FromStr for ImageReference {
    type Err = ParseImageRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.registry, self.name, self.tag)
    }
}
