// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Creates slotswap.yml template files.

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{ImageReference, ServiceName};

use super::{CONFIG_FILENAME, Config};

const DEFAULT_SERVICE: &str = "my-app";
const DEFAULT_IMAGE: &str = "registry.example.com/my-app:0.1.0";

pub fn init_config(
    dir: &Path,
    service: Option<&str>,
    image: Option<&str>,
    force: bool,
) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let service = ServiceName::new(service.unwrap_or(DEFAULT_SERVICE))
        .map_err(|e| Error::InvalidConfig(e.to_string()))?;
    let image = ImageReference::parse(image.unwrap_or(DEFAULT_IMAGE))
        .map_err(|e| Error::InvalidConfig(e.to_string()))?;

    let config = Config::template(service, image);
    std::fs::write(&config_path, generate_template_yaml(&config))?;

    Ok(())
}

fn generate_template_yaml(config: &Config) -> String {
    format!(
        r#"service: {}
image: {}
network: {}
healthcheck:
  # {{service}}, {{color}} and {{slot}} are substituted per run
  endpoint: "{}"
  attempts: {}
  interval: {}s
  expected_status: {}
rollout:
  timeout: {}s
# deadline: 30m
# destinations:
#   staging:
#     env:
#       LOG_LEVEL: debug
"#,
        config.service,
        config.image,
        config.network,
        config.healthcheck.endpoint,
        config.healthcheck.attempts,
        config.healthcheck.interval.as_secs(),
        config.healthcheck.expected_status,
        config.rollout.timeout.as_secs(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_round_trips_through_parser() {
        let service = ServiceName::new("billing").unwrap();
        let image = ImageReference::parse("ghcr.io/acme/billing:1.4.2").unwrap();
        let yaml = generate_template_yaml(&Config::template(service, image));

        let parsed = Config::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.service.as_str(), "billing");
        assert_eq!(parsed.image.tag(), "1.4.2");
        assert_eq!(parsed.healthcheck.endpoint, "http://{service}-{color}:8080/health");
    }
}
