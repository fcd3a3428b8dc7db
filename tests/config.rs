// ABOUTME: Tests for configuration parsing, discovery and destination merging.
// ABOUTME: Uses temp-env for env var interpolation and tempfile for discovery.

use slotswap::config::{CONFIG_FILENAME_DIR, Config, EnvValue, resolve_env_map};
use slotswap::error::Error;
use slotswap::platform::RuntimeType;
use std::fs;
use std::time::Duration;

const MINIMAL: &str = r#"
service: api
image: ghcr.io/acme/api:1.0.0
"#;

const FULL: &str = r#"
service: api
image: ghcr.io/acme/api:1.0.0
env:
  LOG_LEVEL: info
  DATABASE_URL:
    env: API_DATABASE_URL
  REGION:
    env: API_REGION
    default: eu-west-1
labels:
  team: payments
command: ["/app/api", "--serve"]
healthcheck:
  endpoint: "http://{slot}:9000/ready"
  attempts: 6
  interval: 2s
  expected_status: 204
rollout:
  timeout: 90s
runtime:
  runtime: podman
  socket: /run/user/1000/podman/podman.sock
network: edge
stop:
  timeout: 20s
deadline: 30m
destinations:
  staging:
    image: ghcr.io/acme/api-staging:1.0.0
    env:
      LOG_LEVEL: debug
    labels:
      env: staging
    healthcheck:
      attempts: 2
"#;

#[test]
fn minimal_config_uses_defaults() {
    let config = Config::from_yaml(MINIMAL).unwrap();

    assert_eq!(config.service.as_str(), "api");
    assert_eq!(config.image.tag(), "1.0.0");
    assert_eq!(config.network, "slotswap");
    assert_eq!(config.healthcheck.attempts, 12);
    assert_eq!(config.healthcheck.interval, Duration::from_secs(5));
    assert_eq!(config.rollout.timeout, Duration::from_secs(300));
    assert_eq!(config.stop.timeout, Duration::from_secs(10));
    assert!(config.deadline.is_none());
    assert!(config.runtime.runtime.is_none());
}

#[test]
fn full_config_parses() {
    let config = Config::from_yaml(FULL).unwrap();

    assert_eq!(config.healthcheck.endpoint, "http://{slot}:9000/ready");
    assert_eq!(config.healthcheck.expected_status, 204);
    assert_eq!(config.rollout.timeout, Duration::from_secs(90));
    assert_eq!(config.runtime.runtime, Some(RuntimeType::Podman));
    assert_eq!(config.network, "edge");
    assert_eq!(config.deadline, Some(Duration::from_secs(1800)));
    assert_eq!(
        config.command,
        Some(vec!["/app/api".to_string(), "--serve".to_string()])
    );
    assert_eq!(
        config.env.get("DATABASE_URL"),
        Some(&EnvValue::FromEnv {
            var: "API_DATABASE_URL".to_string(),
            default: None,
        })
    );
}

#[test]
fn untagged_image_is_rejected() {
    let err = Config::from_yaml("service: api\nimage: ghcr.io/acme/api\n").unwrap_err();
    assert!(err.to_string().contains("no tag"), "{err}");
}

#[test]
fn invalid_service_name_is_rejected() {
    assert!(Config::from_yaml("service: Api\nimage: ghcr.io/acme/api:1\n").is_err());
}

#[test]
fn zero_attempts_is_rejected() {
    let yaml = format!("{MINIMAL}healthcheck:\n  attempts: 0\n");
    assert!(matches!(
        Config::from_yaml(&yaml),
        Err(Error::InvalidConfig(_))
    ));
}

#[test]
fn destination_overrides_image_env_labels_and_healthcheck() {
    let config = Config::from_yaml(FULL).unwrap();
    let staging = config.for_destination("staging").unwrap();

    assert_eq!(staging.image.name(), "acme/api-staging");
    assert_eq!(
        staging.env.get("LOG_LEVEL"),
        Some(&EnvValue::Literal("debug".to_string()))
    );
    assert!(staging.env.contains_key("DATABASE_URL"));
    assert_eq!(staging.labels.get("team").map(String::as_str), Some("payments"));
    assert_eq!(staging.labels.get("env").map(String::as_str), Some("staging"));
    assert_eq!(staging.healthcheck.attempts, 2);
    // Replaced wholesale, so unspecified fields fall back to defaults.
    assert_eq!(staging.healthcheck.expected_status, 200);
}

#[test]
fn unknown_destination_is_an_error() {
    let config = Config::from_yaml(MINIMAL).unwrap();
    assert!(matches!(
        config.for_destination("prod"),
        Err(Error::UnknownDestination(name)) if name == "prod"
    ));
}

#[test]
fn tag_override_keeps_repository() {
    let config = Config::from_yaml(MINIMAL).unwrap().with_tag("1.1.0-d00d1e5").unwrap();
    assert_eq!(config.image.to_string(), "ghcr.io/acme/api:1.1.0-d00d1e5");

    let err = Config::from_yaml(MINIMAL).unwrap().with_tag(" ");
    assert!(err.is_err());
}

#[test]
fn env_values_resolve_from_process_env() {
    let config = Config::from_yaml(FULL).unwrap();

    temp_env::with_vars(
        [
            ("API_DATABASE_URL", Some("postgres://db/api")),
            ("API_REGION", None),
        ],
        || {
            let env = resolve_env_map(&config.env).unwrap();
            assert_eq!(env["DATABASE_URL"], "postgres://db/api");
            assert_eq!(env["REGION"], "eu-west-1");
            assert_eq!(env["LOG_LEVEL"], "info");
        },
    );
}

#[test]
fn missing_env_var_without_default_fails() {
    let config = Config::from_yaml(FULL).unwrap();

    temp_env::with_var_unset("API_DATABASE_URL", || {
        assert!(matches!(
            resolve_env_map(&config.env),
            Err(Error::MissingEnvVar(var)) if var == "API_DATABASE_URL"
        ));
    });
}

#[test]
fn discover_checks_alternate_locations() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        Config::discover(dir.path()),
        Err(Error::ConfigNotFound(_))
    ));

    let nested = dir.path().join(CONFIG_FILENAME_DIR);
    fs::create_dir_all(nested.parent().unwrap()).unwrap();
    fs::write(&nested, MINIMAL).unwrap();

    let config = Config::discover(dir.path()).unwrap();
    assert_eq!(config.service.as_str(), "api");
}
