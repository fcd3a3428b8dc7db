// ABOUTME: Tests for validated domain types.
// ABOUTME: Covers service names, image references, colors and routing labels.

use slotswap::types::{
    DeploymentColor, ImageReference, MAX_SERVICE_NAME_LEN, ParseImageRefError, RoutingState,
    ServiceName, ServiceNameError,
};

#[test]
fn service_name_accepts_dns_labels() {
    for name in ["api", "billing-worker", "svc2"] {
        assert!(ServiceName::new(name).is_ok(), "{name}");
    }
}

#[test]
fn service_name_rejects_invalid_labels() {
    assert!(matches!(ServiceName::new(""), Err(ServiceNameError::Empty)));
    assert!(matches!(
        ServiceName::new("-api"),
        Err(ServiceNameError::StartsWithHyphen)
    ));
    assert!(matches!(
        ServiceName::new("api-"),
        Err(ServiceNameError::EndsWithHyphen)
    ));
    assert!(matches!(
        ServiceName::new("Api"),
        Err(ServiceNameError::NotLowercase)
    ));
    assert!(matches!(
        ServiceName::new("api_v2"),
        Err(ServiceNameError::InvalidChar('_'))
    ));
}

#[test]
fn longest_service_name_still_yields_valid_slot_name() {
    let name = "a".repeat(MAX_SERVICE_NAME_LEN);
    let service = ServiceName::new(&name).unwrap();
    assert_eq!(service.slot_name(DeploymentColor::Green).len(), 63);

    let too_long = "a".repeat(MAX_SERVICE_NAME_LEN + 1);
    assert!(matches!(
        ServiceName::new(&too_long),
        Err(ServiceNameError::TooLong)
    ));
}

#[test]
fn image_reference_splits_registry_name_and_tag() {
    let image = ImageReference::parse("registry.example.com:5000/team/api:1.2.0-abc1234").unwrap();
    assert_eq!(image.registry(), "registry.example.com:5000");
    assert_eq!(image.name(), "team/api");
    assert_eq!(image.tag(), "1.2.0-abc1234");
    assert_eq!(
        image.to_string(),
        "registry.example.com:5000/team/api:1.2.0-abc1234"
    );
}

#[test]
fn localhost_counts_as_registry() {
    let image = ImageReference::parse("localhost/api:dev").unwrap();
    assert_eq!(image.registry(), "localhost");
}

#[test]
fn image_reference_requires_tag() {
    assert!(matches!(
        ImageReference::parse("ghcr.io/acme/api"),
        Err(ParseImageRefError::MissingTag(_))
    ));
    assert!(matches!(
        ImageReference::parse("ghcr.io/acme/api:"),
        Err(ParseImageRefError::MissingTag(_))
    ));
}

#[test]
fn image_reference_requires_registry() {
    assert!(matches!(
        ImageReference::parse("acme/api:1.0"),
        Err(ParseImageRefError::MissingRegistry(_))
    ));
    assert!(matches!(
        ImageReference::parse("api:1.0"),
        Err(ParseImageRefError::MissingRegistry(_))
    ));
}

#[test]
fn image_reference_rejects_digests_and_junk() {
    assert!(matches!(
        ImageReference::parse("ghcr.io/acme/api@sha256:abc"),
        Err(ParseImageRefError::Digest(_))
    ));
    assert_eq!(
        ImageReference::parse("ghcr.io/acme api:1"),
        Err(ParseImageRefError::InvalidChar(' '))
    );
    assert_eq!(ImageReference::parse("  "), Err(ParseImageRefError::Empty));
}

#[test]
fn with_tag_keeps_repository() {
    let image = ImageReference::parse("ghcr.io/acme/api:1.0.0").unwrap();
    let next = image.with_tag("1.1.0");
    assert_eq!(next.to_string(), "ghcr.io/acme/api:1.1.0");
    assert_eq!(image.tag(), "1.0.0");
}

#[test]
fn colors_parse_case_insensitively_and_flip() {
    assert_eq!("BLUE".parse::<DeploymentColor>().unwrap(), DeploymentColor::Blue);
    assert_eq!("Green".parse::<DeploymentColor>().unwrap(), DeploymentColor::Green);
    assert!("red".parse::<DeploymentColor>().is_err());
    assert_eq!(DeploymentColor::Blue.other(), DeploymentColor::Green);
    assert_eq!(DeploymentColor::Green.other(), DeploymentColor::Blue);
}

#[test]
fn routing_labels() {
    assert_eq!(
        RoutingState::from_label("green"),
        RoutingState::Live(DeploymentColor::Green)
    );
    assert_eq!(
        RoutingState::from_label("purple"),
        RoutingState::Unrecognized("purple".to_string())
    );
    assert_eq!(RoutingState::Absent.live_color(), None);
}

#[test]
fn routing_state_serializes_with_color() {
    let json = serde_json::to_value(RoutingState::Live(DeploymentColor::Blue)).unwrap();
    assert_eq!(json, serde_json::json!({"state": "live", "color": "blue"}));
}
