// ABOUTME: Property tests for target slot selection and plan construction.
// ABOUTME: The selected color is never the live one, and plans carry it unchanged.

use proptest::prelude::*;
use slotswap::deploy::{DeploymentPlan, select_color};
use slotswap::types::{DeploymentColor, ImageReference, RoutingState, ServiceName};

#[test]
fn selection_table() {
    let cases = [
        (RoutingState::Absent, DeploymentColor::Blue),
        (RoutingState::Live(DeploymentColor::Green), DeploymentColor::Blue),
        (RoutingState::Live(DeploymentColor::Blue), DeploymentColor::Green),
    ];
    for (current, expected) in cases {
        let (color, note) = select_color(&current);
        assert_eq!(color, expected, "current = {current}");
        assert!(note.is_none());
    }
}

fn routing_state() -> impl Strategy<Value = RoutingState> {
    prop_oneof![
        Just(RoutingState::Absent),
        Just(RoutingState::Live(DeploymentColor::Blue)),
        Just(RoutingState::Live(DeploymentColor::Green)),
        "[a-z]{1,12}"
            .prop_filter("not a color", |s| s != "blue" && s != "green")
            .prop_map(RoutingState::Unrecognized),
    ]
}

proptest! {
    #[test]
    fn never_targets_the_live_slot(current in routing_state()) {
        let (color, _) = select_color(&current);
        prop_assert_ne!(Some(color), current.live_color());
    }

    #[test]
    fn only_unrecognized_labels_carry_a_note(current in routing_state()) {
        let (_, note) = select_color(&current);
        prop_assert_eq!(note.is_some(), matches!(current, RoutingState::Unrecognized(_)));
    }

    #[test]
    fn label_round_trip_matches_selection(label in "(?i)(blue|green)") {
        let state = RoutingState::from_label(&label);
        let live = state.live_color();
        prop_assert!(live.is_some());
        let (color, _) = select_color(&state);
        prop_assert_eq!(Some(color.other()), live);
    }

    #[test]
    fn plan_keeps_selected_color_and_tag(
        current in routing_state(),
        tag in "[a-z0-9][a-z0-9.-]{0,20}",
    ) {
        let service = ServiceName::new("api").unwrap();
        let image = ImageReference::new("ghcr.io", "acme/api", tag.clone());
        let (color, _) = select_color(&current);

        let plan = DeploymentPlan::build(service, color, image).unwrap();

        prop_assert_eq!(plan.target_color(), color);
        prop_assert_eq!(plan.image().tag(), tag.as_str());
        prop_assert_eq!(plan.workload_name(), format!("api-{}", color));
    }
}
