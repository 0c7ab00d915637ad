//! Replays the scenario files shipped with the CLI.

use std::path::PathBuf;

use printdest_cli::{Scenario, simulate};
use printdest_core::{DestinationId, StoreEvent};

fn scenario_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("scenarios")
        .join(name)
}

fn event_names(report: &printdest_cli::SimulationReport) -> Vec<&'static str> {
    report.events().map(StoreEvent::event_name).collect()
}

#[tokio::test]
async fn direct_select_scenario() {
    let scenario = Scenario::load(&scenario_path("direct-select.json")).unwrap();
    let report = simulate::run(scenario, None).await.unwrap();

    assert_eq!(
        event_names(&report),
        vec![
            "destination:capabilities_resolved",
            "destination:selected",
            "destination:capabilities_resolved",
            "destination:capabilities_failed",
        ]
    );
    let selected = report.selected.as_ref().unwrap();
    assert_eq!(selected.id(), &DestinationId::new("FooDevice"));
    assert!(!selected.has_capabilities());
    assert_eq!(report.fetch_calls, 3);
    assert_eq!(report.setup_calls, 0);
}

#[tokio::test]
async fn managed_setup_scenario() {
    let scenario = Scenario::load(&scenario_path("managed-setup.json")).unwrap();
    let report = simulate::run(scenario, None).await.unwrap();

    assert_eq!(
        event_names(&report),
        vec!["destination:setup_failed", "destination:setup_failed"]
    );
    assert!(report.selected.is_none());
    assert_eq!(report.setup_calls, 2);
    assert_eq!(report.fetch_calls, 0);

    let rendered = report.render();
    assert!(rendered.contains("policy: gated"));
    assert!(rendered.contains("> configure 001122DEADBEEF: not selected"));
}

#[tokio::test]
async fn policy_override_applies_to_managed_scenario() {
    let scenario = Scenario::load(&scenario_path("managed-setup.json")).unwrap();
    let report = simulate::run(scenario, Some(printdest_core::SelectionPolicy::Direct))
        .await
        .unwrap();

    // Activation no longer needs setup; explicit configure still does.
    assert_eq!(report.setup_calls, 1);
    assert_eq!(report.fetch_calls, 1);
    assert_eq!(
        report.selected.as_ref().map(|d| d.id().as_str()),
        Some("00112233DEADBEEF")
    );
}
