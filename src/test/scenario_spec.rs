use crate::error::SimError;
use crate::fabric::{FlowSim, SimPhase};
use crate::net::{EcmpMode, FlowId};
use crate::sim::ScenarioSpec;

use super::assert_close;

#[test]
fn scenario_parses_minimal_json_with_defaults() {
    let raw = r#"
    {
        "topology": { "num_leaves": 2, "num_spines": 1, "ports_per_leaf": 2 },
        "method": "pfabric"
    }
    "#;
    let spec: ScenarioSpec = serde_json::from_str(raw).expect("parse scenario");
    assert_eq!(spec.topology.num_leaves, 2);
    assert!(spec.topology.port_capacity.is_none());
    assert!(spec.ecmp.is_none());
    assert!(!spec.record_rates);
    assert!(spec.flows.is_empty());
}

#[test]
fn scenario_parses_ecmp_mode_and_optional_flow_fields() {
    let raw = r#"
    {
        "topology": { "num_leaves": 4, "num_spines": 2, "ports_per_leaf": 2, "port_capacity": 50.0 },
        "method": "maxmin",
        "ecmp": { "kind": "mixed", "salt": 9 },
        "flows": [
            { "id": 3, "src": 0, "dst": 3, "size_bytes": 10, "arrival": 0.5 },
            { "id": 4, "src": 1, "dst": 2, "size_bytes": 20, "arrival": 0.0, "weight": 2.0, "ecmp_hash": 17 }
        ]
    }
    "#;
    let spec: ScenarioSpec = serde_json::from_str(raw).expect("parse scenario");
    assert_eq!(spec.ecmp, Some(EcmpMode::Mixed { salt: 9 }));
    assert_eq!(spec.topology.port_capacity, Some(50.0));
    assert_eq!(spec.flows.len(), 2);
    assert_eq!(spec.flows[0].weight, None);
    assert_eq!(spec.flows[0].ecmp_hash, None);
    assert_eq!(spec.flows[1].weight, Some(2.0));
    assert_eq!(spec.flows[1].ecmp_hash, Some(17));
}

#[test]
fn scenario_drives_the_simulation_end_to_end() {
    let raw = r#"
    {
        "topology": { "num_leaves": 2, "num_spines": 1, "ports_per_leaf": 2, "port_capacity": 100.0 },
        "method": "pfabric",
        "record_rates": true,
        "flows": [
            { "id": 1, "src": 0, "dst": 1, "size_bytes": 1000, "arrival": 0.0 },
            { "id": 2, "src": 0, "dst": 1, "size_bytes": 3000, "arrival": 0.0 }
        ]
    }
    "#;
    let spec: ScenarioSpec = serde_json::from_str(raw).expect("parse scenario");
    let mut sim = FlowSim::from_scenario(&spec).expect("build");
    assert_eq!(sim.phase(), SimPhase::Idle);
    assert_eq!(sim.config().port_capacity, 100.0);
    assert!(sim.rate_trace().is_some());

    let report = sim.run_simulation().expect("run");
    assert_close(
        report.summary(FlowId(1)).expect("flow 1").completion_time,
        5.0,
    );
    assert_close(
        report.summary(FlowId(2)).expect("flow 2").completion_time,
        20.0,
    );
}

#[test]
fn scenario_errors_surface_from_the_boundary_calls() {
    let raw = r#"
    {
        "topology": { "num_leaves": 2, "num_spines": 1, "ports_per_leaf": 1 },
        "method": "pfabric",
        "flows": [
            { "id": 1, "src": 0, "dst": 1, "size_bytes": 10, "arrival": 0.0 },
            { "id": 1, "src": 1, "dst": 0, "size_bytes": 10, "arrival": 0.0 }
        ]
    }
    "#;
    let spec: ScenarioSpec = serde_json::from_str(raw).expect("parse scenario");
    assert_eq!(
        FlowSim::from_scenario(&spec).err(),
        Some(SimError::DuplicateFlow(FlowId(1)))
    );

    let mut bad_method = spec.clone();
    bad_method.method = "drr".into();
    bad_method.flows.clear();
    assert!(matches!(
        FlowSim::from_scenario(&bad_method),
        Err(SimError::UnsupportedMethod(_))
    ));
}

#[test]
fn scenario_with_overflowing_port_count_is_a_configuration_error() {
    let raw = format!(
        r#"{{ "topology": {{ "num_leaves": {}, "num_spines": 1, "ports_per_leaf": 2 }}, "method": "pfabric" }}"#,
        usize::MAX
    );
    let spec: ScenarioSpec = serde_json::from_str(&raw).expect("parse scenario");
    assert!(matches!(
        FlowSim::from_scenario(&spec),
        Err(SimError::Configuration(_))
    ));

    let mut sim = FlowSim::default();
    assert!(matches!(
        sim.configure_topology(usize::MAX, "pfabric", usize::MAX, 2, 1),
        Err(SimError::Configuration(_))
    ));
    assert_eq!(sim.phase(), SimPhase::Unconfigured);
}
