mod common;

use std::sync::Arc;

use common::{ScriptedProber, executors};
use edge_orchestrator::domain::clock::clock_mock::MockClock;
use edge_orchestrator::domain::resource::capacity::Requirements;
use edge_orchestrator::domain::service::service::ServiceStatus;
use edge_orchestrator::domain::service::service_type::ServiceType;
use edge_orchestrator::domain::utils::id::{NodeId, ServiceId};
use edge_orchestrator::error::Error;
use edge_orchestrator::generate_orchestrator;

#[test]
fn test_sample_network_places_every_service() {
    let orchestrator = generate_orchestrator("data/edge_network.json", executors(5.0), Arc::new(ScriptedProber::default()), Arc::new(MockClock::new(0)))
        .expect("Failed to build orchestrator from sample configuration");

    let stats = orchestrator.get_network_stats();
    assert_eq!(stats.nodes.total, 6);
    assert_eq!(stats.nodes.online, 6);
    assert_eq!(stats.services.total, 4);
    assert_eq!(stats.services.running, 4);
    assert_eq!(stats.utilization_percentages, orchestrator.recompute_utilization_percentages());
    assert!(orchestrator.check_consistency().is_empty());

    let prague = orchestrator.get_node(&NodeId::new("edge-prague-1")).unwrap();
    // Too small for anything within its latency reach.
    assert!(prague.hosted_service_ids.is_empty());

    let detection = orchestrator.get_service(&ServiceId::new("svc-object-detection")).unwrap();
    assert_eq!(detection.service_type, ServiceType::Inference);
    assert_eq!(detection.requirements, Requirements::new(4, 16, 50, 20).with_network_mbps(1000));
    assert_eq!(detection.get_status(), ServiceStatus::Running);
}

#[test]
fn test_missing_file() {
    let result = generate_orchestrator("data/does_not_exist.json", executors(5.0), Arc::new(ScriptedProber::default()), Arc::new(MockClock::new(0)));
    assert!(matches!(result, Err(Error::IoError(_))));
}

#[test]
fn test_stats_serialize_as_camel_case() {
    let orchestrator = generate_orchestrator("data/edge_network.json", executors(5.0), Arc::new(ScriptedProber::default()), Arc::new(MockClock::new(0))).unwrap();

    let json = serde_json::to_value(orchestrator.get_network_stats()).unwrap();
    assert_eq!(json["nodes"]["total"], 6);
    assert!(json["utilizationPercentages"]["networkMbps"].is_number());
}
