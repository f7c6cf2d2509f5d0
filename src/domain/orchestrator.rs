use std::sync::Arc;

use crate::api::config_dto::OrchestratorConfigDto;
use crate::api::stats_dto::{ExecutionResult, NetworkStats, UtilizationPercentages};
use crate::domain::clock::clock::SystemClock;
use crate::domain::cluster_state::{ClusterState, SharedClusterState, read_state, write_state};
use crate::domain::health::health_monitor::{HealthCheckConfig, HealthMonitor, HealthMonitorHandle};
use crate::domain::health::prober::NodeProber;
use crate::domain::node::node::{Node, NodeSpec};
use crate::domain::placement::placement_scorer::{PlacementScorer, ScoringWeights};
use crate::domain::resource::capacity::{Capacity, Requirements};
use crate::domain::routing::executor::{ExecutorRegistry, ServiceRequest};
use crate::domain::routing::request_router::RequestRouter;
use crate::domain::scheduler::scheduler::{RelocationReport, Scheduler};
use crate::domain::service::service::{Service, ServiceSpec};
use crate::domain::service::service_type::ServiceType;
use crate::domain::utils::id::{NodeId, ServiceId};
use crate::error::{ConversionError, Error, Result};

/// Tunables of the orchestrator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrchestratorConfig {
    pub scoring: ScoringWeights,
    pub health: HealthCheckConfig,
}

impl TryFrom<&OrchestratorConfigDto> for OrchestratorConfig {
    type Error = ConversionError;

    fn try_from(dto: &OrchestratorConfigDto) -> std::result::Result<Self, Self::Error> {
        Ok(Self { scoring: ScoringWeights::try_from(&dto.scoring)?, health: HealthCheckConfig::from(&dto.health) })
    }
}

/// Entry point of the edge network: node registration, service deployment, request handling
/// and health monitoring over one shared cluster state.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    state: SharedClusterState,
    scheduler: Scheduler,
    router: RequestRouter,
    health_monitor: HealthMonitor,
    clock: Arc<dyn SystemClock>,
}

impl Orchestrator {
    pub fn new(config: OrchestratorConfig, executors: ExecutorRegistry, prober: Arc<dyn NodeProber>, clock: Arc<dyn SystemClock>) -> Self {
        let state = ClusterState::new().into_shared();
        let scheduler = Scheduler::new(PlacementScorer::new(config.scoring));
        let router = RequestRouter::new(state.clone(), Arc::new(executors));
        let health_monitor = HealthMonitor::new(state.clone(), scheduler.clone(), prober, clock.clone(), config.health);

        Self { state, scheduler, router, health_monitor, clock }
    }

    /// Builds an orchestrator and seeds it with the nodes and services of a configuration file.
    ///
    /// Services that cannot be placed yet stay defined as `Pending` and do not fail the build.
    pub fn from_dto(dto: OrchestratorConfigDto, executors: ExecutorRegistry, prober: Arc<dyn NodeProber>, clock: Arc<dyn SystemClock>) -> Result<Self> {
        let config = OrchestratorConfig::try_from(&dto)?;
        let orchestrator = Self::new(config, executors, prober, clock);

        for node_dto in dto.nodes {
            orchestrator.register_node_with(NodeSpec::from(node_dto))?;
        }

        for service_dto in dto.services {
            let spec = ServiceSpec::try_from(service_dto)?;
            match orchestrator.deploy_service_with(spec) {
                Ok(_) => {}
                Err(e @ Error::InsufficientNodes { .. }) => log::warn!("{}", e),
                Err(e) => return Err(e),
            }
        }

        log::info!("Orchestrator seeded: {:?}", orchestrator.get_network_stats());
        Ok(orchestrator)
    }

    /// Registers a node under a freshly generated id.
    pub fn register_node(&self, location: impl Into<String>, node_type: impl Into<String>, capacity: Capacity, latency_ms: u64) -> Result<NodeId> {
        self.register_node_with(NodeSpec::new(NodeId::generate("node"), location, node_type, capacity, latency_ms))
    }

    pub fn register_node_with(&self, spec: NodeSpec) -> Result<NodeId> {
        let now = self.clock.get_current_time_in_ms();
        let mut state = write_state(&self.state);

        let node_id = state.registry.register(spec, now)?;
        log::info!("Registered node {}.", node_id);

        // A new node may be what a pending service was waiting for.
        for service_id in state.catalog.get_under_replicated() {
            if let Err(e) = self.scheduler.place(&mut state, &service_id) {
                log::debug!("Service {} still under-replicated: {}", service_id, e);
            }
        }

        Ok(node_id)
    }

    /// Defines a service under a freshly generated id and places its replicas.
    ///
    /// # Returns
    /// The service id, or `Error::InsufficientNodes` if not all replicas fit. In that case the
    /// service stays defined as `Pending` and the error names it.
    pub fn deploy_service(&self, name: impl Into<String>, service_type: ServiceType, requirements: Requirements, desired_replicas: u32) -> Result<ServiceId> {
        self.deploy_service_with(ServiceSpec::new(ServiceId::generate("svc"), name, service_type, requirements, desired_replicas))
    }

    pub fn deploy_service_with(&self, spec: ServiceSpec) -> Result<ServiceId> {
        let mut state = write_state(&self.state);

        let service_id = state.catalog.define(spec)?;
        let nodes = self.scheduler.place(&mut state, &service_id)?;

        log::info!("Deployed service {} on {} node(s).", service_id, nodes.len());
        Ok(service_id)
    }

    pub async fn handle_request(&self, service_type: ServiceType, complexity: f64) -> Result<ExecutionResult> {
        self.router.handle_request(ServiceRequest::new(service_type, complexity)).await
    }

    pub fn get_network_stats(&self) -> NetworkStats {
        read_state(&self.state).get_network_stats()
    }

    /// Utilization percentages rebuilt from the current assignments.
    pub fn recompute_utilization_percentages(&self) -> UtilizationPercentages {
        read_state(&self.state).recompute_utilization_percentages()
    }

    pub fn get_node(&self, node_id: &NodeId) -> Option<Node> {
        read_state(&self.state).registry.get(node_id).cloned()
    }

    pub fn get_service(&self, service_id: &ServiceId) -> Option<Service> {
        read_state(&self.state).catalog.get(service_id).cloned()
    }

    pub fn list_nodes(&self) -> Vec<Node> {
        read_state(&self.state).registry.list().cloned().collect()
    }

    pub fn list_services(&self) -> Vec<Service> {
        read_state(&self.state).catalog.list().cloned().collect()
    }

    /// Runs placement again for one service.
    pub fn reconcile_service(&self, service_id: &ServiceId) -> Result<Vec<NodeId>> {
        let mut state = write_state(&self.state);
        self.scheduler.place(&mut state, service_id)
    }

    pub fn check_consistency(&self) -> Vec<String> {
        read_state(&self.state).check_consistency()
    }

    pub fn router(&self) -> &RequestRouter {
        &self.router
    }

    pub fn health_monitor(&self) -> &HealthMonitor {
        &self.health_monitor
    }

    pub fn start_health_monitor(&self) -> HealthMonitorHandle {
        self.health_monitor.clone().spawn()
    }

    pub fn decommission(&self, node_id: &NodeId) -> Result<RelocationReport> {
        self.health_monitor.decommission(node_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::clock_mock::MockClock;
    use crate::domain::service::service::ServiceStatus;
    use async_trait::async_trait;

    struct AlwaysUp;

    #[async_trait]
    impl NodeProber for AlwaysUp {
        async fn probe(&self, _node_id: &NodeId) -> bool {
            true
        }
    }

    fn orchestrator() -> Orchestrator {
        Orchestrator::new(OrchestratorConfig::default(), ExecutorRegistry::new(), Arc::new(AlwaysUp), Arc::new(MockClock::new(1_000)))
    }

    #[test]
    fn test_register_node_generates_id_and_heartbeat() {
        let orchestrator = orchestrator();
        let id = orchestrator.register_node("Madrid", "edge", Capacity::new(4, 8, 100, 1000), 15).unwrap();

        assert!(id.as_str().starts_with("node-"));
        let node = orchestrator.get_node(&id).unwrap();
        assert_eq!(node.last_heartbeat, 1_000);
        assert_eq!(node.location, "Madrid");
    }

    #[test]
    fn test_failed_deploy_keeps_pending_service() {
        let orchestrator = orchestrator();
        orchestrator.register_node("Madrid", "edge", Capacity::new(4, 8, 100, 1000), 15).unwrap();

        let result = orchestrator.deploy_service("encoder", ServiceType::Transcoding, Requirements::new(1, 1, 1, 100), 2);
        let Err(Error::InsufficientNodes { service, needed, available }) = result else {
            panic!("expected InsufficientNodes");
        };

        assert_eq!((needed, available), (2, 1));
        assert_eq!(orchestrator.get_service(&service).unwrap().get_status(), ServiceStatus::Pending);
        assert_eq!(orchestrator.get_network_stats().services.total, 1);
    }

    #[test]
    fn test_new_node_completes_pending_service() {
        let orchestrator = orchestrator();
        orchestrator.register_node("Madrid", "edge", Capacity::new(4, 8, 100, 1000), 15).unwrap();

        let Err(Error::InsufficientNodes { service, .. }) = orchestrator.deploy_service("encoder", ServiceType::Transcoding, Requirements::new(1, 1, 1, 100), 2) else {
            panic!("expected InsufficientNodes");
        };

        orchestrator.register_node("Porto", "edge", Capacity::new(4, 8, 100, 1000), 25).unwrap();

        assert_eq!(orchestrator.get_service(&service).unwrap().get_status(), ServiceStatus::Running);
        assert!(orchestrator.check_consistency().is_empty());
    }

    #[test]
    fn test_from_dto_applies_health_config_and_seeds_services() {
        let dto: OrchestratorConfigDto = crate::loader::parser::parse_json_str(
            r#"{
                "health": { "intervalMs": 100, "probeTimeoutMs": 40 },
                "nodes": [ { "id": "n1", "location": "Graz", "capacity": { "cpu": 4, "memory": 4, "storage": 10, "networkMbps": 100 }, "latencyMs": 10 } ],
                "services": [
                    { "id": "s1", "name": "stats", "type": "analytics", "requirements": { "cpu": 1, "memory": 1, "storage": 0, "maxLatencyMs": 50 }, "desiredReplicas": 1 },
                    { "id": "s2", "name": "encoder", "type": "transcoding", "requirements": { "cpu": 1, "memory": 1, "storage": 0, "maxLatencyMs": 50 }, "desiredReplicas": 2 }
                ]
            }"#,
        )
        .unwrap();

        let orchestrator = Orchestrator::from_dto(dto, ExecutorRegistry::new(), Arc::new(AlwaysUp), Arc::new(MockClock::new(0))).unwrap();

        let config = orchestrator.health_monitor().get_config();
        assert_eq!(config.interval, std::time::Duration::from_millis(100));
        assert_eq!(config.probe_timeout, std::time::Duration::from_millis(40));

        let statuses: Vec<(String, ServiceStatus)> = orchestrator.list_services().into_iter().map(|s| (s.id.to_string(), s.get_status())).collect();
        assert_eq!(statuses, vec![("s1".to_string(), ServiceStatus::Running), ("s2".to_string(), ServiceStatus::Pending)]);
    }

    #[test]
    fn test_config_conversion_rejects_bad_weights() {
        let mut dto = OrchestratorConfigDto::default();
        dto.scoring.capacity_weight = -1.0;
        assert_eq!(OrchestratorConfig::try_from(&dto), Err(ConversionError::InvalidScoringWeights));
    }
}
