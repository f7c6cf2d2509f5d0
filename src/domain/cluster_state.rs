use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::api::stats_dto::{NetworkStats, NodeCounts, ServiceCounts, UtilizationPercentages};
use crate::domain::node::node_registry::NodeRegistry;
use crate::domain::resource::capacity::Capacity;
use crate::domain::service::service_catalog::ServiceCatalog;

/// Cluster state shared by the façade, the request router and the health monitor.
pub type SharedClusterState = Arc<RwLock<ClusterState>>;

pub fn read_state(state: &RwLock<ClusterState>) -> RwLockReadGuard<'_, ClusterState> {
    state.read().expect("cluster state lock poisoned")
}

pub fn write_state(state: &RwLock<ClusterState>) -> RwLockWriteGuard<'_, ClusterState> {
    state.write().expect("cluster state lock poisoned")
}

/// Node registry and service catalog behind one writer.
///
/// Placement reads candidates, scores them and reserves capacity in one sequence, so both
/// halves must be mutated under the same guard.
#[derive(Debug, Default)]
pub struct ClusterState {
    pub registry: NodeRegistry,
    pub catalog: ServiceCatalog,
}

impl ClusterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_shared(self) -> SharedClusterState {
        Arc::new(RwLock::new(self))
    }

    pub fn get_network_stats(&self) -> NetworkStats {
        let (total_capacity, total_utilization) = self.registry.get_totals();

        NetworkStats {
            nodes: NodeCounts { total: self.registry.len(), online: self.registry.get_online_count() },
            services: ServiceCounts { total: self.catalog.len(), running: self.catalog.get_running_count() },
            utilization_percentages: UtilizationPercentages::from_totals(&total_capacity, &total_utilization),
        }
    }

    /// Fleet utilization rebuilt from assignments and stranded reservations, ignoring the
    /// incrementally tracked totals.
    pub fn recompute_utilization(&self) -> Capacity {
        let mut total = Capacity::zero();

        for node in self.registry.list() {
            for service_id in &node.hosted_service_ids {
                if let Some(service) = self.catalog.get(service_id) {
                    total = total.saturating_add(&service.requirements.demand());
                }
            }
            total = total.saturating_add(&node.get_stranded_total());
        }

        total
    }

    pub fn recompute_utilization_percentages(&self) -> UtilizationPercentages {
        let (total_capacity, _) = self.registry.get_totals();
        UtilizationPercentages::from_totals(&total_capacity, &self.recompute_utilization())
    }

    /// Checks the cross-references between registry and catalog.
    ///
    /// # Returns
    /// One message per violated invariant; empty if the state is consistent.
    pub fn check_consistency(&self) -> Vec<String> {
        let mut violations = Vec::new();

        for node in self.registry.list() {
            if !node.capacity.covers(&node.utilization) {
                violations.push(format!("node {} utilization {:?} exceeds capacity {:?}", node.id, node.utilization, node.capacity));
            }
            for service_id in &node.hosted_service_ids {
                let referenced = self.catalog.get(service_id).is_some_and(|service| service.is_deployed_on(&node.id));
                if !referenced {
                    violations.push(format!("node {} lists service {} which does not reference it", node.id, service_id));
                }
            }
        }

        for service in self.catalog.list() {
            if service.deployed_node_ids.len() > service.desired_replicas as usize {
                violations.push(format!("service {} has {} replicas but wants {}", service.id, service.deployed_node_ids.len(), service.desired_replicas));
            }
            for node_id in &service.deployed_node_ids {
                let hosted = self.registry.get(node_id).is_some_and(|node| node.hosts(&service.id));
                if !hosted {
                    violations.push(format!("service {} references node {} which does not host it", service.id, node_id));
                }
            }
        }

        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::node::node::{HealthStatus, NodeSpec};
    use crate::domain::resource::capacity::Requirements;
    use crate::domain::scheduler::scheduler::Scheduler;
    use crate::domain::service::service::ServiceSpec;
    use crate::domain::service::service_type::ServiceType;
    use crate::domain::utils::id::NodeId;

    #[test]
    fn test_writes_through_shared_state_are_visible_to_readers() {
        let shared = ClusterState::new().into_shared();
        let reader = shared.clone();

        write_state(&shared).registry.register(NodeSpec::new("n1", "Graz", "edge", Capacity::new(4, 4, 10, 100), 10), 0).unwrap();

        let state = read_state(&reader);
        assert_eq!(state.get_network_stats().nodes.online, 1);
        assert_eq!(state.registry.get(&NodeId::new("n1")).unwrap().health_status, HealthStatus::Online);
    }

    #[test]
    fn test_consistency_and_recomputation_after_placement() {
        let mut state = ClusterState::new();
        state.registry.register(NodeSpec::new("n1", "Graz", "edge", Capacity::new(4, 4, 10, 100), 10), 0).unwrap();
        state.registry.register(NodeSpec::new("n2", "Linz", "edge", Capacity::new(4, 4, 10, 100), 20), 0).unwrap();
        let service = state.catalog.define(ServiceSpec::new("s1", "stats", ServiceType::Analytics, Requirements::new(2, 1, 0, 100), 2)).unwrap();
        Scheduler::default().place(&mut state, &service).unwrap();

        assert!(state.check_consistency().is_empty());
        assert_eq!(state.recompute_utilization(), Capacity::new(4, 2, 0, 0));
        assert_eq!(state.recompute_utilization_percentages(), state.get_network_stats().utilization_percentages);
    }
}
