use serde::Serialize;
use std::collections::BTreeSet;

use crate::domain::resource::capacity::{Capacity, Requirements, ratio};
use crate::domain::utils::id::{NodeId, ServiceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HealthStatus {
    Online,
    Unhealthy,
    /// Taken out of service by an operator. Never probed again.
    Offline,
}

/// Everything needed to register a node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSpec {
    pub id: NodeId,
    pub location: String,
    pub node_type: String,
    pub capacity: Capacity,
    pub latency_ms: u64,
}

impl NodeSpec {
    pub fn new(id: impl Into<NodeId>, location: impl Into<String>, node_type: impl Into<String>, capacity: Capacity, latency_ms: u64) -> Self {
        Self { id: id.into(), location: location.into(), node_type: node_type.into(), capacity, latency_ms }
    }
}

/// An edge location with finite capacity and a fixed latency to the coordinator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub location: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub capacity: Capacity,
    pub utilization: Capacity,
    pub latency_ms: u64,
    pub health_status: HealthStatus,
    /// Milliseconds since the epoch of the last successful probe.
    pub last_heartbeat: i64,
    pub hosted_service_ids: BTreeSet<ServiceId>,
    pub consecutive_failures: u32,

    /// Reservations of replicas that were detached while the node was down. Released when the
    /// node comes back.
    pub stranded_reservations: Vec<(ServiceId, Requirements)>,
}

impl Node {
    pub fn new(spec: NodeSpec, registered_at: i64) -> Self {
        Node {
            id: spec.id,
            location: spec.location,
            node_type: spec.node_type,
            capacity: spec.capacity,
            utilization: Capacity::zero(),
            latency_ms: spec.latency_ms,
            health_status: HealthStatus::Online,
            last_heartbeat: registered_at,
            hosted_service_ids: BTreeSet::new(),
            consecutive_failures: 0,
            stranded_reservations: Vec::new(),
        }
    }

    pub fn is_online(&self) -> bool {
        self.health_status == HealthStatus::Online
    }

    pub fn hosts(&self, service_id: &ServiceId) -> bool {
        self.hosted_service_ids.contains(service_id)
    }

    /// Capacity minus utilization, never negative.
    pub fn get_available_capacity(&self) -> Capacity {
        self.capacity.saturating_sub(&self.utilization)
    }

    /// Mean utilization fraction over cpu, memory and storage.
    pub fn get_utilization_ratio(&self) -> f64 {
        (ratio(self.utilization.cpu, self.capacity.cpu)
            + ratio(self.utilization.memory, self.capacity.memory)
            + ratio(self.utilization.storage, self.capacity.storage))
            / 3.0
    }

    /// `utilization.cpu / capacity.cpu + 1`, used as a queueing-delay multiplier.
    pub fn get_load_factor(&self) -> f64 {
        ratio(self.utilization.cpu, self.capacity.cpu) + 1.0
    }

    pub fn get_stranded_total(&self) -> Capacity {
        self.stranded_reservations.iter().fold(Capacity::zero(), |acc, (_, requirements)| acc.saturating_add(&requirements.demand()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node() -> Node {
        Node::new(NodeSpec::new("n1", "Berlin", "edge", Capacity::new(4, 8, 100, 1000), 10), 0)
    }

    #[test]
    fn test_new_node_is_online_and_empty() {
        let node = node();
        assert!(node.is_online());
        assert_eq!(node.utilization, Capacity::zero());
        assert_eq!(node.get_available_capacity(), node.capacity);
        assert!(node.hosted_service_ids.is_empty());
    }

    #[test]
    fn test_load_factor_and_ratio() {
        let mut node = node();
        node.utilization = Capacity::new(2, 4, 50, 0);
        assert_eq!(node.get_load_factor(), 1.5);
        assert!((node.get_utilization_ratio() - 0.5).abs() < 1e-9);
    }
}
