use serde::Serialize;

use crate::domain::resource::capacity::Requirements;
use crate::domain::service::service_type::ServiceType;
use crate::domain::utils::id::{NodeId, ServiceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ServiceStatus {
    /// No replica assigned.
    Pending,
    /// All desired replicas assigned.
    Running,
    /// Some, but not all, replicas assigned.
    Degraded,
}

/// Everything needed to define a service.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSpec {
    pub id: ServiceId,
    pub name: String,
    pub service_type: ServiceType,
    pub requirements: Requirements,
    pub desired_replicas: u32,
}

impl ServiceSpec {
    pub fn new(id: impl Into<ServiceId>, name: impl Into<String>, service_type: ServiceType, requirements: Requirements, desired_replicas: u32) -> Self {
        Self { id: id.into(), name: name.into(), service_type, requirements, desired_replicas }
    }
}

/// Desired state of one service plus the nodes currently carrying its replicas.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    pub requirements: Requirements,
    pub desired_replicas: u32,
    pub deployed_node_ids: Vec<NodeId>,
}

impl Service {
    pub fn new(spec: ServiceSpec) -> Self {
        Service {
            id: spec.id,
            name: spec.name,
            service_type: spec.service_type,
            requirements: spec.requirements,
            desired_replicas: spec.desired_replicas,
            deployed_node_ids: Vec::new(),
        }
    }

    /// Derived from the assignment; never stored.
    pub fn get_status(&self) -> ServiceStatus {
        let assigned = self.deployed_node_ids.len();

        if assigned == 0 {
            ServiceStatus::Pending
        } else if assigned >= self.desired_replicas as usize {
            ServiceStatus::Running
        } else {
            ServiceStatus::Degraded
        }
    }

    pub fn is_deployed_on(&self, node_id: &NodeId) -> bool {
        self.deployed_node_ids.contains(node_id)
    }

    pub fn is_under_replicated(&self) -> bool {
        self.deployed_node_ids.len() < self.desired_replicas as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_is_derived_from_assignment() {
        let mut service = Service::new(ServiceSpec::new("s1", "resizer", ServiceType::ContentOptimization, Requirements::new(1, 1, 1, 100), 2));
        assert_eq!(service.get_status(), ServiceStatus::Pending);

        service.deployed_node_ids.push(NodeId::new("n1"));
        assert_eq!(service.get_status(), ServiceStatus::Degraded);

        service.deployed_node_ids.push(NodeId::new("n2"));
        assert_eq!(service.get_status(), ServiceStatus::Running);
        assert!(!service.is_under_replicated());
    }
}
