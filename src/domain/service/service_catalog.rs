use slotmap::{SlotMap, new_key_type};
use std::collections::HashMap;

use crate::domain::service::service::{Service, ServiceSpec, ServiceStatus};
use crate::domain::service::service_type::ServiceType;
use crate::domain::utils::id::{NodeId, ServiceId};
use crate::error::{Error, Result};

new_key_type! {
    pub struct ServiceKey;
}

/// Desired-state records of all deployed services.
#[derive(Debug, Default)]
pub struct ServiceCatalog {
    /// Service storage.
    slots: SlotMap<ServiceKey, Service>,

    /// Index lookup ServiceKey using the external service id.
    id_index: HashMap<ServiceId, ServiceKey>,
}

impl ServiceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a service with an empty assignment.
    ///
    /// # Returns
    /// The service id, `Error::DuplicateId` if it already exists, or `Error::InvalidReplicaCount`
    /// if fewer than one replica is requested.
    pub fn define(&mut self, spec: ServiceSpec) -> Result<ServiceId> {
        if spec.desired_replicas == 0 {
            return Err(Error::InvalidReplicaCount(spec.desired_replicas));
        }
        if self.id_index.contains_key(&spec.id) {
            return Err(Error::DuplicateId(spec.id.to_string()));
        }

        let service_id = spec.id.clone();
        let key = self.slots.insert(Service::new(spec));
        self.id_index.insert(service_id.clone(), key);

        Ok(service_id)
    }

    pub fn get(&self, service_id: &ServiceId) -> Option<&Service> {
        let key = self.id_index.get(service_id)?;
        self.slots.get(*key)
    }

    fn get_mut(&mut self, service_id: &ServiceId) -> Option<&mut Service> {
        let key = self.id_index.get(service_id)?;
        self.slots.get_mut(*key)
    }

    /// Services in definition order.
    pub fn list(&self) -> impl Iterator<Item = &Service> {
        self.slots.values()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get_running_count(&self) -> usize {
        self.slots.values().filter(|service| service.get_status() == ServiceStatus::Running).count()
    }

    /// Services with fewer assigned replicas than desired, in definition order.
    pub fn get_under_replicated(&self) -> Vec<ServiceId> {
        self.slots.values().filter(|service| service.is_under_replicated()).map(|service| service.id.clone()).collect()
    }

    /// Services of the given type that currently have at least one replica.
    pub fn list_serving(&self, service_type: ServiceType) -> impl Iterator<Item = &Service> {
        self.slots
            .values()
            .filter(move |service| service.service_type == service_type)
            .filter(|service| matches!(service.get_status(), ServiceStatus::Running | ServiceStatus::Degraded))
    }

    pub fn update_deployed_nodes(&mut self, service_id: &ServiceId, node_ids: Vec<NodeId>) -> Result<()> {
        let service = self.get_mut(service_id).ok_or_else(|| Error::UnknownService(service_id.clone()))?;
        debug_assert!(node_ids.len() <= service.desired_replicas as usize);

        service.deployed_node_ids = node_ids;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::resource::capacity::Requirements;

    fn spec(id: &str, replicas: u32) -> ServiceSpec {
        ServiceSpec::new(id, "svc", ServiceType::Analytics, Requirements::new(1, 1, 1, 100), replicas)
    }

    #[test]
    fn test_define_rejects_duplicates_and_zero_replicas() {
        let mut catalog = ServiceCatalog::new();
        catalog.define(spec("s1", 1)).unwrap();

        assert!(matches!(catalog.define(spec("s1", 1)), Err(Error::DuplicateId(_))));
        assert!(matches!(catalog.define(spec("s2", 0)), Err(Error::InvalidReplicaCount(0))));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_update_changes_derived_status() {
        let mut catalog = ServiceCatalog::new();
        let id = catalog.define(spec("s1", 2)).unwrap();
        assert_eq!(catalog.get_under_replicated(), vec![id.clone()]);

        catalog.update_deployed_nodes(&id, vec![NodeId::new("a"), NodeId::new("b")]).unwrap();
        assert_eq!(catalog.get(&id).unwrap().get_status(), ServiceStatus::Running);
        assert_eq!(catalog.get_running_count(), 1);
        assert!(catalog.get_under_replicated().is_empty());
    }

    #[test]
    fn test_list_serving_skips_pending() {
        let mut catalog = ServiceCatalog::new();
        let pending = catalog.define(spec("pending", 1)).unwrap();
        let serving = catalog.define(spec("serving", 3)).unwrap();
        catalog.update_deployed_nodes(&serving, vec![NodeId::new("a")]).unwrap();

        let ids: Vec<_> = catalog.list_serving(ServiceType::Analytics).map(|s| s.id.clone()).collect();
        assert_eq!(ids, vec![serving]);
        assert!(!ids.contains(&pending));
        assert_eq!(catalog.list_serving(ServiceType::Inference).count(), 0);
    }

    #[test]
    fn test_update_unknown_service() {
        let mut catalog = ServiceCatalog::new();
        assert!(matches!(catalog.update_deployed_nodes(&ServiceId::new("x"), vec![]), Err(Error::UnknownService(_))));
    }
}
