use slotmap::{SlotMap, new_key_type};
use std::collections::HashMap;

use crate::domain::node::node::{HealthStatus, Node, NodeSpec};
use crate::domain::resource::capacity::{Capacity, Requirements};
use crate::domain::utils::id::{NodeId, ServiceId};
use crate::error::{Error, Result};

new_key_type! {
    pub struct NodeKey;
}

/// Authoritative set of nodes.
///
/// The registry has no lock of its own. It lives inside `ClusterState`, which is the single
/// writer boundary for registry and catalog together.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    /// Node storage.
    nodes: SlotMap<NodeKey, Node>,

    /// Index lookup NodeKey using the external node id.
    id_index: HashMap<NodeId, NodeKey>,

    /// Fleet sums, maintained incrementally by register/reserve/release.
    total_capacity: Capacity,
    total_utilization: Capacity,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node. Utilization starts at zero and status at `Online`.
    ///
    /// # Returns
    /// The id of the node, or `Error::DuplicateId` if it is already registered.
    pub fn register(&mut self, spec: NodeSpec, now_ms: i64) -> Result<NodeId> {
        if self.id_index.contains_key(&spec.id) {
            return Err(Error::DuplicateId(spec.id.to_string()));
        }

        let node_id = spec.id.clone();
        self.total_capacity = self.total_capacity.saturating_add(&spec.capacity);

        let key = self.nodes.insert(Node::new(spec, now_ms));
        self.id_index.insert(node_id.clone(), key);

        Ok(node_id)
    }

    pub fn get(&self, node_id: &NodeId) -> Option<&Node> {
        let key = self.id_index.get(node_id)?;
        self.nodes.get(*key)
    }

    pub(crate) fn get_mut(&mut self, node_id: &NodeId) -> Option<&mut Node> {
        let key = self.id_index.get(node_id)?;
        self.nodes.get_mut(*key)
    }

    fn get_mut_or_err(&mut self, node_id: &NodeId) -> Result<&mut Node> {
        self.get_mut(node_id).ok_or_else(|| Error::UnknownNode(node_id.clone()))
    }

    pub fn contains(&self, node_id: &NodeId) -> bool {
        self.id_index.contains_key(node_id)
    }

    /// Nodes in registration order.
    pub fn list(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get_online_count(&self) -> usize {
        self.nodes.values().filter(|node| node.is_online()).count()
    }

    pub fn is_online(&self, node_id: &NodeId) -> bool {
        self.get(node_id).is_some_and(Node::is_online)
    }

    /// Capacity minus utilization, never negative.
    pub fn get_available_capacity(&self, node_id: &NodeId) -> Result<Capacity> {
        self.get(node_id).map(Node::get_available_capacity).ok_or_else(|| Error::UnknownNode(node_id.clone()))
    }

    /// Online nodes with enough free capacity and low enough latency for `requirements`.
    /// Order is not part of the contract.
    pub fn list_candidates(&self, requirements: &Requirements) -> Vec<&Node> {
        let demand = requirements.demand();

        self.nodes
            .values()
            .filter(|node| node.is_online())
            .filter(|node| node.latency_ms <= requirements.max_latency_ms)
            .filter(|node| node.get_available_capacity().covers(&demand))
            .collect()
    }

    /// Check-and-set reservation of one replica's demand on a node.
    pub fn reserve(&mut self, node_id: &NodeId, requirements: &Requirements) -> Result<()> {
        let demand = requirements.demand();
        let node = self.get_mut_or_err(node_id)?;

        let new_utilization = node.utilization.saturating_add(&demand);
        if !node.capacity.covers(&new_utilization) {
            return Err(Error::InsufficientCapacity { node: node_id.clone() });
        }

        node.utilization = new_utilization;
        self.total_utilization = self.total_utilization.saturating_add(&demand);
        Ok(())
    }

    pub fn release(&mut self, node_id: &NodeId, requirements: &Requirements) -> Result<()> {
        let demand = requirements.demand();
        let node = self.get_mut_or_err(node_id)?;

        let Some(new_utilization) = node.utilization.checked_sub(&demand) else {
            return Err(Error::InvalidRelease { node: node_id.clone() });
        };

        node.utilization = new_utilization;
        self.total_utilization = self.total_utilization.saturating_sub(&demand);
        Ok(())
    }

    pub(crate) fn attach_service(&mut self, node_id: &NodeId, service_id: &ServiceId) -> Result<()> {
        let node = self.get_mut_or_err(node_id)?;
        node.hosted_service_ids.insert(service_id.clone());
        Ok(())
    }

    /// Removes the service from the node's hosted set.
    ///
    /// # Returns
    /// True if the node hosted the service.
    pub(crate) fn detach_service(&mut self, node_id: &NodeId, service_id: &ServiceId) -> bool {
        match self.get_mut(node_id) {
            Some(node) => node.hosted_service_ids.remove(service_id),
            None => false,
        }
    }

    pub(crate) fn strand_reservation(&mut self, node_id: &NodeId, service_id: &ServiceId, requirements: Requirements) -> Result<()> {
        let node = self.get_mut_or_err(node_id)?;
        node.stranded_reservations.push((service_id.clone(), requirements));
        Ok(())
    }

    pub(crate) fn take_stranded_reservations(&mut self, node_id: &NodeId) -> Result<Vec<(ServiceId, Requirements)>> {
        let node = self.get_mut_or_err(node_id)?;
        Ok(std::mem::take(&mut node.stranded_reservations))
    }

    pub(crate) fn set_health_status(&mut self, node_id: &NodeId, status: HealthStatus) -> Result<HealthStatus> {
        let node = self.get_mut_or_err(node_id)?;
        let previous = node.health_status;
        node.health_status = status;
        Ok(previous)
    }

    /// Incrementally tracked `(capacity, utilization)` sums over all nodes.
    pub fn get_totals(&self) -> (Capacity, Capacity) {
        (self.total_capacity, self.total_utilization)
    }
}
