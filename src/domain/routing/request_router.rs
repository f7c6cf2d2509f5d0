use std::collections::BTreeSet;
use std::sync::Arc;

use crate::api::stats_dto::ExecutionResult;
use crate::domain::cluster_state::{SharedClusterState, read_state};
use crate::domain::node::node::Node;
use crate::domain::routing::executor::{ExecutionContext, ExecutorRegistry, ServiceRequest};
use crate::domain::service::service_type::ServiceType;
use crate::domain::utils::id::NodeId;
use crate::error::{Error, Result};

/// Picks the host for inbound requests and hands them to the executor of their type.
///
/// Routing only reads the cluster state. It can run alongside placement and may briefly route
/// to a node that has just failed.
#[derive(Debug, Clone)]
pub struct RequestRouter {
    state: SharedClusterState,
    executors: Arc<ExecutorRegistry>,
}

impl RequestRouter {
    pub fn new(state: SharedClusterState, executors: Arc<ExecutorRegistry>) -> Self {
        Self { state, executors }
    }

    /// Lowest-latency online node hosting a serving replica of `service_type`.
    ///
    /// Ties go to the less utilized node, then to the smaller node id.
    pub fn route(&self, service_type: ServiceType) -> Result<NodeId> {
        let state = read_state(&self.state);

        let host_ids: BTreeSet<&NodeId> = state.catalog.list_serving(service_type).flat_map(|service| service.deployed_node_ids.iter()).collect();

        host_ids
            .into_iter()
            .filter_map(|node_id| state.registry.get(node_id))
            .filter(|node| node.is_online())
            .min_by(|a, b| Self::compare_hosts(a, b))
            .map(|node| node.id.clone())
            .ok_or_else(|| Error::NoAvailableNode(service_type.to_string()))
    }

    /// Runs `request` on `node_id` through the executor registered for its type.
    ///
    /// The reported latency is the node's network latency plus the executor's processing time.
    pub async fn execute(&self, node_id: &NodeId, request: ServiceRequest) -> Result<ExecutionResult> {
        let executor = self.executors.get(request.service_type).ok_or_else(|| Error::NoExecutor(request.service_type.to_string()))?;

        let (latency_ms, load_factor) = {
            let state = read_state(&self.state);
            let node = state.registry.get(node_id).ok_or_else(|| Error::UnknownNode(node_id.clone()))?;
            (node.latency_ms, node.get_load_factor())
        };

        let context = ExecutionContext { request, node_id: node_id.clone(), load_factor };
        let outcome = executor.run(&context).await;

        log::debug!("Request for {} handled by node {} in {:.1} ms.", request.service_type, node_id, outcome.processing_time_ms);

        Ok(ExecutionResult { handled_by: node_id.clone(), total_latency_ms: latency_ms as f64 + outcome.processing_time_ms, result: outcome.result })
    }

    pub async fn handle_request(&self, request: ServiceRequest) -> Result<ExecutionResult> {
        let node_id = self.route(request.service_type)?;
        self.execute(&node_id, request).await
    }

    fn compare_hosts(a: &Node, b: &Node) -> std::cmp::Ordering {
        a.latency_ms
            .cmp(&b.latency_ms)
            .then_with(|| a.get_utilization_ratio().total_cmp(&b.get_utilization_ratio()))
            .then_with(|| a.id.cmp(&b.id))
    }
}
