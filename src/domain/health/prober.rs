use async_trait::async_trait;

use crate::domain::utils::id::NodeId;

/// Liveness check of a single node.
///
/// Implementations may block for as long as they like; the monitor wraps every call in its probe
/// timeout and counts a timeout as a failed probe.
#[async_trait]
pub trait NodeProber: Send + Sync {
    async fn probe(&self, node_id: &NodeId) -> bool;
}
