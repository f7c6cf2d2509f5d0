use serde::Serialize;
use serde_json::Value;

use crate::domain::resource::capacity::{Capacity, ratio};
use crate::domain::utils::id::NodeId;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStats {
    pub nodes: NodeCounts,
    pub services: ServiceCounts,
    pub utilization_percentages: UtilizationPercentages,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeCounts {
    pub total: usize,
    pub online: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServiceCounts {
    pub total: usize,
    pub running: usize,
}

/// Fleet-wide utilization per resource, in percent (0 to 100).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UtilizationPercentages {
    pub cpu: f64,
    pub memory: f64,
    pub storage: f64,
    pub network_mbps: f64,
}

impl UtilizationPercentages {
    pub fn from_totals(capacity: &Capacity, utilization: &Capacity) -> Self {
        Self {
            cpu: ratio(utilization.cpu, capacity.cpu) * 100.0,
            memory: ratio(utilization.memory, capacity.memory) * 100.0,
            storage: ratio(utilization.storage, capacity.storage) * 100.0,
            network_mbps: ratio(utilization.network_mbps, capacity.network_mbps) * 100.0,
        }
    }
}

/// Outcome of a handled request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub handled_by: NodeId,
    pub total_latency_ms: f64,
    pub result: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentages_from_totals() {
        let pct = UtilizationPercentages::from_totals(&Capacity::new(8, 16, 0, 1000), &Capacity::new(2, 4, 0, 250));
        assert_eq!(pct, UtilizationPercentages { cpu: 25.0, memory: 25.0, storage: 0.0, network_mbps: 25.0 });
    }

    #[test]
    fn test_stats_serialize_camel_case() {
        let stats = NetworkStats {
            nodes: NodeCounts { total: 2, online: 1 },
            services: ServiceCounts { total: 1, running: 1 },
            utilization_percentages: UtilizationPercentages::from_totals(&Capacity::zero(), &Capacity::zero()),
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["nodes"]["online"], 1);
        assert_eq!(json["utilizationPercentages"]["networkMbps"], 0.0);
    }
}
