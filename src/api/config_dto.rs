use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::health::health_monitor::HealthCheckConfig;
use crate::domain::node::node::NodeSpec;
use crate::domain::placement::placement_scorer::ScoringWeights;
use crate::domain::resource::capacity::{Capacity, Requirements};
use crate::domain::service::service::ServiceSpec;
use crate::domain::service::service_type::ServiceType;
use crate::domain::utils::id::{NodeId, ServiceId};
use crate::error::ConversionError;

/// Root of the JSON configuration file. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorConfigDto {
    #[serde(default)]
    pub scoring: ScoringDto,
    #[serde(default)]
    pub health: HealthDto,
    #[serde(default)]
    pub simulation: SimulationDto,
    #[serde(default)]
    pub nodes: Vec<NodeDto>,
    #[serde(default)]
    pub services: Vec<ServiceDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoringDto {
    pub capacity_weight: f64,
    pub latency_weight: f64,
}

impl Default for ScoringDto {
    fn default() -> Self {
        let weights = ScoringWeights::default();
        Self { capacity_weight: weights.capacity, latency_weight: weights.latency }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HealthDto {
    pub interval_ms: u64,
    pub probe_timeout_ms: u64,
}

impl Default for HealthDto {
    fn default() -> Self {
        let config = HealthCheckConfig::default();
        Self { interval_ms: config.interval.as_millis() as u64, probe_timeout_ms: config.probe_timeout.as_millis() as u64 }
    }
}

/// Parameters of the simulated collaborators used by the binary.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulationDto {
    pub probe_failure_probability: f64,
    pub recovery_probability: f64,
}

impl Default for SimulationDto {
    fn default() -> Self {
        Self { probe_failure_probability: 0.05, recovery_probability: 0.3 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDto {
    /// Generated when missing.
    pub id: Option<String>,
    pub location: String,
    #[serde(rename = "type", default = "default_node_type")]
    pub node_type: String,
    pub capacity: Capacity,
    pub latency_ms: u64,
}

fn default_node_type() -> String {
    "edge".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDto {
    /// Generated when missing.
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub requirements: Requirements,
    pub desired_replicas: u32,
}

impl TryFrom<&ScoringDto> for ScoringWeights {
    type Error = ConversionError;

    fn try_from(dto: &ScoringDto) -> Result<Self, Self::Error> {
        ScoringWeights::new(dto.capacity_weight, dto.latency_weight)
    }
}

impl From<&HealthDto> for HealthCheckConfig {
    fn from(dto: &HealthDto) -> Self {
        HealthCheckConfig { interval: Duration::from_millis(dto.interval_ms.max(1)), probe_timeout: Duration::from_millis(dto.probe_timeout_ms) }
    }
}

impl From<NodeDto> for NodeSpec {
    fn from(dto: NodeDto) -> Self {
        let id = dto.id.map(NodeId::new).unwrap_or_else(|| NodeId::generate("node"));
        NodeSpec { id, location: dto.location, node_type: dto.node_type, capacity: dto.capacity, latency_ms: dto.latency_ms }
    }
}

impl TryFrom<ServiceDto> for ServiceSpec {
    type Error = ConversionError;

    fn try_from(dto: ServiceDto) -> Result<Self, Self::Error> {
        let service_type = ServiceType::from_str(&dto.service_type)?;

        if dto.desired_replicas == 0 {
            return Err(ConversionError::InvalidReplicaCount { name: dto.name, count: dto.desired_replicas });
        }

        let id = dto.id.map(ServiceId::new).unwrap_or_else(|| ServiceId::generate("svc"));
        Ok(ServiceSpec { id, name: dto.name, service_type, requirements: dto.requirements, desired_replicas: dto.desired_replicas })
    }
}
