use thiserror::Error;

use crate::domain::utils::id::{NodeId, ServiceId};

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse orchestrator configuration JSON: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Failed to convert configuration into the domain model: {0}")]
    Conversion(#[from] ConversionError),

    #[error("Id {0} is already registered")]
    DuplicateId(String),

    #[error("Node {node} has insufficient capacity for the requested reservation")]
    InsufficientCapacity { node: NodeId },

    #[error("Releasing the requested amount on node {node} would drive its utilization below zero")]
    InvalidRelease { node: NodeId },

    #[error("Service {service} needs {needed} more replica(s) but only {available} qualifying node(s) exist")]
    InsufficientNodes { service: ServiceId, needed: usize, available: usize },

    #[error("No healthy node hosts a service of type {0}")]
    NoAvailableNode(String),

    #[error("No executor is registered for service type {0}")]
    NoExecutor(String),

    #[error("Node {0} is unknown")]
    UnknownNode(NodeId),

    #[error("Service {0} is unknown")]
    UnknownService(ServiceId),

    #[error("A service needs at least one replica, got {0}")]
    InvalidReplicaCount(u32),
}

#[derive(Debug, Error, PartialEq)]
pub enum ConversionError {
    #[error("Unknown service type: {0}")]
    UnknownServiceType(String),

    #[error("Invalid desired replica count {count} for service {name}")]
    InvalidReplicaCount { name: String, count: u32 },

    #[error("Scoring weights must be non-negative and not both zero")]
    InvalidScoringWeights,

    #[error("Probability {0} is outside of [0, 1]")]
    InvalidProbability(f64),
}

pub type Result<T> = std::result::Result<T, Error>;
