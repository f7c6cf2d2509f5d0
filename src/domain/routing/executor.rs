use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::domain::service::service_type::ServiceType;
use crate::domain::utils::id::NodeId;

/// An inbound request for a service type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub service_type: ServiceType,
    /// Relative cost of the request, as reported by the load source.
    pub complexity: f64,
}

impl ServiceRequest {
    pub fn new(service_type: ServiceType, complexity: f64) -> Self {
        Self { service_type, complexity }
    }
}

/// What an executor is handed: the request plus the state of the node it runs on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContext {
    pub request: ServiceRequest,
    pub node_id: NodeId,
    /// `utilization.cpu / capacity.cpu + 1` of the executing node.
    pub load_factor: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionOutcome {
    pub processing_time_ms: f64,
    pub result: Value,
}

/// Domain logic of one service type. Supplied by the caller, never implemented here.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn run(&self, context: &ExecutionContext) -> ExecutionOutcome;
}

/// Executors keyed by the service type they serve.
#[derive(Clone, Default)]
pub struct ExecutorRegistry {
    executors: HashMap<ServiceType, Arc<dyn Executor>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `executor` for `service_type`, replacing any previous one.
    pub fn register(&mut self, service_type: ServiceType, executor: Arc<dyn Executor>) -> &mut Self {
        if self.executors.insert(service_type, executor).is_some() {
            log::warn!("Executor for service type {} was replaced.", service_type);
        }
        self
    }

    pub fn with(mut self, service_type: ServiceType, executor: Arc<dyn Executor>) -> Self {
        self.register(service_type, executor);
        self
    }

    pub fn get(&self, service_type: ServiceType) -> Option<Arc<dyn Executor>> {
        self.executors.get(&service_type).cloned()
    }

    pub fn len(&self) -> usize {
        self.executors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }
}

impl fmt::Debug for ExecutorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<_> = self.executors.keys().collect();
        types.sort();
        f.debug_struct("ExecutorRegistry").field("service_types", &types).finish()
    }
}
