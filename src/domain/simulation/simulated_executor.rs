use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use crate::domain::routing::executor::{ExecutionContext, ExecutionOutcome, Executor, ExecutorRegistry};
use crate::domain::service::service_type::ServiceType;

/// Stand-in for a real service backend. Processing time grows linearly with request complexity
/// and with the load factor of the executing node.
#[derive(Debug, Clone)]
pub struct SimulatedExecutor {
    service_type: ServiceType,
    base_processing_ms: f64,
}

impl SimulatedExecutor {
    pub fn new(service_type: ServiceType, base_processing_ms: f64) -> Self {
        Self { service_type, base_processing_ms }
    }

    /// Per-type base cost in milliseconds for a request of complexity 1 on an idle node.
    pub fn default_base_processing_ms(service_type: ServiceType) -> f64 {
        match service_type {
            ServiceType::ContentOptimization => 20.0,
            ServiceType::Analytics => 35.0,
            ServiceType::Inference => 80.0,
            ServiceType::Transcoding => 120.0,
        }
    }

    /// Registry with one simulated executor for every service type.
    pub fn registry() -> ExecutorRegistry {
        ServiceType::ALL.into_iter().fold(ExecutorRegistry::new(), |registry, service_type| {
            registry.with(service_type, Arc::new(SimulatedExecutor::new(service_type, Self::default_base_processing_ms(service_type))))
        })
    }
}

#[async_trait]
impl Executor for SimulatedExecutor {
    async fn run(&self, context: &ExecutionContext) -> ExecutionOutcome {
        let processing_time_ms = self.base_processing_ms * context.request.complexity.max(0.0) * context.load_factor;

        ExecutionOutcome {
            processing_time_ms,
            result: json!({
                "serviceType": self.service_type,
                "node": context.node_id,
                "complexity": context.request.complexity,
                "status": "completed",
            }),
        }
    }
}
