#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use edge_orchestrator::domain::clock::clock_mock::MockClock;
use edge_orchestrator::domain::health::health_monitor::HealthCheckConfig;
use edge_orchestrator::domain::health::prober::NodeProber;
use edge_orchestrator::domain::node::node::NodeSpec;
use edge_orchestrator::domain::orchestrator::{Orchestrator, OrchestratorConfig};
use edge_orchestrator::domain::resource::capacity::Capacity;
use edge_orchestrator::domain::routing::executor::{ExecutionContext, ExecutionOutcome, Executor, ExecutorRegistry};
use edge_orchestrator::domain::service::service_type::ServiceType;
use edge_orchestrator::domain::utils::id::NodeId;

/// Prober whose answers are set by the test. Nodes are healthy unless marked failing.
#[derive(Debug, Default)]
pub struct ScriptedProber {
    failing: Mutex<HashSet<NodeId>>,
    delays: Mutex<HashMap<NodeId, Duration>>,
    calls: AtomicUsize,
}

impl ScriptedProber {
    pub fn fail(&self, node_id: &NodeId) {
        self.failing.lock().unwrap().insert(node_id.clone());
    }

    pub fn heal(&self, node_id: &NodeId) {
        self.failing.lock().unwrap().remove(node_id);
    }

    /// Makes every probe of `node_id` take `delay` before answering.
    pub fn delay(&self, node_id: &NodeId, delay: Duration) {
        self.delays.lock().unwrap().insert(node_id.clone(), delay);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NodeProber for ScriptedProber {
    async fn probe(&self, node_id: &NodeId) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = self.delays.lock().unwrap().get(node_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        !self.failing.lock().unwrap().contains(node_id)
    }
}

/// Executor with a constant base processing time, scaled by the node's load factor.
#[derive(Debug, Clone)]
pub struct FixedExecutor {
    pub processing_ms: f64,
}

#[async_trait]
impl Executor for FixedExecutor {
    async fn run(&self, context: &ExecutionContext) -> ExecutionOutcome {
        ExecutionOutcome {
            processing_time_ms: self.processing_ms * context.load_factor,
            result: json!({ "node": context.node_id, "complexity": context.request.complexity }),
        }
    }
}

pub fn executors(processing_ms: f64) -> ExecutorRegistry {
    ServiceType::ALL
        .into_iter()
        .fold(ExecutorRegistry::new(), |registry, service_type| registry.with(service_type, Arc::new(FixedExecutor { processing_ms })))
}

pub struct TestCluster {
    pub orchestrator: Orchestrator,
    pub prober: Arc<ScriptedProber>,
    pub clock: MockClock,
}

pub fn cluster_with_health(health: HealthCheckConfig) -> TestCluster {
    let prober = Arc::new(ScriptedProber::default());
    let clock = MockClock::new(1_000);
    let config = OrchestratorConfig { health, ..Default::default() };
    let orchestrator = Orchestrator::new(config, executors(5.0), prober.clone(), Arc::new(clock.clone()));

    TestCluster { orchestrator, prober, clock }
}

pub fn cluster() -> TestCluster {
    cluster_with_health(HealthCheckConfig { interval: Duration::from_millis(20), probe_timeout: Duration::from_millis(50) })
}

/// Registers a node with explicit id, storage 100 and network 1000.
pub fn add_node(cluster: &TestCluster, id: &str, cpu: u64, memory: u64, latency_ms: u64) -> NodeId {
    cluster
        .orchestrator
        .register_node_with(NodeSpec::new(id, "test-site", "edge", Capacity::new(cpu, memory, 100, 1000), latency_ms))
        .unwrap()
}
