use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::domain::clock::clock::SystemClock;
use crate::domain::cluster_state::{ClusterState, SharedClusterState, read_state, write_state};
use crate::domain::health::prober::NodeProber;
use crate::domain::node::node::HealthStatus;
use crate::domain::scheduler::scheduler::{RelocationReport, Scheduler};
use crate::domain::utils::id::NodeId;
use crate::error::Result;

/// Health check configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheckConfig {
    pub interval: Duration,
    pub probe_timeout: Duration,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self { interval: Duration::from_secs(5), probe_timeout: Duration::from_millis(2000) }
    }
}

/// What one monitoring cycle observed and did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub probed: usize,
    /// Nodes that went from `Online` to `Unhealthy` in this tick.
    pub failed: Vec<NodeId>,
    /// Nodes that went from `Unhealthy` back to `Online` in this tick.
    pub recovered: Vec<NodeId>,
    pub relocations: Vec<RelocationReport>,
}

enum Transition {
    None,
    Failed,
    Recovered,
}

/// Periodically probes every node and reacts to status changes.
///
/// Node state machine:
/// - `Online` + failed probe: `Unhealthy`, and the node's services are relocated.
/// - `Unhealthy` + failed probe: stays `Unhealthy`, nothing else happens.
/// - `Unhealthy` + successful probe: `Online`, and its stranded capacity is released.
///
/// Relocation is edge-triggered, so a failure episode relocates exactly once.
#[derive(Clone)]
pub struct HealthMonitor {
    state: SharedClusterState,
    scheduler: Scheduler,
    prober: Arc<dyn NodeProber>,
    clock: Arc<dyn SystemClock>,
    config: HealthCheckConfig,
}

impl HealthMonitor {
    pub fn new(
        state: SharedClusterState,
        scheduler: Scheduler,
        prober: Arc<dyn NodeProber>,
        clock: Arc<dyn SystemClock>,
        config: HealthCheckConfig,
    ) -> Self {
        Self { state, scheduler, prober, clock, config }
    }

    pub fn get_config(&self) -> &HealthCheckConfig {
        &self.config
    }

    /// Starts the monitoring loop on the tokio runtime.
    pub fn spawn(self) -> HealthMonitorHandle {
        let token = CancellationToken::new();
        let loop_token = token.clone();

        let join = tokio::spawn(async move {
            self.run(loop_token).await;
        });

        HealthMonitorHandle { token, join }
    }

    async fn run(self, token: CancellationToken) {
        let mut interval = tokio::time::interval(self.config.interval);
        // Overrun ticks are dropped, not queued.
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        log::info!("Health monitor started (interval {:?}, probe timeout {:?}).", self.config.interval, self.config.probe_timeout);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = interval.tick() => {
                    let report = self.tick().await;
                    if !report.failed.is_empty() || !report.recovered.is_empty() {
                        log::info!("Health tick: {} probed, {} failed, {} recovered.", report.probed, report.failed.len(), report.recovered.len());
                    }
                }
            }
        }

        log::info!("Health monitor stopped.");
    }

    /// Runs one monitoring cycle.
    ///
    /// Probes run concurrently and without holding the state lock. Their results are then
    /// applied under a single write guard. Every status change of the batch is recorded before
    /// any relocation runs, so replicas never move onto a node that failed in the same tick.
    pub async fn tick(&self) -> TickReport {
        let targets: Vec<NodeId> = {
            let state = read_state(&self.state);
            state.registry.list().filter(|node| node.health_status != HealthStatus::Offline).map(|node| node.id.clone()).collect()
        };

        let probes = targets.into_iter().map(|node_id| async move {
            let healthy = self.probe_with_timeout(&node_id).await;
            (node_id, healthy)
        });
        let results = futures::future::join_all(probes).await;

        let mut report = TickReport { probed: results.len(), ..Default::default() };
        let now = self.clock.get_current_time_in_ms();

        let mut state = write_state(&self.state);
        for (node_id, healthy) in results {
            match Self::apply_probe_result(&mut state, &node_id, healthy, now) {
                Transition::None => {}
                Transition::Failed => {
                    log::warn!("Node {} failed its health probe and is now unhealthy.", node_id);
                    report.failed.push(node_id);
                }
                Transition::Recovered => {
                    log::info!("Node {} recovered and is back online.", node_id);
                    report.recovered.push(node_id);
                }
            }
        }

        // Recovered capacity is released first so relocations can use it.
        for node_id in &report.recovered {
            if let Err(e) = self.scheduler.reclaim(&mut state, node_id) {
                log::error!("Reclaiming capacity on node {} failed: {}", node_id, e);
            }
        }

        for node_id in &report.failed {
            match self.scheduler.relocate(&mut state, node_id) {
                Ok(relocation) => report.relocations.push(relocation),
                Err(e) => log::error!("Relocation away from node {} failed: {}", node_id, e),
            }
        }

        report
    }

    async fn probe_with_timeout(&self, node_id: &NodeId) -> bool {
        match tokio::time::timeout(self.config.probe_timeout, self.prober.probe(node_id)).await {
            Ok(healthy) => healthy,
            Err(_) => {
                log::warn!("Probe of node {} timed out after {:?}.", node_id, self.config.probe_timeout);
                false
            }
        }
    }

    /// Updates status, heartbeat and failure count of one node.
    fn apply_probe_result(state: &mut ClusterState, node_id: &NodeId, healthy: bool, now: i64) -> Transition {
        let Some(node) = state.registry.get_mut(node_id) else {
            return Transition::None;
        };

        match (node.health_status, healthy) {
            // Decommissioned while the probe was in flight.
            (HealthStatus::Offline, _) => Transition::None,
            (HealthStatus::Online, true) => {
                node.last_heartbeat = now;
                node.consecutive_failures = 0;
                Transition::None
            }
            (HealthStatus::Online, false) => {
                node.health_status = HealthStatus::Unhealthy;
                node.consecutive_failures = 1;
                Transition::Failed
            }
            (HealthStatus::Unhealthy, false) => {
                node.consecutive_failures += 1;
                log::debug!("Node {} still unhealthy ({} consecutive failures).", node_id, node.consecutive_failures);
                Transition::None
            }
            (HealthStatus::Unhealthy, true) => {
                node.health_status = HealthStatus::Online;
                node.last_heartbeat = now;
                node.consecutive_failures = 0;
                Transition::Recovered
            }
        }
    }

    /// Takes a node out of service for good.
    ///
    /// The node becomes `Offline` and is no longer probed. Its services are relocated and all
    /// capacity held on it is released.
    pub fn decommission(&self, node_id: &NodeId) -> Result<RelocationReport> {
        let mut state = write_state(&self.state);

        let previous = state.registry.set_health_status(node_id, HealthStatus::Offline)?;
        if previous == HealthStatus::Offline {
            log::debug!("Node {} is already offline.", node_id);
            return Ok(RelocationReport { node_id: Some(node_id.clone()), ..Default::default() });
        }

        log::warn!("Node {} decommissioned (was {:?}).", node_id, previous);
        let report = self.scheduler.relocate(&mut state, node_id)?;
        self.scheduler.reclaim(&mut state, node_id)?;

        Ok(report)
    }
}

impl fmt::Debug for HealthMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthMonitor").field("config", &self.config).field("clock", &self.clock).finish_non_exhaustive()
    }
}

/// Stop handle of a spawned monitoring loop.
#[derive(Debug)]
pub struct HealthMonitorHandle {
    token: CancellationToken,
    join: JoinHandle<()>,
}

impl HealthMonitorHandle {
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Signals the loop to stop and waits for it. A tick that is already running completes first.
    pub async fn shutdown(self) {
        self.token.cancel();
        if let Err(e) = self.join.await {
            log::error!("Health monitor task ended abnormally: {}", e);
        }
    }
}
