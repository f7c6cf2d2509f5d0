use crate::domain::cluster_state::ClusterState;
use crate::domain::node::node::Node;
use crate::domain::placement::placement_scorer::{PlacementScore, PlacementScorer};
use crate::domain::resource::capacity::Requirements;
use crate::domain::utils::id::{NodeId, ServiceId};
use crate::error::{Error, Result};
use crate::logger::ANALYTICS_TARGET;

/// What a relocation achieved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelocationReport {
    pub node_id: Option<NodeId>,

    /// Services moved off the failed node that are fully replicated again.
    pub restored: Vec<ServiceId>,

    /// Services moved off the failed node that stay short of replicas.
    pub degraded: Vec<ServiceId>,

    /// Other under-replicated services that could be completed during this pass.
    pub backfilled: Vec<ServiceId>,
}

/// Drives placement and relocation against a `ClusterState`.
///
/// All methods take `&mut ClusterState`, so callers must hold the state's write guard for the
/// whole call.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    scorer: PlacementScorer,
}

impl Scheduler {
    pub fn new(scorer: PlacementScorer) -> Self {
        Self { scorer }
    }

    /// Brings the service up to its desired replica count.
    ///
    /// Hosts that are no longer online are dropped from the assignment first. Either all missing
    /// replicas are placed or none are.
    ///
    /// # Returns
    /// The full assignment, or `Error::InsufficientNodes` if too few qualifying nodes exist.
    pub fn place(&self, state: &mut ClusterState, service_id: &ServiceId) -> Result<Vec<NodeId>> {
        let (requirements, desired, current) = {
            let service = state.catalog.get(service_id).ok_or_else(|| Error::UnknownService(service_id.clone()))?;
            (service.requirements, service.desired_replicas as usize, service.deployed_node_ids.clone())
        };

        let (healthy, unhealthy): (Vec<NodeId>, Vec<NodeId>) = current.into_iter().partition(|node_id| state.registry.is_online(node_id));

        if !unhealthy.is_empty() {
            for node_id in &unhealthy {
                self.detach_replica(state, service_id, node_id, &requirements)?;
            }
            state.catalog.update_deployed_nodes(service_id, healthy.clone())?;
            log::info!("Dropped {} unhealthy host(s) from service {}.", unhealthy.len(), service_id);
        }

        let needed = desired.saturating_sub(healthy.len());
        if needed == 0 {
            return Ok(healthy);
        }

        let chosen: Vec<PlacementScore> = {
            let candidates: Vec<&Node> = state
                .registry
                .list_candidates(&requirements)
                .into_iter()
                .filter(|node| !node.hosts(service_id) && !healthy.contains(&node.id))
                .collect();

            if candidates.len() < needed {
                log::warn!(
                    "Service {} needs {} more replica(s) but only {} qualifying node(s) exist. Leaving it unchanged.",
                    service_id,
                    needed,
                    candidates.len()
                );
                return Err(Error::InsufficientNodes { service: service_id.clone(), needed, available: candidates.len() });
            }

            self.scorer.rank(&candidates, &requirements).into_iter().take(needed).collect()
        };

        let mut assigned = healthy;
        let mut reserved: Vec<NodeId> = Vec::with_capacity(chosen.len());

        for pick in &chosen {
            if let Err(e) = state.registry.reserve(&pick.node_id, &requirements) {
                log::error!("Reservation of service {} on node {} failed: {}. Rolling back.", service_id, pick.node_id, e);
                self.roll_back(state, service_id, &reserved, &requirements);
                return Err(e);
            }
            state.registry.attach_service(&pick.node_id, service_id)?;
            reserved.push(pick.node_id.clone());
        }

        assigned.extend(reserved);
        state.catalog.update_deployed_nodes(service_id, assigned.clone())?;

        for pick in &chosen {
            tracing::info!(
                target: ANALYTICS_TARGET,
                LogDescription = "Replica placed",
                Service = %service_id,
                Node = %pick.node_id,
                Score = pick.score,
                CapacityScore = pick.capacity_score,
                LatencyScore = pick.latency_score,
                Replicas = assigned.len(),
                DesiredReplicas = desired,
            );
        }

        Ok(assigned)
    }

    /// Moves every replica off `node_id` and tries to backfill each affected service.
    ///
    /// The capacity held on the node stays reserved until the node is reclaimed. Backfill
    /// failures are logged and reported, never returned. Afterwards every other
    /// under-replicated service gets another placement attempt.
    pub fn relocate(&self, state: &mut ClusterState, node_id: &NodeId) -> Result<RelocationReport> {
        let affected: Vec<ServiceId> = {
            let node = state.registry.get(node_id).ok_or_else(|| Error::UnknownNode(node_id.clone()))?;
            node.hosted_service_ids.iter().cloned().collect()
        };

        let mut report = RelocationReport { node_id: Some(node_id.clone()), ..Default::default() };
        log::info!("Relocating {} service(s) away from node {}.", affected.len(), node_id);

        for service_id in &affected {
            let (requirements, remaining) = match state.catalog.get(service_id) {
                Some(service) => (service.requirements, service.deployed_node_ids.iter().filter(|id| *id != node_id).cloned().collect::<Vec<_>>()),
                None => {
                    log::error!("Node {} lists unknown service {}. Dropping the reference.", node_id, service_id);
                    state.registry.detach_service(node_id, service_id);
                    continue;
                }
            };

            self.detach_replica(state, service_id, node_id, &requirements)?;
            state.catalog.update_deployed_nodes(service_id, remaining)?;

            match self.place(state, service_id) {
                Ok(nodes) => {
                    log::info!("Service {} relocated, now on {:?}.", service_id, nodes);
                    report.restored.push(service_id.clone());
                }
                Err(e) => {
                    log::warn!("Backfill of service {} after failure of node {} failed: {}. Service stays degraded.", service_id, node_id, e);
                    report.degraded.push(service_id.clone());
                }
            }
        }

        for service_id in state.catalog.get_under_replicated() {
            if affected.contains(&service_id) {
                continue;
            }
            match self.place(state, &service_id) {
                Ok(_) => report.backfilled.push(service_id),
                Err(e) => log::debug!("Service {} still under-replicated: {}", service_id, e),
            }
        }

        tracing::info!(
            target: ANALYTICS_TARGET,
            LogDescription = "Relocation finished",
            Node = %node_id,
            Restored = report.restored.len(),
            Degraded = report.degraded.len(),
            Backfilled = report.backfilled.len(),
        );

        Ok(report)
    }

    /// Releases the capacity stranded on a node while it was down.
    ///
    /// # Returns
    /// The number of released reservations.
    pub fn reclaim(&self, state: &mut ClusterState, node_id: &NodeId) -> Result<usize> {
        let stranded = state.registry.take_stranded_reservations(node_id)?;
        let count = stranded.len();

        for (service_id, requirements) in stranded {
            if let Err(e) = state.registry.release(node_id, &requirements) {
                log::error!("Releasing stranded reservation of service {} on node {} failed: {}", service_id, node_id, e);
            }
        }

        if count > 0 {
            log::info!("Reclaimed {} stranded reservation(s) on node {}.", count, node_id);
        }
        Ok(count)
    }

    fn detach_replica(&self, state: &mut ClusterState, service_id: &ServiceId, node_id: &NodeId, requirements: &Requirements) -> Result<()> {
        if state.registry.detach_service(node_id, service_id) {
            state.registry.strand_reservation(node_id, service_id, *requirements)?;
        }
        Ok(())
    }

    fn roll_back(&self, state: &mut ClusterState, service_id: &ServiceId, reserved: &[NodeId], requirements: &Requirements) {
        for node_id in reserved {
            state.registry.detach_service(node_id, service_id);
            if let Err(e) = state.registry.release(node_id, requirements) {
                log::error!("Rollback of service {} on node {} failed: {}", service_id, node_id, e);
            }
        }
    }
}
