use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use rand::Rng;
use rand::seq::IndexedRandom;

use edge_orchestrator::api::config_dto::OrchestratorConfigDto;
use edge_orchestrator::domain::clock::clock::WallClock;
use edge_orchestrator::domain::orchestrator::Orchestrator;
use edge_orchestrator::domain::service::service_type::ServiceType;
use edge_orchestrator::domain::simulation::simulated_executor::SimulatedExecutor;
use edge_orchestrator::domain::simulation::simulated_prober::SimulatedProber;
use edge_orchestrator::loader::parser::parse_json_file;
use edge_orchestrator::logger;

/// Runs a simulated edge network: places the configured services, sends a stream of random
/// requests and lets the health monitor react to simulated node failures.
#[derive(Parser, Debug)]
#[command(name = "edge-orchestrator", version, about, long_about = None)]
struct Args {
    /// Configuration file with scoring, health, nodes and services
    #[arg(short, long, default_value = "data/edge_network.json")]
    config: String,

    /// How long the simulation runs
    #[arg(long, default_value_t = 30)]
    run_secs: u64,

    /// Pause between two simulated requests
    #[arg(long, default_value_t = 250)]
    request_interval_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init();

    log::info!("Loading configuration from '{}'...", args.config);
    let dto: OrchestratorConfigDto = parse_json_file(&args.config).with_context(|| format!("loading '{}'", args.config))?;

    let prober = SimulatedProber::new(dto.simulation.probe_failure_probability, dto.simulation.recovery_probability)?;
    let orchestrator = Orchestrator::from_dto(dto, SimulatedExecutor::registry(), Arc::new(prober), Arc::new(WallClock))?;

    let monitor = orchestrator.start_health_monitor();
    run_requests(&orchestrator, Duration::from_secs(args.run_secs), Duration::from_millis(args.request_interval_ms.max(1))).await;
    monitor.shutdown().await;

    for service in orchestrator.list_services() {
        log::info!("Service {} ({}): {:?} on {} of {} node(s).", service.id, service.name, service.get_status(), service.deployed_node_ids.len(), service.desired_replicas);
    }

    let violations = orchestrator.check_consistency();
    if !violations.is_empty() {
        log::error!("Cluster state is inconsistent: {:?}", violations);
    }

    println!("{}", serde_json::to_string_pretty(&orchestrator.get_network_stats())?);
    Ok(())
}

async fn run_requests(orchestrator: &Orchestrator, run_for: Duration, pause: Duration) {
    let deadline = tokio::time::Instant::now() + run_for;
    let (mut handled, mut rejected) = (0usize, 0usize);

    while tokio::time::Instant::now() < deadline {
        let (service_type, complexity) = {
            let mut rng = rand::rng();
            let service_type = ServiceType::ALL.choose(&mut rng).copied().unwrap_or(ServiceType::Analytics);
            (service_type, rng.random_range(0.5..2.0))
        };

        match orchestrator.handle_request(service_type, complexity).await {
            Ok(result) => {
                handled += 1;
                log::debug!("{} request handled by {} in {:.1} ms.", service_type, result.handled_by, result.total_latency_ms);
            }
            Err(e) => {
                rejected += 1;
                log::warn!("{} request rejected: {}", service_type, e);
            }
        }

        tokio::time::sleep(pause).await;
    }

    log::info!("Simulation finished: {} request(s) handled, {} rejected.", handled, rejected);
}
