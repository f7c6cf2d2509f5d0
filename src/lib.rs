use std::path::Path;
use std::sync::Arc;

use crate::api::config_dto::OrchestratorConfigDto;
use crate::domain::clock::clock::SystemClock;
use crate::domain::health::prober::NodeProber;
use crate::domain::orchestrator::Orchestrator;
use crate::domain::routing::executor::ExecutorRegistry;
use crate::error::Result;
use crate::loader::parser::parse_json_file;

pub mod api;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;

/// Reads a configuration file and builds an orchestrator seeded with its nodes and services.
pub fn generate_orchestrator(
    file_path: impl AsRef<Path>,
    executors: ExecutorRegistry,
    prober: Arc<dyn NodeProber>,
    clock: Arc<dyn SystemClock>,
) -> Result<Orchestrator> {
    let root_dto: OrchestratorConfigDto = parse_json_file::<OrchestratorConfigDto>(file_path)?;
    log::info!("Configuration parsed: {} node(s), {} service(s).", root_dto.nodes.len(), root_dto.services.len());

    let orchestrator = Orchestrator::from_dto(root_dto, executors, prober, clock)?;
    log::info!("Orchestrator constructed successfully.");

    Ok(orchestrator)
}
