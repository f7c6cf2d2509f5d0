pub mod clock;
pub mod cluster_state;
pub mod health;
pub mod node;
pub mod orchestrator;
pub mod placement;
pub mod resource;
pub mod routing;
pub mod scheduler;
pub mod service;
pub mod simulation;
pub mod utils;
