pub mod config_dto;
pub mod stats_dto;
