pub mod service;
pub mod service_catalog;
pub mod service_type;
