pub mod executor;
pub mod request_router;
