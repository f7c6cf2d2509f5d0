pub mod simulated_executor;
pub mod simulated_prober;
