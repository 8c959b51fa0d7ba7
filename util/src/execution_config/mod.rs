pub mod execution_config;

pub use execution_config::ExecutionLimits;
