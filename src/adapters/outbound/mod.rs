/// Outbound adapters - Infrastructure implementations of outbound ports
pub mod console;
pub mod execution;
pub mod filesystem;
pub mod formatters;
pub mod runtime;
