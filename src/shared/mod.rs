/// Shared kernel - error types and cross-cutting utilities
pub mod error;
pub mod result;
pub mod security;

pub use result::Result;
