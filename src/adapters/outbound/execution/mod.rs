/// Execution environment adapters for package-manager probes
mod container;
pub mod dockerfile;
mod native;
mod process;

pub use container::{ContainerEnvironment, CONTAINER_TOOLS};
pub use native::{NativeEnvironment, NATIVE_ENVIRONMENT};
pub use process::{run_command, tool_available, CommandOutcome, Invocation, PhaseTimeouts};
