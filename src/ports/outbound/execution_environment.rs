use crate::compatibility::domain::{Ecosystem, Prerequisites, ProbeOutput, ProbeRequest};
use async_trait::async_trait;

/// ExecutionEnvironment port for running package-manager probes in isolation
///
/// Implementations run each probe in a throwaway location (a temporary
/// directory or a container) and never touch the host's installed software.
///
/// # Failure model
/// Timeouts, missing tools and non-zero exits are returned inside
/// [`ProbeOutput`]; `execute` never fails.
#[async_trait]
pub trait ExecutionEnvironment: Send + Sync {
    /// Short name recorded in probe output ("native", "docker", "podman")
    fn name(&self) -> &str;

    /// Reports which tools needed to probe `ecosystem` are missing
    async fn check_prerequisites(&self, ecosystem: Ecosystem) -> Prerequisites;

    /// Writes the request's manifest and runs its commands in order,
    /// stopping at the first failing phase
    async fn execute(&self, request: &ProbeRequest) -> ProbeOutput;

    /// Releases resources created during the run (images, preserved
    /// directories). `skip` leaves them in place for inspection.
    async fn cleanup(&self, skip: bool);
}
