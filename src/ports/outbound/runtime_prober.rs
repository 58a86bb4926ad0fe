use crate::compatibility::domain::{Dependency, Ecosystem, RuntimeReport};
use crate::shared::Result;
use async_trait::async_trait;

/// RuntimeProber port for live compatibility probes of one ecosystem batch
///
/// # Async Support
/// Probes spawn package managers and may take minutes; implementations must
/// be `Send + Sync` so batches for different ecosystems can run concurrently.
#[async_trait]
pub trait RuntimeProber: Send + Sync {
    /// Probes the dependencies of one ecosystem
    ///
    /// # Arguments
    /// * `ecosystem` - Ecosystem all dependencies belong to
    /// * `dependencies` - Deduplicated dependencies to probe
    /// * `on_finished` - Called once per dependency when its outcome is known
    ///
    /// # Returns
    /// Verdicts for the dependencies that could be probed and failure
    /// reasons for the rest
    ///
    /// # Errors
    /// Returns an error only when the batch could not be prepared at all;
    /// a dependency that fails on its own is recorded in the report
    async fn probe(
        &self,
        ecosystem: Ecosystem,
        dependencies: &[Dependency],
        on_finished: &(dyn for<'d> Fn(&'d Dependency) + Send + Sync),
    ) -> Result<RuntimeReport>;
}
