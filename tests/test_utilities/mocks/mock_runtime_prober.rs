use async_trait::async_trait;
use graviton_validator::compatibility::domain::{Dependency, DependencyVerdict, RuntimeReport};
use graviton_validator::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Mock RuntimeProber giving every dependency the same verdict
pub struct MockRuntimeProber {
    pub status: CompatibilityStatus,
    pub calls: Arc<AtomicUsize>,
}

impl MockRuntimeProber {
    pub fn new(status: CompatibilityStatus) -> Self {
        Self {
            status,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RuntimeProber for MockRuntimeProber {
    async fn probe(
        &self,
        ecosystem: Ecosystem,
        dependencies: &[Dependency],
        on_finished: &(dyn for<'d> Fn(&'d Dependency) + Send + Sync),
    ) -> Result<RuntimeReport> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        dependencies.iter().for_each(on_finished);
        let mut report = RuntimeReport::new(ecosystem, "mock");
        report.verdicts = dependencies
            .iter()
            .map(|dependency| DependencyVerdict {
                dependency: dependency.clone(),
                result: CompatibilityResult::new(self.status, "mock probe").with_confidence(0.9),
                native_build_detected: false,
                fallback: false,
                working_version: None,
            })
            .collect();
        Ok(report)
    }
}
