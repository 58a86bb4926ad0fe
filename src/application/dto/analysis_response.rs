use crate::compatibility::domain::{AnalysisResult, CompatibilityStatus, RuntimeReport};
use crate::compatibility::services::KnowledgeBaseStats;

/// AnalysisResponse - Internal response DTO from the compatibility analysis use case
///
/// Carries the domain result plus the context the report needs; formatting
/// happens in the adapters.
#[derive(Debug, Clone)]
pub struct AnalysisResponse {
    pub result: AnalysisResult,
    pub knowledge_base: KnowledgeBaseStats,
    /// One report per probed ecosystem; empty when runtime analysis is off
    pub runtime_reports: Vec<RuntimeReport>,
    pub sbom_name: String,
}

impl AnalysisResponse {
    pub fn new(
        result: AnalysisResult,
        knowledge_base: KnowledgeBaseStats,
        runtime_reports: Vec<RuntimeReport>,
        sbom_name: String,
    ) -> Self {
        Self {
            result,
            knowledge_base,
            runtime_reports,
            sbom_name,
        }
    }

    /// Whether any component is incompatible. Drives `--fail-on-incompatible`.
    pub fn has_incompatible(&self) -> bool {
        self.result.counts().get(CompatibilityStatus::Incompatible) > 0
    }
}
