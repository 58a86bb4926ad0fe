//! Analysis report read model
//!
//! The structure serialized as the run's JSON report.

use super::component_view::ComponentView;
use crate::compatibility::domain::RuntimeReport;
use serde::Serialize;
use std::collections::BTreeMap;

/// Main read model for one analysis run
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub metadata: ReportMetadataView,
    pub summary: SummaryView,
    pub components: Vec<ComponentView>,
    pub statistics: StatisticsView,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub runtime_analysis: Vec<RuntimeReport>,
    pub errors: Vec<String>,
}

/// View representation of run metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportMetadataView {
    pub tool_name: String,
    pub tool_version: String,
    /// `urn:uuid:` identifier unique to the run
    pub run_id: String,
    /// RFC 3339 timestamp
    pub timestamp: String,
    pub sbom_name: String,
    pub detected_os: Option<String>,
    pub knowledge_base_sources: Vec<String>,
    pub knowledge_base_records: usize,
}

/// Per-status counts and headline figures
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryView {
    pub total_components: usize,
    pub compatible: usize,
    pub incompatible: usize,
    pub needs_upgrade: usize,
    pub needs_verification: usize,
    pub needs_version_verification: usize,
    pub unknown: usize,
    /// Percentage of compatible components
    pub compatibility_rate: f64,
    pub has_issues: bool,
    pub processing_time_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsView {
    /// Status -> component names
    pub status_breakdown: BTreeMap<String, Vec<String>>,
    /// Originating SBOM -> status -> count
    pub sbom_breakdown: BTreeMap<String, BTreeMap<String, usize>>,
    pub matching: MatchingStatisticsView,
}

/// How many verdicts each resolution path produced
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchingStatisticsView {
    pub exact: usize,
    pub alias: usize,
    pub fuzzy: usize,
    pub inherited: usize,
    pub probed: usize,
    pub denied: usize,
    pub system: usize,
    pub os_package: usize,
    pub unresolved: usize,
    pub failed: usize,
}
