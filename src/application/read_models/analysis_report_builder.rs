//! Builder for constructing AnalysisReport from the use case response

use super::analysis_report::{
    AnalysisReport, MatchingStatisticsView, ReportMetadataView, StatisticsView, SummaryView,
};
use super::component_view::{CompatibilityView, ComponentView};
use crate::application::dto::AnalysisResponse;
use crate::compatibility::domain::{CompatibilityStatus, ComponentResult, Resolution};
use chrono::Utc;
use std::collections::BTreeMap;
use uuid::Uuid;

pub const TOOL_NAME: &str = "graviton-validator";

/// Builder for constructing AnalysisReport from an AnalysisResponse
pub struct AnalysisReportBuilder;

impl AnalysisReportBuilder {
    /// Builds the report with a fresh run id and the current time
    pub fn build(response: &AnalysisResponse) -> AnalysisReport {
        let metadata = Self::build_metadata(
            response,
            format!("urn:uuid:{}", Uuid::new_v4()),
            Utc::now().to_rfc3339(),
        );
        Self::build_with_metadata(response, metadata)
    }

    /// Builds the report around already generated metadata
    pub fn build_with_metadata(
        response: &AnalysisResponse,
        metadata: ReportMetadataView,
    ) -> AnalysisReport {
        let result = &response.result;
        AnalysisReport {
            metadata,
            summary: Self::build_summary(response),
            components: result
                .components()
                .iter()
                .map(|r| Self::build_component(r, &response.sbom_name))
                .collect(),
            statistics: Self::build_statistics(result.components(), &response.sbom_name),
            runtime_analysis: response.runtime_reports.clone(),
            errors: result.errors().to_vec(),
        }
    }

    fn build_metadata(response: &AnalysisResponse, run_id: String, timestamp: String) -> ReportMetadataView {
        ReportMetadataView {
            tool_name: TOOL_NAME.to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            run_id,
            timestamp,
            sbom_name: response.sbom_name.clone(),
            detected_os: response.result.detected_os().map(str::to_string),
            knowledge_base_sources: response.knowledge_base.sources.clone(),
            knowledge_base_records: response.knowledge_base.records,
        }
    }

    fn build_summary(response: &AnalysisResponse) -> SummaryView {
        let counts = response.result.counts();
        SummaryView {
            total_components: response.result.total_components(),
            compatible: counts.get(CompatibilityStatus::Compatible),
            incompatible: counts.get(CompatibilityStatus::Incompatible),
            needs_upgrade: counts.get(CompatibilityStatus::NeedsUpgrade),
            needs_verification: counts.get(CompatibilityStatus::NeedsVerification),
            needs_version_verification: counts.get(CompatibilityStatus::NeedsVersionVerification),
            unknown: counts.get(CompatibilityStatus::Unknown),
            compatibility_rate: counts.compatibility_rate(),
            has_issues: counts.has_issues(),
            processing_time_seconds: response.result.processing_time().as_secs_f64(),
        }
    }

    fn build_component(result: &ComponentResult, sbom_name: &str) -> ComponentView {
        let component = &result.component;
        let compatibility = &result.compatibility;
        ComponentView {
            name: component.name.clone(),
            version: component.version.clone(),
            component_type: component.component_type.clone(),
            source_sbom: Self::source_of(result, sbom_name),
            purl: component.purl().map(str::to_string),
            parent: component.group_key().map(str::to_string),
            compatibility: CompatibilityView {
                status: compatibility.status.as_str().to_string(),
                current_version_supported: compatibility.current_version_supported,
                minimum_supported_version: compatibility.minimum_supported_version.clone(),
                recommended_version: compatibility.recommended_version.clone(),
                notes: compatibility.notes.clone(),
                confidence_level: compatibility.confidence_level,
                range_status: compatibility.range_status.map(|r| r.as_str().to_string()),
                error_category: compatibility.error_category.map(|c| c.as_str().to_string()),
                error_details: compatibility.error_details.clone(),
            },
            matched_name: result.matched_name.clone(),
            resolution: result.resolution.as_str().to_string(),
        }
    }

    fn source_of(result: &ComponentResult, sbom_name: &str) -> String {
        if result.component.source.trim().is_empty() {
            sbom_name.to_string()
        } else {
            result.component.source.clone()
        }
    }

    fn build_statistics(results: &[ComponentResult], sbom_name: &str) -> StatisticsView {
        let mut status_breakdown: BTreeMap<String, Vec<String>> = CompatibilityStatus::ALL
            .into_iter()
            .map(|status| (status.as_str().to_string(), Vec::new()))
            .collect();
        let mut sbom_breakdown: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
        let mut matching = MatchingStatisticsView::default();

        for result in results {
            let status = result.status().as_str().to_string();
            status_breakdown
                .entry(status.clone())
                .or_default()
                .push(result.component.name.clone());
            *sbom_breakdown
                .entry(Self::source_of(result, sbom_name))
                .or_default()
                .entry(status)
                .or_insert(0) += 1;

            let counter = match result.resolution {
                Resolution::Exact => &mut matching.exact,
                Resolution::Alias => &mut matching.alias,
                Resolution::Fuzzy => &mut matching.fuzzy,
                Resolution::Inherited => &mut matching.inherited,
                Resolution::Probe => &mut matching.probed,
                Resolution::Denied => &mut matching.denied,
                Resolution::System => &mut matching.system,
                Resolution::OsPackage => &mut matching.os_package,
                Resolution::Unresolved => &mut matching.unresolved,
                Resolution::Failed => &mut matching.failed,
            };
            *counter += 1;
        }

        StatisticsView {
            status_breakdown,
            sbom_breakdown,
            matching,
        }
    }
}
