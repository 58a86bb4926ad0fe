use crate::application::read_models::AnalysisReport;
use crate::ports::outbound::ReportFormatter;
use crate::shared::Result;
use anyhow::Context;

/// Serializes the analysis report as JSON
pub struct JsonReportFormatter {
    pretty: bool,
}

impl JsonReportFormatter {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    /// Single-line output, for piping into other tools
    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

impl Default for JsonReportFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for JsonReportFormatter {
    fn format(&self, report: &AnalysisReport) -> Result<String> {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(report)
        } else {
            serde_json::to_string(report)
        };
        rendered.context("Failed to serialize analysis report")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dto::AnalysisResponse;
    use crate::application::read_models::{AnalysisReportBuilder, ReportMetadataView};
    use crate::compatibility::domain::{
        AnalysisResult, CompatibilityResult, CompatibilityStatus, Component, ComponentResult,
        RangeStatus, Resolution,
    };
    use crate::compatibility::services::KnowledgeBaseStats;
    use serde_json::Value;
    use std::time::Duration;

    fn create_test_report() -> AnalysisReport {
        let nginx = ComponentResult::new(
            Component::new("nginx", Some("1.16.0")).with_type("application"),
            CompatibilityResult::new(CompatibilityStatus::Compatible, "Use the arm64 package")
                .with_range_status(RangeStatus::CompatibleWithNotes),
            Resolution::Exact,
        );
        let result = AnalysisResult::new(vec![nginx], vec![], Duration::from_millis(250), None);
        let response = AnalysisResponse::new(
            result,
            KnowledgeBaseStats {
                records: 1,
                aliases: 0,
                sources: vec!["kb.json".to_string()],
            },
            vec![],
            "web-01".to_string(),
        );
        let metadata = ReportMetadataView {
            tool_name: "graviton-validator".to_string(),
            tool_version: "0.4.0".to_string(),
            run_id: "urn:uuid:00000000-0000-0000-0000-000000000000".to_string(),
            timestamp: "2024-01-15T10:30:00Z".to_string(),
            sbom_name: "web-01".to_string(),
            detected_os: None,
            knowledge_base_sources: vec!["kb.json".to_string()],
            knowledge_base_records: 1,
        };
        AnalysisReportBuilder::build_with_metadata(&response, metadata)
    }

    #[test]
    fn test_json_report_structure() {
        let formatter = JsonReportFormatter::new();
        let output = formatter.format(&create_test_report()).unwrap();
        let json: Value = serde_json::from_str(&output).unwrap();

        assert_eq!(json["metadata"]["tool_name"], "graviton-validator");
        assert_eq!(json["summary"]["total_components"], 1);
        assert_eq!(json["summary"]["compatibility_rate"], 100.0);
        assert_eq!(json["components"][0]["name"], "nginx");
        assert_eq!(json["components"][0]["type"], "application");
        assert_eq!(
            json["components"][0]["compatibility"]["range_status"],
            "compatible_with_notes"
        );
        assert_eq!(json["statistics"]["matching"]["exact"], 1);
        assert!(json.get("runtime_analysis").is_none());
        assert_eq!(json["errors"], Value::Array(vec![]));
    }

    #[test]
    fn test_compact_output_is_single_line() {
        let output = JsonReportFormatter::compact()
            .format(&create_test_report())
            .unwrap();
        assert!(!output.contains('\n'));
    }
}
