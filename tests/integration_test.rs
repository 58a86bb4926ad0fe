/// Integration tests for the application layer
mod test_utilities;

use graviton_validator::compatibility::domain::{ProbeOutput, ProbePhase, RangeStatus, Resolution};
use graviton_validator::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use test_utilities::mocks::*;

const KNOWLEDGE_BASE: &str = r#"{
    "software_compatibility": [
        {
            "name": "nginx",
            "compatibility": {
                "supported_versions": [
                    {"version_range": ">=1.14.0", "status": "compatible_with_notes", "notes": "Use the arm64 package"}
                ],
                "minimum_supported_version": "1.14.0",
                "recommended_version": "1.24.0"
            }
        },
        {
            "name": "redis",
            "aliases": ["redis-server"],
            "compatibility": {
                "supported_versions": [{"version_range": ">=4.0.0", "status": "compatible"}]
            }
        },
        {
            "name": "postgresql",
            "compatibility": {
                "supported_versions": [{"version_range": ">=9.6", "status": "compatible"}]
            }
        },
        {
            "name": "log4j",
            "compatibility": {
                "supported_versions": [{"version_range": ">=2.0", "status": "compatible"}]
            }
        }
    ]
}"#;

const DENY_LIST: &str = r#"{
    "deny_list": [
        {"package_name": "log4j", "reason": "CVE-2021-44228 policy block", "recommended_alternative": "logback"}
    ]
}"#;

fn documents() -> MockDocumentReader {
    MockDocumentReader::new()
        .with_document("kb.json", KNOWLEDGE_BASE)
        .with_document("deny.json", DENY_LIST)
}

fn request(runtime_enabled: bool) -> AnalysisRequest {
    AnalysisRequest::new(PathBuf::from("web-01.json"), vec![PathBuf::from("kb.json")])
        .with_deny_lists(vec![PathBuf::from("deny.json")])
        .with_settings(AnalysisSettings {
            runtime_enabled,
            ..AnalysisSettings::default()
        })
}

fn fleet_components() -> Vec<Component> {
    vec![
        Component::new("nginx", Some("1.16.0")),
        Component::new("Redis-Server", Some("6.2.0")),
        Component::new("pstgres", Some("13.0")),
        Component::new("log4j", Some("2.17.0")),
        Component::new("node-sass", Some("4.0.0")).with_purl("pkg:npm/node-sass@4.0.0"),
    ]
}

fn quick_retries() -> RuntimeAnalyzerSettings {
    RuntimeAnalyzerSettings {
        retry_delay: Duration::from_millis(1),
        ..RuntimeAnalyzerSettings::default()
    }
}

#[tokio::test]
async fn test_end_to_end_fleet_analysis() {
    let environment = Arc::new(MockExecutionEnvironment::new().with_output(
        "node-sass@4.0.0",
        ProbeOutput::succeeded("mock", "> node-sass@4.0.0 install\n> node-gyp rebuild\ngyp info ok"),
    ));
    let analyzer = RuntimeAnalyzer::new(environment.clone(), quick_retries());
    let use_case = AnalyzeCompatibilityUseCase::new(
        MockComponentReader::new(fleet_components()),
        documents(),
        MockProgressReporter::new(),
        Some(analyzer),
    );

    let response = use_case.execute(request(true)).await.unwrap();
    let result = &response.result;
    assert_eq!(result.total_components(), 5);

    let nginx = result.find("nginx").unwrap();
    assert_eq!(nginx.status(), CompatibilityStatus::Compatible);
    assert_eq!(
        nginx.compatibility.range_status,
        Some(RangeStatus::CompatibleWithNotes)
    );

    let node_sass = result.find("node-sass").unwrap();
    assert_eq!(node_sass.status(), CompatibilityStatus::NeedsVerification);
    assert_eq!(node_sass.resolution, Resolution::Probe);

    let redis = result.find("Redis-Server").unwrap();
    assert_eq!(redis.status(), CompatibilityStatus::Compatible);
    assert_eq!(redis.compatibility.confidence_level, 1.0);

    let postgres = result.find("pstgres").unwrap();
    assert_eq!(postgres.matched_name.as_deref(), Some("postgresql"));
    assert!((postgres.compatibility.confidence_level - 0.85).abs() < 0.02);

    let log4j = result.find("log4j").unwrap();
    assert_eq!(log4j.status(), CompatibilityStatus::Incompatible);
    assert_eq!(log4j.resolution, Resolution::Denied);

    assert_eq!(environment.executed(), vec!["node-sass@4.0.0"]);
    assert_eq!(response.runtime_reports.len(), 1);
    assert!(response.has_incompatible());
}

#[tokio::test]
async fn test_report_from_fleet_analysis() {
    let use_case = AnalyzeCompatibilityUseCase::new(
        MockComponentReader::new(fleet_components()),
        documents(),
        MockProgressReporter::new(),
        Some(MockRuntimeProber::new(CompatibilityStatus::Compatible)),
    );

    let response = use_case.execute(request(false)).await.unwrap();
    let report = AnalysisReportBuilder::build(&response);

    assert_eq!(report.metadata.sbom_name, "web-01");
    assert_eq!(report.summary.total_components, 5);
    assert_eq!(report.summary.incompatible, 1);
    assert_eq!(report.summary.unknown, 1);
    assert!(report.summary.has_issues);
    assert_eq!(report.statistics.matching.denied, 1);
    assert_eq!(report.statistics.matching.fuzzy, 1);
    assert_eq!(report.statistics.status_breakdown["incompatible"], vec!["log4j"]);

    let json = JsonReportFormatter::new().format(&report).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["summary"]["total_components"], 5);
    assert!(value["components"].is_array());
}

#[tokio::test]
async fn test_runtime_disabled_leaves_unknowns() {
    let prober = MockRuntimeProber::new(CompatibilityStatus::Compatible);
    let calls = prober.calls.clone();
    let use_case = AnalyzeCompatibilityUseCase::new(
        MockComponentReader::new(fleet_components()),
        documents(),
        MockProgressReporter::new(),
        Some(prober),
    );

    let response = use_case.execute(request(false)).await.unwrap();
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert_eq!(
        response.result.find("node-sass").unwrap().status(),
        CompatibilityStatus::Unknown
    );
}

#[tokio::test]
async fn test_missing_package_manager_is_not_fatal() {
    let environment = Arc::new(MockExecutionEnvironment::new().with_missing_tool("npm"));
    let analyzer = RuntimeAnalyzer::new(environment.clone(), quick_retries());
    let use_case = AnalyzeCompatibilityUseCase::new(
        MockComponentReader::new(fleet_components()),
        documents(),
        MockProgressReporter::new(),
        Some(analyzer),
    );

    let response = use_case.execute(request(true)).await.unwrap();
    assert!(environment.executed().is_empty());
    let node_sass = response.result.find("node-sass").unwrap();
    assert_eq!(node_sass.resolution, Resolution::Failed);
    assert_eq!(
        response.result.find("nginx").unwrap().status(),
        CompatibilityStatus::Compatible
    );
    assert!(!response.result.errors().is_empty());
}

#[tokio::test]
async fn test_child_of_denied_parent_inherits_incompatible() {
    let components = vec![
        Component::new("log4j", Some("2.17.0")).with_children(&["log4j-plugin"]),
        Component::new("log4j-plugin", None).with_parent("log4j"),
    ];
    let use_case: AnalyzeCompatibilityUseCase<_, _, _, RuntimeAnalyzer> =
        AnalyzeCompatibilityUseCase::new(
            MockComponentReader::new(components),
            documents(),
            MockProgressReporter::new(),
            None,
        );

    let response = use_case.execute(request(false)).await.unwrap();
    let child = response.result.find("log4j-plugin").unwrap();
    assert_eq!(child.status(), CompatibilityStatus::Incompatible);
    assert_eq!(child.resolution, Resolution::Inherited);
    assert!(child.compatibility.confidence_level < 1.0);
}

#[tokio::test]
async fn test_unreadable_components_are_fatal() {
    let use_case: AnalyzeCompatibilityUseCase<_, _, _, RuntimeAnalyzer> =
        AnalyzeCompatibilityUseCase::new(
            MockComponentReader::with_failure(),
            documents(),
            MockProgressReporter::new(),
            None,
        );

    assert!(use_case.execute(request(false)).await.is_err());
}

#[tokio::test]
async fn test_missing_knowledge_base_is_fatal() {
    let use_case: AnalyzeCompatibilityUseCase<_, _, _, RuntimeAnalyzer> =
        AnalyzeCompatibilityUseCase::new(
            MockComponentReader::new(fleet_components()),
            MockDocumentReader::new(),
            MockProgressReporter::new(),
            None,
        );

    let err = use_case.execute(request(false)).await.unwrap_err();
    assert!(format!("{}", err).contains("No knowledge base could be loaded"));
}

#[tokio::test]
async fn test_environment_cleanup_respects_keep_temp() {
    let environment = MockExecutionEnvironment::new();
    environment.cleanup(true).await;
    assert!(!environment.was_cleaned_up());
    environment.cleanup(false).await;
    assert!(environment.was_cleaned_up());
}

#[tokio::test]
async fn test_two_versions_of_one_package_are_judged_separately() {
    let gyp = ProbeOutput::failed("mock", ProbePhase::Install, "gyp ERR! build error");
    let environment = Arc::new(
        MockExecutionEnvironment::new()
            .with_output("lodash@3.10.1", gyp.clone())
            .with_output("lodash", gyp),
    );
    let analyzer = RuntimeAnalyzer::new(environment.clone(), quick_retries());
    let components = vec![
        Component::new("lodash", Some("3.10.1")).with_purl("pkg:npm/lodash@3.10.1"),
        Component::new("lodash", Some("4.17.21")).with_purl("pkg:npm/lodash@4.17.21"),
    ];
    let progress = MockProgressReporter::new();
    let use_case = AnalyzeCompatibilityUseCase::new(
        MockComponentReader::new(components),
        documents(),
        progress.clone(),
        Some(analyzer),
    );

    let response = use_case.execute(request(true)).await.unwrap();
    let results = response.result.components();
    assert_eq!(results[0].component.version.as_deref(), Some("3.10.1"));
    assert_eq!(results[0].status(), CompatibilityStatus::Incompatible);
    assert_eq!(results[1].component.version.as_deref(), Some("4.17.21"));
    assert_eq!(results[1].status(), CompatibilityStatus::Compatible);
    assert_eq!(
        environment.executed(),
        vec!["lodash@3.10.1", "lodash", "lodash@4.17.21"]
    );

    let progress_lines: Vec<String> = progress
        .get_messages()
        .into_iter()
        .filter(|m| m.starts_with("Progress: "))
        .collect();
    assert!(progress_lines.contains(&"Progress: 2/2 - lodash@4.17.21".to_string()));
    assert!(progress_lines.contains(&"Progress: 2/2 - lodash".to_string()));
}
