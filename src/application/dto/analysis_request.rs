use crate::compatibility::domain::OsSupport;
use crate::compatibility::policies::DEFAULT_INHERITANCE_THRESHOLD;
use crate::compatibility::services::MatchingConfig;
use std::path::PathBuf;

/// Tunables for one analysis run, resolved from config and CLI flags.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSettings {
    pub matching: MatchingConfig,
    pub inheritance_threshold: f64,
    pub supported_os: Vec<OsSupport>,
    /// Probe inconclusive components with their package manager
    pub runtime_enabled: bool,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            matching: MatchingConfig::default(),
            inheritance_threshold: DEFAULT_INHERITANCE_THRESHOLD,
            supported_os: OsSupport::defaults(),
            runtime_enabled: false,
        }
    }
}

/// AnalysisRequest - Internal request DTO for the compatibility analysis use case
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// Normalized components JSON document
    pub components_path: PathBuf,
    pub knowledge_bases: Vec<PathBuf>,
    pub deny_lists: Vec<PathBuf>,
    /// Optional `alias -> canonical` file for the matcher
    pub custom_aliases: Option<PathBuf>,
    /// Overrides OS detection from PURL qualifiers
    pub detected_os: Option<String>,
    /// Name used for generated manifests and result files
    pub sbom_name: Option<String>,
    pub settings: AnalysisSettings,
}

impl AnalysisRequest {
    pub fn new(components_path: PathBuf, knowledge_bases: Vec<PathBuf>) -> Self {
        Self {
            components_path,
            knowledge_bases,
            deny_lists: Vec::new(),
            custom_aliases: None,
            detected_os: None,
            sbom_name: None,
            settings: AnalysisSettings::default(),
        }
    }

    pub fn with_deny_lists(mut self, deny_lists: Vec<PathBuf>) -> Self {
        self.deny_lists = deny_lists;
        self
    }

    pub fn with_settings(mut self, settings: AnalysisSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Explicit SBOM name, else the components file stem.
    pub fn resolved_sbom_name(&self) -> String {
        self.sbom_name.clone().unwrap_or_else(|| {
            self.components_path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "components".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sbom_name_defaults_to_file_stem() {
        let request = AnalysisRequest::new(PathBuf::from("/data/web-01.json"), vec![]);
        assert_eq!(request.resolved_sbom_name(), "web-01");

        let mut named = request.clone();
        named.sbom_name = Some("fleet".to_string());
        assert_eq!(named.resolved_sbom_name(), "fleet");
    }

    #[test]
    fn test_default_settings() {
        let settings = AnalysisSettings::default();
        assert!(!settings.runtime_enabled);
        assert_eq!(settings.inheritance_threshold, 0.8);
        assert!(settings.matching.enabled);
    }
}
