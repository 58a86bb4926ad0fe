use crate::compatibility::domain::{CompatibilityStatus, ComponentResult};
use std::collections::BTreeMap;
use std::time::Duration;

/// Per-status component counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusCounts {
    counts: BTreeMap<CompatibilityStatus, usize>,
}

impl StatusCounts {
    pub fn from_results(results: &[ComponentResult]) -> Self {
        let mut counts: BTreeMap<CompatibilityStatus, usize> = CompatibilityStatus::ALL
            .into_iter()
            .map(|status| (status, 0))
            .collect();
        for result in results {
            *counts.entry(result.status()).or_insert(0) += 1;
        }
        Self { counts }
    }

    pub fn get(&self, status: CompatibilityStatus) -> usize {
        self.counts.get(&status).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Share of compatible components, in percent, rounded to one decimal.
    pub fn compatibility_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let rate = self.get(CompatibilityStatus::Compatible) as f64 / total as f64 * 100.0;
        (rate * 10.0).round() / 10.0
    }

    pub fn has_issues(&self) -> bool {
        self.get(CompatibilityStatus::Incompatible) > 0
            || self.get(CompatibilityStatus::NeedsUpgrade) > 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (CompatibilityStatus, usize)> + '_ {
        self.counts.iter().map(|(status, count)| (*status, *count))
    }
}

/// Outcome of one analysis run. Assembled once, read-only afterwards.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    components: Vec<ComponentResult>,
    counts: StatusCounts,
    errors: Vec<String>,
    processing_time: Duration,
    detected_os: Option<String>,
}

impl AnalysisResult {
    pub fn new(
        components: Vec<ComponentResult>,
        errors: Vec<String>,
        processing_time: Duration,
        detected_os: Option<String>,
    ) -> Self {
        let counts = StatusCounts::from_results(&components);
        Self {
            components,
            counts,
            errors,
            processing_time,
            detected_os,
        }
    }

    pub fn components(&self) -> &[ComponentResult] {
        &self.components
    }

    pub fn counts(&self) -> &StatusCounts {
        &self.counts
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn processing_time(&self) -> Duration {
        self.processing_time
    }

    pub fn detected_os(&self) -> Option<&str> {
        self.detected_os.as_deref()
    }

    pub fn total_components(&self) -> usize {
        self.components.len()
    }

    pub fn find(&self, name: &str) -> Option<&ComponentResult> {
        self.components.iter().find(|r| r.component.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compatibility::domain::{CompatibilityResult, Component, Resolution};

    fn result(name: &str, status: CompatibilityStatus) -> ComponentResult {
        ComponentResult::new(
            Component::new(name, None),
            CompatibilityResult::new(status, ""),
            Resolution::Exact,
        )
    }

    #[test]
    fn test_counts_include_every_status() {
        let counts = StatusCounts::from_results(&[]);
        assert_eq!(counts.iter().count(), CompatibilityStatus::ALL.len());
        assert_eq!(counts.total(), 0);
        assert_eq!(counts.compatibility_rate(), 0.0);
    }

    #[test]
    fn test_compatibility_rate() {
        let results = vec![
            result("a", CompatibilityStatus::Compatible),
            result("b", CompatibilityStatus::Compatible),
            result("c", CompatibilityStatus::Unknown),
        ];
        let counts = StatusCounts::from_results(&results);
        assert_eq!(counts.compatibility_rate(), 66.7);
        assert!(!counts.has_issues());
    }

    #[test]
    fn test_has_issues() {
        let results = vec![result("a", CompatibilityStatus::NeedsUpgrade)];
        assert!(StatusCounts::from_results(&results).has_issues());
    }

    #[test]
    fn test_analysis_result_preserves_order() {
        let analysis = AnalysisResult::new(
            vec![
                result("z", CompatibilityStatus::Compatible),
                result("a", CompatibilityStatus::Incompatible),
            ],
            vec!["warning".to_string()],
            Duration::from_millis(5),
            Some("ubuntu-22.04".to_string()),
        );
        assert_eq!(analysis.components()[0].component.name, "z");
        assert_eq!(analysis.counts().get(CompatibilityStatus::Incompatible), 1);
        assert_eq!(analysis.detected_os(), Some("ubuntu-22.04"));
        assert!(analysis.find("a").is_some());
    }
}
