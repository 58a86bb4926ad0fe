use crate::compatibility::domain::{
    CompatibilityStatus, Component, ErrorCategory, RangeStatus,
};
use serde::Serialize;

/// Confidence attached to authoritative knowledge-base and deny-list verdicts
pub const AUTHORITATIVE_CONFIDENCE: f64 = 1.0;

/// Verdict for one component version.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompatibilityResult {
    pub status: CompatibilityStatus,
    pub current_version_supported: bool,
    pub minimum_supported_version: Option<String>,
    pub recommended_version: Option<String>,
    pub notes: Option<String>,
    pub confidence_level: f64,
    /// Knowledge-base range tag that produced the verdict
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range_status: Option<RangeStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_category: Option<ErrorCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
}

impl CompatibilityResult {
    pub fn new(status: CompatibilityStatus, notes: impl Into<String>) -> Self {
        let notes = notes.into();
        Self {
            status,
            current_version_supported: status == CompatibilityStatus::Compatible,
            minimum_supported_version: None,
            recommended_version: None,
            notes: (!notes.is_empty()).then_some(notes),
            confidence_level: AUTHORITATIVE_CONFIDENCE,
            range_status: None,
            error_category: None,
            error_details: None,
        }
    }

    pub fn unknown(notes: impl Into<String>) -> Self {
        Self::new(CompatibilityStatus::Unknown, notes).with_confidence(0.0)
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence_level = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_minimum_version(mut self, version: Option<String>) -> Self {
        self.minimum_supported_version = version;
        self
    }

    pub fn with_recommended_version(mut self, version: Option<String>) -> Self {
        self.recommended_version = version;
        self
    }

    pub fn with_range_status(mut self, range_status: RangeStatus) -> Self {
        self.range_status = Some(range_status);
        self
    }

    pub fn with_error(mut self, category: ErrorCategory, details: impl Into<String>) -> Self {
        self.error_category = Some(category);
        let details = details.into();
        self.error_details = (!details.is_empty()).then_some(details);
        self
    }

    pub fn with_current_version_supported(mut self, supported: bool) -> Self {
        self.current_version_supported = supported;
        self
    }

    /// Appends a sentence to the notes unless the same text is already present.
    pub fn append_note(&mut self, note: &str) {
        let note = note.trim();
        if note.is_empty() {
            return;
        }
        match self.notes.as_mut() {
            Some(existing) if existing.contains(note) => {}
            Some(existing) => {
                if !existing.ends_with('.') && !existing.ends_with(';') {
                    existing.push('.');
                }
                existing.push(' ');
                existing.push_str(note);
            }
            None => self.notes = Some(note.to_string()),
        }
    }

    pub fn has_note(&self, fragment: &str) -> bool {
        self.notes
            .as_deref()
            .map(|n| n.contains(fragment))
            .unwrap_or(false)
    }
}

/// How a component's verdict was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Denied,
    System,
    OsPackage,
    Exact,
    Alias,
    Fuzzy,
    Probe,
    Inherited,
    Unresolved,
    Failed,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Denied => "denied",
            Resolution::System => "system",
            Resolution::OsPackage => "os_package",
            Resolution::Exact => "exact",
            Resolution::Alias => "alias",
            Resolution::Fuzzy => "fuzzy",
            Resolution::Probe => "probe",
            Resolution::Inherited => "inherited",
            Resolution::Unresolved => "unresolved",
            Resolution::Failed => "failed",
        }
    }
}

/// A component paired with its verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentResult {
    pub component: Component,
    pub compatibility: CompatibilityResult,
    /// Knowledge-base name used when fuzzy matching resolved the component
    pub matched_name: Option<String>,
    pub resolution: Resolution,
}

impl ComponentResult {
    pub fn new(
        component: Component,
        compatibility: CompatibilityResult,
        resolution: Resolution,
    ) -> Self {
        Self {
            component,
            compatibility,
            matched_name: None,
            resolution,
        }
    }

    pub fn with_matched_name(mut self, matched_name: impl Into<String>) -> Self {
        self.matched_name = Some(matched_name.into());
        self
    }

    /// Result recorded when analysis of a component raised an error.
    pub fn failed(component: Component, error: &str) -> Self {
        let compatibility = CompatibilityResult::unknown(format!(
            "Analysis failed: {}. Component compatibility could not be determined due to processing error.",
            error
        ));
        Self::new(component, compatibility, Resolution::Failed)
    }

    pub fn status(&self) -> CompatibilityStatus {
        self.compatibility.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sets_supported_flag_from_status() {
        let compatible = CompatibilityResult::new(CompatibilityStatus::Compatible, "ok");
        assert!(compatible.current_version_supported);
        assert_eq!(compatible.confidence_level, 1.0);

        let upgrade = CompatibilityResult::new(CompatibilityStatus::NeedsUpgrade, "");
        assert!(!upgrade.current_version_supported);
        assert!(upgrade.notes.is_none());
    }

    #[test]
    fn test_unknown_has_zero_confidence() {
        let unknown = CompatibilityResult::unknown("not found");
        assert_eq!(unknown.status, CompatibilityStatus::Unknown);
        assert_eq!(unknown.confidence_level, 0.0);
    }

    #[test]
    fn test_confidence_is_clamped() {
        let result =
            CompatibilityResult::new(CompatibilityStatus::Compatible, "").with_confidence(1.7);
        assert_eq!(result.confidence_level, 1.0);
    }

    #[test]
    fn test_append_note_skips_duplicates() {
        let mut result = CompatibilityResult::new(CompatibilityStatus::Incompatible, "Denied");
        result.append_note("Recommended version: v2.0.0");
        result.append_note("Recommended version: v2.0.0");
        assert_eq!(
            result.notes.as_deref(),
            Some("Denied. Recommended version: v2.0.0")
        );
    }

    #[test]
    fn test_failed_component_result() {
        let result = ComponentResult::failed(Component::new("x", None), "boom");
        assert_eq!(result.status(), CompatibilityStatus::Unknown);
        assert_eq!(result.resolution, Resolution::Failed);
        assert!(result.compatibility.has_note("Analysis failed: boom"));
    }

    #[test]
    fn test_error_fields_serialize_only_when_set() {
        let plain = CompatibilityResult::new(CompatibilityStatus::Compatible, "ok");
        let json = serde_json::to_value(&plain).unwrap();
        assert!(json.get("error_category").is_none());

        let degraded = CompatibilityResult::unknown("probe failed")
            .with_error(ErrorCategory::Network, "ENOTFOUND registry.npmjs.org");
        let json = serde_json::to_value(&degraded).unwrap();
        assert_eq!(json["error_category"], "network");
    }
}
