use crate::compatibility::domain::{
    CompatibilityResult, CompatibilityStatus, Component, ComponentResult, Resolution,
};

/// Default minimum parent confidence for children to inherit its verdict
pub const DEFAULT_INHERITANCE_THRESHOLD: f64 = 0.8;
/// Factor applied to the parent's confidence for an inherited verdict
pub const INHERITANCE_CONFIDENCE_FACTOR: f64 = 0.95;

/// InheritancePolicy decides when child components take their parent's verdict
///
/// Components that ship inside a source package (binaries of an OS package,
/// modules of an application) usually share its architecture support. When the
/// parent's verdict is conclusive enough the children reuse it instead of
/// being analyzed one by one.
///
/// This is an approximation: a child that bundles its own native code can
/// differ from its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InheritancePolicy {
    threshold: f64,
}

impl Default for InheritancePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_INHERITANCE_THRESHOLD)
    }
}

impl InheritancePolicy {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Whether children may inherit the parent's result
    ///
    /// # Arguments
    /// * `parent` - The parent component's final verdict
    ///
    /// # Returns
    /// true when the parent is compatible or incompatible with a confidence
    /// at or above the threshold
    pub fn should_inherit(&self, parent: &CompatibilityResult) -> bool {
        matches!(
            parent.status,
            CompatibilityStatus::Compatible | CompatibilityStatus::Incompatible
        ) && parent.confidence_level >= self.threshold
    }

    /// Builds a child's result from its parent's
    ///
    /// The status and version hints are copied unchanged, the confidence is
    /// reduced and the notes name the parent.
    pub fn inherit(&self, child: Component, parent: &ComponentResult) -> ComponentResult {
        let source = &parent.compatibility;
        let parent_name = &parent.component.name;
        let notes = match source.notes.as_deref() {
            Some(notes) => format!("Inherited from source package '{}'. {}", parent_name, notes),
            None => format!("Inherited from source package '{}'.", parent_name),
        };

        let mut compatibility = CompatibilityResult::new(source.status, notes)
            .with_confidence(source.confidence_level * INHERITANCE_CONFIDENCE_FACTOR)
            .with_minimum_version(source.minimum_supported_version.clone())
            .with_recommended_version(source.recommended_version.clone())
            .with_current_version_supported(source.current_version_supported);
        compatibility.range_status = source.range_status;

        let mut result = ComponentResult::new(child, compatibility, Resolution::Inherited);
        result.matched_name = parent.matched_name.clone();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parent(status: CompatibilityStatus, confidence: f64) -> ComponentResult {
        ComponentResult::new(
            Component::new("openssl", Some("1.1.1")),
            CompatibilityResult::new(status, "Known issue on ARM64").with_confidence(confidence),
            Resolution::Exact,
        )
    }

    #[test]
    fn test_should_inherit_requires_conclusive_confident_parent() {
        let policy = InheritancePolicy::default();
        assert!(policy.should_inherit(&parent(CompatibilityStatus::Incompatible, 1.0).compatibility));
        assert!(policy.should_inherit(&parent(CompatibilityStatus::Compatible, 0.8).compatibility));
        assert!(!policy.should_inherit(&parent(CompatibilityStatus::Compatible, 0.79).compatibility));
        assert!(!policy.should_inherit(&parent(CompatibilityStatus::NeedsUpgrade, 1.0).compatibility));
        assert!(!policy.should_inherit(&parent(CompatibilityStatus::Unknown, 1.0).compatibility));
    }

    #[test]
    fn test_inherit_reduces_confidence_and_names_parent() {
        let policy = InheritancePolicy::default();
        let parent = parent(CompatibilityStatus::Incompatible, 1.0);
        let child = policy.inherit(Component::new("libssl.so.1.1", None), &parent);

        assert_eq!(child.status(), CompatibilityStatus::Incompatible);
        assert_eq!(child.resolution, Resolution::Inherited);
        assert!((child.compatibility.confidence_level - 0.95).abs() < 1e-9);
        assert_eq!(
            child.compatibility.notes.as_deref(),
            Some("Inherited from source package 'openssl'. Known issue on ARM64")
        );
        assert!(!child.compatibility.current_version_supported);
    }

    #[test]
    fn test_threshold_is_clamped() {
        assert_eq!(InheritancePolicy::new(1.5).threshold(), 1.0);
        assert_eq!(InheritancePolicy::new(-0.2).threshold(), 0.0);
    }
}
