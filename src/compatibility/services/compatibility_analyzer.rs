use crate::compatibility::domain::{
    AnalysisResult, CompatibilityResult, CompatibilityStatus, Component, ComponentKey,
    ComponentResult, ProbeFindings, Resolution,
};
use crate::compatibility::policies::InheritancePolicy;
use crate::compatibility::services::component_filter::{ComponentCategory, ComponentFilter};
use crate::compatibility::services::component_grouping::ComponentGrouping;
use crate::compatibility::services::deny_list::DenyList;
use crate::compatibility::services::intelligent_matcher::IntelligentMatcher;
use crate::compatibility::services::knowledge_base::{KnowledgeBaseStore, LookupKind};
use crate::compatibility::services::recommendation::RecommendationGenerator;
use crate::shared::Result;
use anyhow::anyhow;
use std::time::Instant;

/// Confidence for OS-provided packages on an ARM64-supported OS
pub const SYSTEM_COMPATIBLE_CONFIDENCE: f64 = 0.95;
/// Confidence for OS-provided packages on an unknown or unsupported OS
pub const SYSTEM_UNKNOWN_CONFIDENCE: f64 = 0.3;
/// Confidence for files owned by an OS package known to the knowledge base
pub const OS_PACKAGE_CONFIDENCE: f64 = 0.9;

/// Combines the deny list, OS awareness, knowledge base, fuzzy matching and
/// probe findings into per-component verdicts.
///
/// Each component passes through the same ordered checks and the first
/// conclusive one wins:
///
/// 1. deny list
/// 2. system packages and kernel modules (by detected OS)
/// 3. owning OS package found in the knowledge base
/// 4. exact or alias knowledge-base lookup
/// 5. fuzzy match against knowledge-base names (only when 4 misses)
/// 6. runtime probe findings (when the static verdict is inconclusive)
///
/// Components linked to a parent reuse the parent's verdict when the
/// [`InheritancePolicy`] allows it.
pub struct CompatibilityAnalyzer {
    store: KnowledgeBaseStore,
    deny_list: DenyList,
    matcher: IntelligentMatcher,
    filter: ComponentFilter,
    inheritance: InheritancePolicy,
    runtime_enabled: bool,
}

impl CompatibilityAnalyzer {
    pub fn new(store: KnowledgeBaseStore, deny_list: DenyList, matcher: IntelligentMatcher) -> Self {
        Self {
            store,
            deny_list,
            matcher,
            filter: ComponentFilter::default(),
            inheritance: InheritancePolicy::default(),
            runtime_enabled: false,
        }
    }

    pub fn with_component_filter(mut self, filter: ComponentFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_inheritance_policy(mut self, policy: InheritancePolicy) -> Self {
        self.inheritance = policy;
        self
    }

    pub fn with_runtime_analysis(mut self, enabled: bool) -> Self {
        self.runtime_enabled = enabled;
        self
    }

    pub fn store(&self) -> &KnowledgeBaseStore {
        &self.store
    }

    pub fn deny_list(&self) -> &DenyList {
        &self.deny_list
    }

    pub fn runtime_enabled(&self) -> bool {
        self.runtime_enabled
    }

    pub fn detect_os(&self, components: &[Component]) -> Option<String> {
        self.filter.detect_os(components)
    }

    /// Analyzes a component list and assembles the run result.
    pub fn analyze(
        &self,
        components: &[Component],
        detected_os: Option<&str>,
        probes: &ProbeFindings,
    ) -> AnalysisResult {
        let started = Instant::now();
        let (results, errors) = self.analyze_components(components, detected_os, probes);
        AnalysisResult::new(
            results,
            errors,
            started.elapsed(),
            detected_os.map(str::to_string),
        )
    }

    /// Results in input order plus the errors of components whose analysis failed.
    pub fn analyze_components(
        &self,
        components: &[Component],
        detected_os: Option<&str>,
        probes: &ProbeFindings,
    ) -> (Vec<ComponentResult>, Vec<String>) {
        self.analyze_components_with_progress(components, detected_os, probes, |_, _, _| {})
    }

    /// Same as [`analyze_components`], calling `on_analyzed(done, total, component)`
    /// as each component's result is settled. Groups report their parent first.
    ///
    /// [`analyze_components`]: CompatibilityAnalyzer::analyze_components
    pub fn analyze_components_with_progress(
        &self,
        components: &[Component],
        detected_os: Option<&str>,
        probes: &ProbeFindings,
        mut on_analyzed: impl FnMut(usize, usize, &Component),
    ) -> (Vec<ComponentResult>, Vec<String>) {
        let groups = ComponentGrouping::group(components);
        let total = components.len();
        let mut done = 0;
        let mut slots: Vec<Option<ComponentResult>> = (0..total).map(|_| None).collect();
        let mut errors = Vec::new();

        for group in &groups.groups {
            let parent = self.check_recorded(&components[group.parent], detected_os, probes, &mut errors);
            done += 1;
            on_analyzed(done, total, &components[group.parent]);
            let inherit = self.inheritance.should_inherit(&parent.compatibility);
            tracing::debug!(
                parent = %parent.component.name,
                children = group.children.len(),
                inherit,
                "analyzed source group"
            );
            for &child in &group.children {
                let component = &components[child];
                let result = match self.check_deny(component) {
                    Some(denied) => denied,
                    None if inherit => self.inheritance.inherit(component.clone(), &parent),
                    None => self.check_recorded(component, detected_os, probes, &mut errors),
                };
                slots[child] = Some(result);
                done += 1;
                on_analyzed(done, total, component);
            }
            slots[group.parent] = Some(parent);
        }

        for &position in &groups.standalone {
            slots[position] =
                Some(self.check_recorded(&components[position], detected_os, probes, &mut errors));
            done += 1;
            on_analyzed(done, total, &components[position]);
        }

        (slots.into_iter().flatten().collect(), errors)
    }

    fn check_recorded(
        &self,
        component: &Component,
        detected_os: Option<&str>,
        probes: &ProbeFindings,
        errors: &mut Vec<String>,
    ) -> ComponentResult {
        match self.check_component(component, detected_os, probes) {
            Ok(result) => result,
            Err(e) => {
                let message = format!("Error analyzing component {}: {}", component.name, e);
                tracing::warn!("{}", message);
                errors.push(message);
                ComponentResult::failed(component.clone(), &e.to_string())
            }
        }
    }

    /// Verdict for one component, ignoring parent links.
    pub fn check_component(
        &self,
        component: &Component,
        detected_os: Option<&str>,
        probes: &ProbeFindings,
    ) -> Result<ComponentResult> {
        if let Some(denied) = self.check_deny(component) {
            return Ok(denied);
        }

        match self.filter.categorize(component, detected_os) {
            ComponentCategory::SystemCompatible => {
                return Ok(self.system_result(component, detected_os, true, "System package"))
            }
            ComponentCategory::SystemUnknown => {
                return Ok(self.system_result(component, detected_os, false, "System package"))
            }
            ComponentCategory::KernelModule => {
                let compatible = self.filter.is_os_compatible(detected_os);
                return Ok(self.system_result(component, detected_os, compatible, "Kernel module"));
            }
            ComponentCategory::Application => {}
        }

        if let Some(result) = self.check_os_package(component, detected_os) {
            return Ok(result);
        }

        let mut result = self.static_lookup(component);
        let mut working_version = None;
        if self.probe_applicable(&result) {
            let key = ComponentKey::of(component);
            if let Some(reason) = probes.failure(&key) {
                return Err(anyhow!("{}", reason));
            }
            if let Some(verdict) = probes.verdict(&key) {
                tracing::debug!(
                    component = %component.name,
                    status = verdict.result.status.as_str(),
                    "using probe verdict"
                );
                result = ComponentResult::new(component.clone(), verdict.result.clone(), Resolution::Probe);
                working_version = verdict.working_version.as_deref();
            }
        }

        RecommendationGenerator::apply(&mut result, &self.store, working_version);
        Ok(result)
    }

    /// Components whose static verdict is inconclusive and that a package
    /// manager could install.
    pub fn probe_candidates(&self, components: &[Component], detected_os: Option<&str>) -> Vec<Component> {
        if !self.runtime_enabled {
            return Vec::new();
        }
        let (results, _) = self.analyze_components(components, detected_os, &ProbeFindings::default());
        results
            .into_iter()
            .filter(|result| self.probe_applicable(result))
            .map(|result| result.component)
            .collect()
    }

    fn probe_applicable(&self, result: &ComponentResult) -> bool {
        self.runtime_enabled
            && matches!(
                result.resolution,
                Resolution::Exact | Resolution::Alias | Resolution::Fuzzy | Resolution::Unresolved
            )
            && matches!(
                result.status(),
                CompatibilityStatus::Unknown | CompatibilityStatus::NeedsVersionVerification
            )
            && ComponentFilter::detect_ecosystem(&result.component).is_some()
    }

    fn check_deny(&self, component: &Component) -> Option<ComponentResult> {
        let entry = self.deny_list.check(&component.name)?;
        let compatibility = CompatibilityResult::new(CompatibilityStatus::Incompatible, entry.denial_note())
            .with_minimum_version(entry.minimum_supported_version.clone());
        Some(ComponentResult::new(component.clone(), compatibility, Resolution::Denied))
    }

    fn system_result(
        &self,
        component: &Component,
        detected_os: Option<&str>,
        os_compatible: bool,
        kind: &str,
    ) -> ComponentResult {
        let compatibility = if os_compatible {
            CompatibilityResult::new(
                CompatibilityStatus::Compatible,
                format!(
                    "{} from Graviton-compatible OS ({})",
                    kind,
                    detected_os.unwrap_or("unknown")
                ),
            )
            .with_confidence(SYSTEM_COMPATIBLE_CONFIDENCE)
        } else {
            let notes = match detected_os {
                Some(os) => format!("{} from unknown or unsupported OS ({})", kind, os),
                None => format!("{} from unknown or unsupported OS", kind),
            };
            CompatibilityResult::new(CompatibilityStatus::Unknown, notes)
                .with_confidence(SYSTEM_UNKNOWN_CONFIDENCE)
        };
        ComponentResult::new(component.clone(), compatibility, Resolution::System)
    }

    fn check_os_package(&self, component: &Component, detected_os: Option<&str>) -> Option<ComponentResult> {
        let os = detected_os?;
        let package = ComponentFilter::os_package_name(component)?;
        let record = self.store.record(&package)?;
        if KnowledgeBaseStore::evaluate(record, None).status == CompatibilityStatus::Incompatible {
            return None;
        }
        let compatibility = CompatibilityResult::new(
            CompatibilityStatus::Compatible,
            format!("OS package '{}' compatible with Graviton on {}", package, os),
        )
        .with_confidence(OS_PACKAGE_CONFIDENCE);
        Some(
            ComponentResult::new(component.clone(), compatibility, Resolution::OsPackage)
                .with_matched_name(record.name.clone()),
        )
    }

    fn static_lookup(&self, component: &Component) -> ComponentResult {
        let version = component.known_version();
        if let Some(hit) = self.store.lookup(&component.name) {
            let resolution = match hit.kind {
                LookupKind::Exact => Resolution::Exact,
                LookupKind::Alias => Resolution::Alias,
            };
            return ComponentResult::new(
                component.clone(),
                KnowledgeBaseStore::evaluate(hit.record, version),
                resolution,
            );
        }

        let best = self
            .store
            .intelligent_match(&component.name, &self.matcher)
            .into_iter()
            .next();
        if let Some(best) = best {
            if let Some(record) = self.store.record(&best.name) {
                let mut matched = KnowledgeBaseStore::evaluate(record, version);
                if matched.status != CompatibilityStatus::Unknown {
                    let match_note = format!(
                        "Found via intelligent matching from '{}' to '{}'",
                        component.name, best.name
                    );
                    matched.notes = Some(match matched.notes.take() {
                        Some(notes) => format!("{}. {}", match_note, notes),
                        None => match_note,
                    });
                    let confidence = matched.confidence_level.min(best.confidence());
                    return ComponentResult::new(
                        component.clone(),
                        matched.with_confidence(confidence),
                        Resolution::Fuzzy,
                    )
                    .with_matched_name(best.name);
                }
            }
        }

        ComponentResult::new(
            component.clone(),
            self.store.get_compatibility(&component.name, version),
            Resolution::Unresolved,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compatibility::domain::{
        CompatibilityRecord, Dependency, DependencyVerdict, DenyListEntry, Ecosystem, RangeStatus,
        PACKAGE_OWNER_PROPERTY,
    };
    use crate::compatibility::services::intelligent_matcher::MatchingConfig;
    use std::collections::BTreeMap;

    fn store() -> KnowledgeBaseStore {
        let records = vec![
            CompatibilityRecord::new("nginx")
                .with_range(">=1.14.0", RangeStatus::CompatibleWithNotes, Some("Use the arm64 build"))
                .with_minimum_version("1.14.0"),
            CompatibilityRecord::new("redis")
                .with_aliases(&["redis-server"])
                .with_range(">=4.0.0", RangeStatus::Compatible, None),
            CompatibilityRecord::new("postgresql").with_range(">=9.6", RangeStatus::Compatible, None),
            CompatibilityRecord::new("log4j").with_range(">=2.0", RangeStatus::Compatible, None),
            CompatibilityRecord::new("openssl-libs").with_range("*", RangeStatus::Compatible, None),
            CompatibilityRecord::new("openssl")
                .with_range("<1.1.0", RangeStatus::Incompatible, None)
                .with_range(">=1.1.0", RangeStatus::Compatible, None),
        ];
        let records: BTreeMap<String, CompatibilityRecord> =
            records.into_iter().map(|r| (r.name.clone(), r)).collect();
        KnowledgeBaseStore::new(records, vec!["kb.json".to_string()])
    }

    fn analyzer() -> CompatibilityAnalyzer {
        let deny_list = DenyList::new(vec![DenyListEntry::new("log4j", "CVE-2021-44228")]);
        CompatibilityAnalyzer::new(store(), deny_list, IntelligentMatcher::new(MatchingConfig::default()))
    }

    fn check(analyzer: &CompatibilityAnalyzer, component: Component) -> ComponentResult {
        analyzer
            .check_component(&component, None, &ProbeFindings::default())
            .unwrap()
    }

    #[test]
    fn test_exact_hit_with_notes_range() {
        let result = check(&analyzer(), Component::new("nginx", Some("1.16.0")));
        assert_eq!(result.status(), CompatibilityStatus::Compatible);
        assert_eq!(result.compatibility.range_status, Some(RangeStatus::CompatibleWithNotes));
        assert_eq!(result.resolution, Resolution::Exact);
    }

    #[test]
    fn test_alias_hit_is_authoritative() {
        let result = check(&analyzer(), Component::new("Redis-Server", Some("6.2.0")));
        assert_eq!(result.status(), CompatibilityStatus::Compatible);
        assert_eq!(result.compatibility.confidence_level, 1.0);
        assert_eq!(result.resolution, Resolution::Alias);
        assert!(result.matched_name.is_none());
    }

    #[test]
    fn test_fuzzy_match_reduces_confidence() {
        let result = check(&analyzer(), Component::new("pstgres", Some("13.0")));
        assert_eq!(result.matched_name.as_deref(), Some("postgresql"));
        assert_eq!(result.resolution, Resolution::Fuzzy);
        assert!((result.compatibility.confidence_level - 0.85).abs() < 0.02);
        assert!(result
            .compatibility
            .has_note("Found via intelligent matching from 'pstgres' to 'postgresql'"));
    }

    #[test]
    fn test_deny_list_overrides_knowledge_base() {
        let result = check(&analyzer(), Component::new("log4j", Some("2.17.0")));
        assert_eq!(result.status(), CompatibilityStatus::Incompatible);
        assert_eq!(result.compatibility.confidence_level, 1.0);
        assert_eq!(result.resolution, Resolution::Denied);
    }

    #[test]
    fn test_system_packages_follow_detected_os() {
        let analyzer = analyzer();
        let bash = Component::new("bash", Some("5.1"));
        let on_ubuntu = analyzer
            .check_component(&bash, Some("ubuntu-20.04"), &ProbeFindings::default())
            .unwrap();
        assert_eq!(on_ubuntu.status(), CompatibilityStatus::Compatible);
        assert_eq!(on_ubuntu.compatibility.confidence_level, SYSTEM_COMPATIBLE_CONFIDENCE);

        let unknown_os = check(&analyzer, bash);
        assert_eq!(unknown_os.status(), CompatibilityStatus::Unknown);
        assert_eq!(unknown_os.compatibility.confidence_level, SYSTEM_UNKNOWN_CONFIDENCE);
    }

    #[test]
    fn test_os_package_owner_lookup() {
        let component = Component::new("libssl.so.10", None)
            .with_property(PACKAGE_OWNER_PROPERTY, "openssl-libs-1.0.2k-24.amzn2.0.4.x86_64");
        let result = analyzer()
            .check_component(&component, Some("amazon-linux-2"), &ProbeFindings::default())
            .unwrap();
        assert_eq!(result.status(), CompatibilityStatus::Compatible);
        assert_eq!(result.resolution, Resolution::OsPackage);
        assert_eq!(result.compatibility.confidence_level, OS_PACKAGE_CONFIDENCE);
    }

    #[test]
    fn test_unknown_component_gets_guidance() {
        let result = check(&analyzer(), Component::new("acme-internal-agent", Some("3.1")));
        assert_eq!(result.status(), CompatibilityStatus::Unknown);
        assert_eq!(result.resolution, Resolution::Unresolved);
        assert!(result.compatibility.has_note("consider testing with Graviton instances"));
    }

    #[test]
    fn test_children_inherit_conclusive_parent() {
        let components = vec![
            Component::new("openssl", Some("1.0.2")),
            Component::new("libssl.so.1.0.0", None).with_parent("openssl"),
            Component::new("nginx", Some("1.16.0")),
        ];
        let result = analyzer().analyze(&components, None, &ProbeFindings::default());
        let child = result.find("libssl.so.1.0.0").unwrap();
        assert_eq!(child.status(), CompatibilityStatus::Incompatible);
        assert_eq!(child.resolution, Resolution::Inherited);
        assert!((child.compatibility.confidence_level - 0.95).abs() < 1e-9);
        assert_eq!(result.components()[2].component.name, "nginx");
    }

    #[test]
    fn test_probe_verdict_used_when_static_inconclusive() {
        let analyzer = analyzer().with_runtime_analysis(true);
        let component = Component::new("node-sass", Some("4.0.0")).with_purl("pkg:npm/node-sass@4.0.0");
        let candidates = analyzer.probe_candidates(std::slice::from_ref(&component), None);
        assert_eq!(candidates.len(), 1);

        let mut probes = ProbeFindings::default();
        probes.add_verdict(DependencyVerdict {
            dependency: Dependency::new(Ecosystem::NodeJs, "node-sass", Some("4.0.0")),
            result: CompatibilityResult::new(CompatibilityStatus::NeedsVerification, "native build")
                .with_confidence(0.9),
            native_build_detected: true,
            fallback: false,
            working_version: None,
        });
        let result = analyzer.check_component(&component, None, &probes).unwrap();
        assert_eq!(result.status(), CompatibilityStatus::NeedsVerification);
        assert_eq!(result.resolution, Resolution::Probe);
    }

    #[test]
    fn test_probe_failure_recorded_as_error() {
        let analyzer = analyzer().with_runtime_analysis(true);
        let components = vec![Component::new("left-pad", Some("1.3.0")).with_purl("pkg:npm/left-pad@1.3.0")];
        let mut probes = ProbeFindings::default();
        probes.add_failure(ComponentKey::new("left-pad", Some("1.3.0")), "npm is not installed");

        let result = analyzer.analyze(&components, None, &probes);
        assert_eq!(result.errors().len(), 1);
        let failed = result.find("left-pad").unwrap();
        assert_eq!(failed.resolution, Resolution::Failed);
        assert!(failed.compatibility.has_note("Analysis failed: npm is not installed"));
    }

    #[test]
    fn test_probe_candidates_empty_when_runtime_disabled() {
        let component = Component::new("node-sass", Some("4.0.0")).with_purl("pkg:npm/node-sass@4.0.0");
        assert!(analyzer().probe_candidates(&[component], None).is_empty());
    }
}
