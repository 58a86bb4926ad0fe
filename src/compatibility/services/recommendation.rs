use crate::compatibility::domain::{CompatibilityStatus, ComponentResult};
use crate::compatibility::services::knowledge_base::KnowledgeBaseStore;
use crate::compatibility::services::version_comparator::VersionComparator;

pub const NO_COMPATIBLE_VERSIONS_NOTE: &str = "No compatible versions found in knowledge base";
pub const UNKNOWN_GUIDANCE_NOTE: &str =
    "Compatibility unknown - consider testing with Graviton instances or checking with software vendor";

/// Adds upgrade paths and guidance to finished component results.
pub struct RecommendationGenerator;

impl RecommendationGenerator {
    /// Appends recommendation notes in place. `working_version` is the
    /// version a probe installed after the pinned one failed.
    pub fn apply(
        result: &mut ComponentResult,
        store: &KnowledgeBaseStore,
        working_version: Option<&str>,
    ) {
        match result.compatibility.status {
            CompatibilityStatus::Incompatible | CompatibilityStatus::NeedsUpgrade => {
                Self::upgrade_path(result, store, working_version)
            }
            CompatibilityStatus::Unknown => result.compatibility.append_note(UNKNOWN_GUIDANCE_NOTE),
            _ => {}
        }
    }

    fn upgrade_path(
        result: &mut ComponentResult,
        store: &KnowledgeBaseStore,
        working_version: Option<&str>,
    ) {
        let software = result
            .matched_name
            .clone()
            .unwrap_or_else(|| result.component.name.clone());
        let current = result.component.known_version().map(str::to_string);
        let compatible_ranges = store.find_compatible_versions(&software);

        if result.compatibility.minimum_supported_version.is_none() {
            result.compatibility.minimum_supported_version =
                store.nearest_compatible(&software, current.as_deref());
        }
        let minimum = result.compatibility.minimum_supported_version.clone();
        let recommended = result.compatibility.recommended_version.clone();

        let mut notes = Vec::new();
        if let Some(minimum) = &minimum {
            match &current {
                Some(current) => notes.push(format!("Upgrade from v{} to at least v{}", current, minimum)),
                None => notes.push(format!("Ensure version is at least v{}", minimum)),
            }
        }
        if let Some(recommended) = recommended.as_ref().filter(|r| Some(*r) != minimum.as_ref()) {
            notes.push(format!("Recommended version: v{}", recommended));
        }
        if let (Some(current), Some(working)) = (&current, working_version) {
            if VersionComparator::is_valid(working) {
                notes.push(format!("v{} failed; v{} works", current, working));
            } else {
                notes.push(format!("v{} failed; the {} release works", current, working));
            }
        }
        if !compatible_ranges.is_empty() {
            notes.push(format!(
                "{} compatible version range(s) available",
                compatible_ranges.len()
            ));
        }

        if notes.is_empty() || (compatible_ranges.is_empty() && working_version.is_none()) {
            for note in &notes {
                result.compatibility.append_note(note);
            }
            result.compatibility.append_note(NO_COMPATIBLE_VERSIONS_NOTE);
        } else {
            result.compatibility.append_note(&format!("{}.", notes.join(". ")));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compatibility::domain::{
        CompatibilityRecord, CompatibilityResult, Component, RangeStatus, Resolution,
    };
    use std::collections::BTreeMap;

    fn store() -> KnowledgeBaseStore {
        let record = CompatibilityRecord::new("tensorflow")
            .with_range(">=2.10.0", RangeStatus::Compatible, None)
            .with_range("<2.10.0", RangeStatus::Incompatible, None)
            .with_minimum_version("2.10.0")
            .with_recommended_version("2.15.0");
        let mut records = BTreeMap::new();
        records.insert("tensorflow".to_string(), record);
        KnowledgeBaseStore::new(records, vec!["kb.json".to_string()])
    }

    fn result(name: &str, version: Option<&str>, status: CompatibilityStatus) -> ComponentResult {
        ComponentResult::new(
            Component::new(name, version),
            CompatibilityResult::new(status, "Known issue"),
            Resolution::Exact,
        )
    }

    #[test]
    fn test_upgrade_notes_from_store() {
        let store = store();
        let mut upgrade = result("tensorflow", Some("2.4.0"), CompatibilityStatus::NeedsUpgrade);
        RecommendationGenerator::apply(&mut upgrade, &store, None);
        let notes = upgrade.compatibility.notes.clone().unwrap();
        assert!(notes.contains("Upgrade from v2.4.0 to at least v2.10.0"));
        assert!(notes.contains("Recommended version: v2.15.0"));
        assert!(notes.contains("1 compatible version range(s) available"));
        assert_eq!(
            upgrade.compatibility.minimum_supported_version.as_deref(),
            Some("2.10.0")
        );
    }

    #[test]
    fn test_notes_are_not_duplicated() {
        let store = store();
        let mut upgrade = result("tensorflow", Some("2.4.0"), CompatibilityStatus::Incompatible);
        RecommendationGenerator::apply(&mut upgrade, &store, None);
        let once = upgrade.compatibility.notes.clone();
        RecommendationGenerator::apply(&mut upgrade, &store, None);
        assert_eq!(upgrade.compatibility.notes, once);
    }

    #[test]
    fn test_missing_record_says_no_versions() {
        let store = store();
        let mut denied = result("log4j", Some("2.17.0"), CompatibilityStatus::Incompatible);
        RecommendationGenerator::apply(&mut denied, &store, None);
        assert!(denied.compatibility.has_note(NO_COMPATIBLE_VERSIONS_NOTE));
    }

    #[test]
    fn test_probe_working_version_note() {
        let store = KnowledgeBaseStore::empty();
        let mut probed = result("node-sass", Some("4.0.0"), CompatibilityStatus::NeedsUpgrade);
        RecommendationGenerator::apply(&mut probed, &store, Some("latest"));
        assert!(probed.compatibility.has_note("v4.0.0 failed; the latest release works"));
        assert!(!probed.compatibility.has_note(NO_COMPATIBLE_VERSIONS_NOTE));
    }

    #[test]
    fn test_compatible_untouched_and_unknown_gets_guidance() {
        let store = store();
        let mut compatible = result("tensorflow", Some("2.12.0"), CompatibilityStatus::Compatible);
        RecommendationGenerator::apply(&mut compatible, &store, None);
        assert_eq!(compatible.compatibility.notes.as_deref(), Some("Known issue"));

        let mut unknown = result("mystery", None, CompatibilityStatus::Unknown);
        RecommendationGenerator::apply(&mut unknown, &store, None);
        assert!(unknown.compatibility.has_note(UNKNOWN_GUIDANCE_NOTE));
    }
}
