use crate::compatibility::domain::{
    known_version, CompatibilityRecord, CompatibilityResult, CompatibilityStatus, VersionRange,
};
use crate::compatibility::services::intelligent_matcher::{FuzzyMatch, IntelligentMatcher};
use crate::compatibility::services::version_comparator::{
    RangeMatch, Version, VersionComparator,
};
use dashmap::DashMap;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Lowercases, trims and keeps only alphanumerics and `-_.+`.
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '+'))
        .collect()
}

/// How a name was found in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Exact,
    Alias,
}

#[derive(Debug, Clone, Copy)]
pub struct KnowledgeBaseHit<'a> {
    pub record: &'a CompatibilityRecord,
    pub kind: LookupKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KnowledgeBaseStats {
    pub records: usize,
    pub aliases: usize,
    pub sources: Vec<String>,
}

/// Merged compatibility records with an alias index.
///
/// Built once per run and read-only afterwards; fuzzy match results are
/// memoized in a concurrent map so lookups can be shared across tasks.
#[derive(Debug)]
pub struct KnowledgeBaseStore {
    records: BTreeMap<String, CompatibilityRecord>,
    aliases: HashMap<String, String>,
    sources: Vec<String>,
    match_cache: DashMap<String, Vec<FuzzyMatch>>,
}

impl KnowledgeBaseStore {
    /// Builds the alias index from the records' aliases.
    ///
    /// An alias that collides with a canonical name is ignored; an alias
    /// claimed by two records resolves to the smaller canonical key.
    pub fn new(records: BTreeMap<String, CompatibilityRecord>, sources: Vec<String>) -> Self {
        let mut aliases: HashMap<String, String> = HashMap::new();
        for (key, record) in &records {
            for alias in &record.aliases {
                let alias = normalize_name(alias);
                if alias.is_empty() || records.contains_key(&alias) {
                    continue;
                }
                aliases
                    .entry(alias)
                    .and_modify(|existing| {
                        if key < existing {
                            *existing = key.clone();
                        }
                    })
                    .or_insert_with(|| key.clone());
            }
        }
        Self {
            records,
            aliases,
            sources,
            match_cache: DashMap::new(),
        }
    }

    pub fn empty() -> Self {
        Self::new(BTreeMap::new(), Vec::new())
    }

    /// Adds `alias -> canonical` pairs whose canonical name is present.
    pub fn add_aliases<'a>(&mut self, pairs: impl IntoIterator<Item = (&'a String, &'a String)>) {
        for (alias, canonical) in pairs {
            let alias = normalize_name(alias);
            let canonical = normalize_name(canonical);
            if self.records.contains_key(&canonical) && !self.records.contains_key(&alias) {
                self.aliases.insert(alias, canonical);
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Option<KnowledgeBaseHit<'_>> {
        let key = normalize_name(name);
        if let Some(record) = self.records.get(&key) {
            return Some(KnowledgeBaseHit {
                record,
                kind: LookupKind::Exact,
            });
        }
        self.aliases
            .get(&key)
            .and_then(|canonical| self.records.get(canonical))
            .map(|record| KnowledgeBaseHit {
                record,
                kind: LookupKind::Alias,
            })
    }

    pub fn record(&self, name: &str) -> Option<&CompatibilityRecord> {
        self.lookup(name).map(|hit| hit.record)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn get_compatibility(&self, name: &str, version: Option<&str>) -> CompatibilityResult {
        match self.record(name) {
            Some(record) => Self::evaluate(record, version),
            None => CompatibilityResult::unknown(format!(
                "No compatibility information found for {}",
                name
            )),
        }
    }

    /// Evaluates a version against a record: ranges first, then the minimum
    /// supported version.
    pub fn evaluate(record: &CompatibilityRecord, version: Option<&str>) -> CompatibilityResult {
        let result = match version.and_then(known_version) {
            Some(version) => Self::evaluate_version(record, version),
            None => Self::evaluate_missing_version(record),
        };
        let mut result = result
            .with_minimum_version(record.minimum_supported_version.clone())
            .with_recommended_version(record.recommended_version.clone());
        if result.notes.is_none() {
            result.notes = record.notes.clone();
        }
        result
    }

    fn evaluate_version(record: &CompatibilityRecord, version: &str) -> CompatibilityResult {
        let mut indeterminate = false;
        for range in &record.version_ranges {
            match VersionComparator::matches_range(version, &range.version_range) {
                RangeMatch::Match => {
                    let status = range.status.to_status();
                    return CompatibilityResult::new(status, range.notes.clone().unwrap_or_default())
                        .with_range_status(range.status);
                }
                RangeMatch::Indeterminate => indeterminate = true,
                RangeMatch::NoMatch => {}
            }
        }

        match record.minimum_supported_version.as_deref() {
            Some(minimum) => match VersionComparator::compare(version, minimum) {
                Some(Ordering::Less) => CompatibilityResult::new(
                    CompatibilityStatus::NeedsUpgrade,
                    format!(
                        "ARM64 support available in version {} and later. Current version {} requires upgrade.",
                        minimum, version
                    ),
                ),
                Some(_) => CompatibilityResult::new(
                    CompatibilityStatus::Compatible,
                    format!("Version {} meets minimum requirement ({})", version, minimum),
                ),
                None => CompatibilityResult::new(
                    CompatibilityStatus::NeedsVersionVerification,
                    format!(
                        "Version '{}' format not recognized - software is ARM64-compatible (min: v{}). Verify your version meets requirements.",
                        version, minimum
                    ),
                ),
            },
            None if indeterminate => CompatibilityResult::new(
                CompatibilityStatus::Unknown,
                format!(
                    "Version '{}' format not recognized. Manual testing required before migration.",
                    version
                ),
            ),
            None => CompatibilityResult::new(
                CompatibilityStatus::Unknown,
                format!(
                    "No compatibility data covers version {}. Manual testing required before migration.",
                    version
                ),
            ),
        }
    }

    fn evaluate_missing_version(record: &CompatibilityRecord) -> CompatibilityResult {
        if !record.has_version_info() {
            return CompatibilityResult::new(
                CompatibilityStatus::Unknown,
                "No version information available. Manual testing required before migration.",
            );
        }
        let requirement = match (
            record.minimum_supported_version.as_deref(),
            record.recommended_version.as_deref(),
        ) {
            (Some(minimum), Some(recommended)) => {
                format!(" (min: v{}, recommended: v{})", minimum, recommended)
            }
            (Some(minimum), None) => format!(" (min: v{})", minimum),
            _ => String::new(),
        };
        CompatibilityResult::new(
            CompatibilityStatus::NeedsVersionVerification,
            format!(
                "Version verification needed - software is ARM64-compatible{}. Verify your version meets requirements.",
                requirement
            ),
        )
    }

    /// Ranges of the record that are tagged compatible.
    pub fn find_compatible_versions(&self, name: &str) -> Vec<VersionRange> {
        self.record(name)
            .map(|record| record.compatible_ranges().cloned().collect())
            .unwrap_or_default()
    }

    /// Smallest known-good version at or above `current`.
    ///
    /// Candidates are the lower bounds of compatible ranges plus the record's
    /// minimum and recommended versions.
    pub fn nearest_compatible(&self, name: &str, current: Option<&str>) -> Option<String> {
        let record = self.record(name)?;
        let current = current.and_then(known_version).and_then(Version::parse);

        let mut candidates: Vec<String> = record
            .compatible_ranges()
            .filter_map(|range| VersionComparator::lower_bound(&range.version_range))
            .collect();
        candidates.extend(record.minimum_supported_version.iter().cloned());
        candidates.extend(record.recommended_version.iter().cloned());

        candidates
            .into_iter()
            .filter_map(|candidate| Version::parse(&candidate).map(|parsed| (parsed, candidate)))
            .filter(|(parsed, _)| current.as_ref().map(|c| parsed >= c).unwrap_or(true))
            .min_by(|a, b| a.0.cmp(&b.0))
            .map(|(_, candidate)| candidate)
    }

    /// Display names of all records, sorted.
    pub fn get_all_software_names(&self) -> Vec<String> {
        self.records.values().map(|r| r.name.clone()).collect()
    }

    /// Fuzzy matches for a name against every record name, memoized per query.
    pub fn intelligent_match(&self, name: &str, matcher: &IntelligentMatcher) -> Vec<FuzzyMatch> {
        let key = name.trim().to_lowercase();
        if let Some(cached) = self.match_cache.get(&key) {
            return cached.clone();
        }
        let matches = matcher.find_matches(name, &self.get_all_software_names());
        self.match_cache.insert(key, matches.clone());
        matches
    }

    pub fn stats(&self) -> KnowledgeBaseStats {
        KnowledgeBaseStats {
            records: self.records.len(),
            aliases: self.aliases.len(),
            sources: self.sources.clone(),
        }
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    #[cfg(test)]
    pub fn cache_size(&self) -> usize {
        self.match_cache.len()
    }
}
