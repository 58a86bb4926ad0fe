use crate::compatibility::domain::RangeStatus;
use serde::Serialize;

/// One version range of a knowledge-base record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VersionRange {
    pub version_range: String,
    pub status: RangeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl VersionRange {
    pub fn new(version_range: &str, status: RangeStatus, notes: Option<&str>) -> Self {
        Self {
            version_range: version_range.trim().to_string(),
            status,
            notes: notes
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
        }
    }
}

/// Compatibility knowledge for one canonical software name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompatibilityRecord {
    pub name: String,
    /// Evaluated in order; the first matching range decides
    pub version_ranges: Vec<VersionRange>,
    pub aliases: Vec<String>,
    pub minimum_supported_version: Option<String>,
    pub recommended_version: Option<String>,
    pub notes: Option<String>,
    /// Knowledge-base files that contributed to this record
    pub sources: Vec<String>,
}

impl CompatibilityRecord {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            version_ranges: Vec::new(),
            aliases: Vec::new(),
            minimum_supported_version: None,
            recommended_version: None,
            notes: None,
            sources: Vec::new(),
        }
    }

    pub fn with_range(mut self, version_range: &str, status: RangeStatus, notes: Option<&str>) -> Self {
        self.version_ranges
            .push(VersionRange::new(version_range, status, notes));
        self
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_minimum_version(mut self, version: &str) -> Self {
        self.minimum_supported_version = Some(version.to_string());
        self
    }

    pub fn with_recommended_version(mut self, version: &str) -> Self {
        self.recommended_version = Some(version.to_string());
        self
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = Some(notes.to_string());
        self
    }

    /// Whether a version-less component can be narrowed down by asking for its version.
    pub fn has_version_info(&self) -> bool {
        !self.version_ranges.is_empty() || self.minimum_supported_version.is_some()
    }

    pub fn compatible_ranges(&self) -> impl Iterator<Item = &VersionRange> {
        self.version_ranges.iter().filter(|r| r.status.is_compatible())
    }
}
