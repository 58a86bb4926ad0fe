use crate::compatibility::domain::{CompatibilityRecord, RangeStatus, VersionRange};
use crate::compatibility::services::knowledge_base::{normalize_name, KnowledgeBaseStore};
use crate::shared::error::ValidatorError;
use crate::shared::Result;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
struct RawKnowledgeBase {
    software_compatibility: Vec<RawSoftware>,
    /// Marks a source whose incompatible ranges take precedence when merged
    #[serde(default)]
    deny_source: bool,
}

#[derive(Debug, Deserialize)]
struct RawSoftware {
    name: String,
    #[serde(default)]
    aliases: Vec<String>,
    compatibility: RawCompatibility,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCompatibility {
    #[serde(default)]
    supported_versions: Vec<RawVersionSpec>,
    #[serde(default, deserialize_with = "lenient_version")]
    minimum_supported_version: Option<String>,
    #[serde(default, deserialize_with = "lenient_version")]
    recommended_version: Option<String>,
    #[serde(default, alias = "notes")]
    migration_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawVersionSpec {
    #[serde(default)]
    version_range: String,
    #[serde(default = "unknown_status")]
    status: String,
    #[serde(default)]
    notes: Option<String>,
}

fn unknown_status() -> String {
    "unknown".to_string()
}

/// Accepts versions written as JSON strings or numbers (`"2"` or `2`).
fn lenient_version<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Records parsed from one knowledge-base document.
#[derive(Debug, Clone)]
pub struct ParsedKnowledgeBase {
    pub source_name: String,
    pub deny_source: bool,
    pub records: Vec<CompatibilityRecord>,
}

/// A merged store plus the per-file problems met while building it.
#[derive(Debug)]
pub struct LoadedKnowledgeBase {
    pub store: KnowledgeBaseStore,
    pub errors: Vec<String>,
}

/// Parses knowledge-base documents and merges them into one store.
pub struct KnowledgeBaseLoader;

impl KnowledgeBaseLoader {
    /// Parses one document.
    ///
    /// # Errors
    /// `ValidatorError::KnowledgeBaseError` when the content is not JSON or
    /// lacks the `software_compatibility` list (or an entry lacks `name` or
    /// `compatibility`).
    pub fn parse(source_name: &str, content: &str) -> Result<ParsedKnowledgeBase> {
        let raw: RawKnowledgeBase =
            serde_json::from_str(content).map_err(|e| ValidatorError::KnowledgeBaseError {
                source_name: source_name.to_string(),
                details: e.to_string(),
            })?;

        let records = raw
            .software_compatibility
            .into_iter()
            .filter(|software| !software.name.trim().is_empty())
            .map(|software| Self::to_record(source_name, software))
            .collect();

        Ok(ParsedKnowledgeBase {
            source_name: source_name.to_string(),
            deny_source: raw.deny_source,
            records,
        })
    }

    fn to_record(source_name: &str, software: RawSoftware) -> CompatibilityRecord {
        let compatibility = software.compatibility;
        let version_ranges = compatibility
            .supported_versions
            .iter()
            .map(|spec| {
                VersionRange::new(
                    &spec.version_range,
                    RangeStatus::parse(&spec.status),
                    spec.notes.as_deref(),
                )
            })
            .collect();

        let notes = compatibility
            .migration_notes
            .or(software.notes)
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        CompatibilityRecord {
            name: software.name.trim().to_string(),
            version_ranges,
            aliases: software
                .aliases
                .into_iter()
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .collect(),
            minimum_supported_version: compatibility.minimum_supported_version,
            recommended_version: compatibility.recommended_version,
            notes,
            sources: vec![source_name.to_string()],
        }
    }

    /// Parses every document and merges the ones that parsed.
    ///
    /// Unparseable documents are skipped with a warning and reported in
    /// `errors`.
    ///
    /// # Errors
    /// `ValidatorError::NoKnowledgeBaseLoaded` when no document parsed.
    pub fn load(documents: Vec<(String, String)>) -> Result<LoadedKnowledgeBase> {
        let attempted = documents.len();
        let mut parsed = Vec::with_capacity(attempted);
        let mut errors = Vec::new();

        for (source_name, content) in documents {
            match Self::parse(&source_name, &content) {
                Ok(knowledge_base) => {
                    tracing::debug!(
                        source = %source_name,
                        records = knowledge_base.records.len(),
                        "loaded knowledge base"
                    );
                    parsed.push(knowledge_base);
                }
                Err(e) => {
                    tracing::warn!(source = %source_name, "skipping knowledge base: {}", e);
                    errors.push(format!("Knowledge base '{}' skipped: {}", source_name, e));
                }
            }
        }

        if parsed.is_empty() {
            return Err(ValidatorError::NoKnowledgeBaseLoaded { attempted }.into());
        }

        Ok(LoadedKnowledgeBase {
            store: Self::merge(parsed),
            errors,
        })
    }

    /// Parses a custom alias document: `{"aliases": {alias: canonical}}` or a
    /// bare object of the same pairs.
    pub fn parse_aliases(source_name: &str, content: &str) -> Result<BTreeMap<String, String>> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawAliases {
            Wrapped { aliases: BTreeMap<String, String> },
            Bare(BTreeMap<String, String>),
        }

        let raw: RawAliases =
            serde_json::from_str(content).map_err(|e| ValidatorError::KnowledgeBaseError {
                source_name: source_name.to_string(),
                details: format!("invalid alias file: {}", e),
            })?;
        let aliases = match raw {
            RawAliases::Wrapped { aliases } => aliases,
            RawAliases::Bare(aliases) => aliases,
        };
        Ok(aliases
            .into_iter()
            .map(|(alias, canonical)| (alias.trim().to_lowercase(), canonical.trim().to_lowercase()))
            .filter(|(alias, canonical)| !alias.is_empty() && !canonical.is_empty())
            .collect())
    }

    /// Merges records sharing a normalized name.
    ///
    /// Contributions are ordered deny sources first, then by content, so the
    /// result does not depend on the order the files were given in. Version
    /// ranges are unioned with deny-source incompatible ranges placed first,
    /// scalar fields keep the first non-empty value in that order, and
    /// aliases and sources are unioned.
    pub fn merge(knowledge_bases: Vec<ParsedKnowledgeBase>) -> KnowledgeBaseStore {
        let mut sources: Vec<String> = Vec::new();
        let mut grouped: BTreeMap<String, Vec<(bool, CompatibilityRecord)>> = BTreeMap::new();

        for knowledge_base in knowledge_bases {
            if !sources.contains(&knowledge_base.source_name) {
                sources.push(knowledge_base.source_name.clone());
            }
            for record in knowledge_base.records {
                grouped
                    .entry(normalize_name(&record.name))
                    .or_default()
                    .push((knowledge_base.deny_source, record));
            }
        }

        let records = grouped
            .into_iter()
            .map(|(key, contributions)| (key, Self::merge_group(contributions)))
            .collect();

        sources.sort();
        KnowledgeBaseStore::new(records, sources)
    }

    fn merge_group(mut contributions: Vec<(bool, CompatibilityRecord)>) -> CompatibilityRecord {
        contributions.sort_by_cached_key(|(deny, record)| {
            (!*deny, serde_json::to_string(record).unwrap_or_default())
        });

        let name = contributions
            .iter()
            .map(|(_, r)| r.name.as_str())
            .min()
            .unwrap_or_default()
            .to_string();
        let mut merged = CompatibilityRecord::new(&name);

        let deny_first = contributions
            .iter()
            .filter(|(deny, _)| *deny)
            .flat_map(|(_, r)| r.version_ranges.iter())
            .filter(|range| range.status == RangeStatus::Incompatible);
        let everything = contributions.iter().flat_map(|(_, r)| r.version_ranges.iter());
        for range in deny_first.chain(everything) {
            if !merged.version_ranges.contains(range) {
                merged.version_ranges.push(range.clone());
            }
        }

        for (_, record) in &contributions {
            if merged.minimum_supported_version.is_none() {
                merged.minimum_supported_version = record.minimum_supported_version.clone();
            }
            if merged.recommended_version.is_none() {
                merged.recommended_version = record.recommended_version.clone();
            }
            if merged.notes.is_none() {
                merged.notes = record.notes.clone();
            }
            merged.aliases.extend(record.aliases.iter().cloned());
            merged.sources.extend(record.sources.iter().cloned());
        }

        merged.aliases.sort();
        merged.aliases.dedup();
        merged.sources.sort();
        merged.sources.dedup();
        merged
    }
}
