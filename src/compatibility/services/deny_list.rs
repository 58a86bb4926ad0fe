use crate::compatibility::domain::DenyListEntry;
use crate::shared::error::ValidatorError;
use crate::shared::Result;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDenyList {
    Wrapped { deny_list: Vec<DenyListEntry> },
    Bare(Vec<DenyListEntry>),
}

const NAME_SEPARATORS: &[char] = &['-', '_', '.', ':', '/', '@'];

/// Explicit incompatibility overrides indexed by lowercase name and alias.
#[derive(Debug, Default)]
pub struct DenyList {
    entries: Vec<DenyListEntry>,
    index: HashMap<String, usize>,
}

impl DenyList {
    /// Later entries replace earlier ones with the same name.
    pub fn new(entries: Vec<DenyListEntry>) -> Self {
        let mut deny_list = Self::default();
        for entry in entries {
            deny_list.insert(entry);
        }
        deny_list
    }

    fn insert(&mut self, entry: DenyListEntry) {
        let key = entry.package_name.trim().to_lowercase();
        let position = match self.index.get(&key) {
            Some(&existing) if self.entries[existing].package_name.trim().to_lowercase() == key => {
                self.entries[existing] = entry;
                existing
            }
            _ => {
                self.entries.push(entry);
                self.entries.len() - 1
            }
        };
        let names: Vec<String> = self.entries[position]
            .names()
            .map(|n| n.trim().to_lowercase())
            .filter(|n| !n.is_empty())
            .collect();
        for name in names {
            self.index.insert(name, position);
        }
    }

    /// Parses `{"deny_list": [...]}` or a bare array of entries.
    pub fn parse(source_name: &str, content: &str) -> Result<Vec<DenyListEntry>> {
        let raw: RawDenyList =
            serde_json::from_str(content).map_err(|e| ValidatorError::DenyListError {
                source_name: source_name.to_string(),
                details: e.to_string(),
            })?;
        Ok(match raw {
            RawDenyList::Wrapped { deny_list } => deny_list,
            RawDenyList::Bare(entries) => entries,
        })
    }

    /// Builds one deny list from several documents, skipping unparseable ones.
    pub fn load(documents: Vec<(String, String)>) -> (Self, Vec<String>) {
        let mut entries = Vec::new();
        let mut errors = Vec::new();
        for (source_name, content) in documents {
            match Self::parse(&source_name, &content) {
                Ok(parsed) => {
                    tracing::debug!(source = %source_name, entries = parsed.len(), "loaded deny list");
                    entries.extend(parsed);
                }
                Err(e) => {
                    tracing::warn!(source = %source_name, "skipping deny list: {}", e);
                    errors.push(format!("Deny list '{}' skipped: {}", source_name, e));
                }
            }
        }
        (Self::new(entries), errors)
    }

    /// Entry denying a component name.
    ///
    /// Matches the name or an alias exactly, then a denied name appearing as a
    /// whole separator-delimited part of the component name (`log4j` denies
    /// `log4j-core` but not `blog4jam`).
    pub fn check(&self, name: &str) -> Option<&DenyListEntry> {
        let name = name.trim().to_lowercase();
        if let Some(&position) = self.index.get(&name) {
            return Some(&self.entries[position]);
        }
        let mut denied: Vec<(&String, &usize)> = self
            .index
            .iter()
            .filter(|(denied_name, _)| contains_part(&name, denied_name))
            .collect();
        // longest denied name first so the most specific entry wins
        denied.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(b.0)));
        denied.first().map(|(_, position)| &self.entries[**position])
    }

    pub fn is_denied(&self, name: &str) -> bool {
        self.check(name).is_some()
    }

    pub fn entries(&self) -> &[DenyListEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn contains_part(name: &str, part: &str) -> bool {
    if part.is_empty() || part.len() >= name.len() {
        return false;
    }
    name.match_indices(part).any(|(start, _)| {
        let end = start + part.len();
        let before_ok = name[..start]
            .chars()
            .next_back()
            .map(|c| NAME_SEPARATORS.contains(&c))
            .unwrap_or(true);
        let after_ok = name[end..]
            .chars()
            .next()
            .map(|c| NAME_SEPARATORS.contains(&c))
            .unwrap_or(true);
        before_ok && after_ok
    })
}
