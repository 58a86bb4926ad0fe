use serde::{Deserialize, Serialize};

/// Explicit incompatibility override. Presence in a deny list is absolute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenyListEntry {
    #[serde(alias = "name")]
    pub package_name: String,
    pub reason: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_supported_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_alternative: Option<String>,
}

impl DenyListEntry {
    pub fn new(package_name: &str, reason: &str) -> Self {
        Self {
            package_name: package_name.to_string(),
            reason: reason.to_string(),
            aliases: Vec::new(),
            minimum_supported_version: None,
            recommended_alternative: None,
        }
    }

    pub fn with_alternative(mut self, alternative: &str) -> Self {
        self.recommended_alternative = Some(alternative.to_string());
        self
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_string()).collect();
        self
    }

    /// Canonical name followed by aliases.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.package_name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    /// Note recorded on a denied component.
    pub fn denial_note(&self) -> String {
        let mut note = format!("Explicitly denied: {}", self.reason);
        if let Some(alternative) = &self.recommended_alternative {
            note.push_str(&format!(". Alternative: {}", alternative));
        }
        note
    }
}
