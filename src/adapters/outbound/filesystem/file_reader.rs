use crate::compatibility::domain::Component;
use crate::ports::outbound::{ComponentReader, DocumentReader};
use crate::shared::error::ValidatorError;
use crate::shared::security::read_checked_file;
use crate::shared::Result;
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize)]
#[serde(untagged)]
enum ComponentsDocument {
    Wrapped { components: Vec<Component> },
    Bare(Vec<Component>),
}

/// FileSystemReader adapter for reading input documents from the file system
///
/// This adapter implements both ComponentReader and DocumentReader ports.
/// Every read goes through the shared regular-file and size checks.
pub struct FileSystemReader;

impl FileSystemReader {
    pub fn new() -> Self {
        Self
    }

    /// Parses a components document held in memory.
    pub fn parse_components(path: &Path, content: &str) -> Result<Vec<Component>> {
        let document: ComponentsDocument =
            serde_json::from_str(content).map_err(|e| ValidatorError::ComponentsParseError {
                path: path.to_path_buf(),
                details: e.to_string(),
            })?;
        Ok(match document {
            ComponentsDocument::Wrapped { components } => components,
            ComponentsDocument::Bare(components) => components,
        })
    }
}

impl Default for FileSystemReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentReader for FileSystemReader {
    fn read_components(&self, path: &Path) -> Result<Vec<Component>> {
        if !path.exists() {
            return Err(ValidatorError::ComponentsNotFound {
                path: path.to_path_buf(),
                suggestion: format!(
                    "Components file \"{}\" does not exist.\n   \
                     Please check the --input path.",
                    path.display()
                ),
            }
            .into());
        }

        let content = read_checked_file(path, "components file").map_err(|e| {
            ValidatorError::ComponentsParseError {
                path: path.to_path_buf(),
                details: e.to_string(),
            }
        })?;
        let components = Self::parse_components(path, &content)?;
        tracing::debug!(path = %path.display(), count = components.len(), "read components");
        Ok(components)
    }
}

impl DocumentReader for FileSystemReader {
    fn read_document(&self, path: &Path) -> Result<String> {
        read_checked_file(path, "input document")
    }
}
