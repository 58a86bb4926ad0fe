use graviton_validator::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Mock DocumentReader serving knowledge bases, deny lists and alias files from memory
#[derive(Default)]
pub struct MockDocumentReader {
    documents: HashMap<PathBuf, String>,
}

impl MockDocumentReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, path: &str, content: &str) -> Self {
        self.documents
            .insert(PathBuf::from(path), content.to_string());
        self
    }
}

impl DocumentReader for MockDocumentReader {
    fn read_document(&self, path: &Path) -> Result<String> {
        self.documents
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Mock document not found: {}", path.display()))
    }
}
