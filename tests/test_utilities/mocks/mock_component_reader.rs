use graviton_validator::prelude::*;
use std::path::Path;

/// Mock ComponentReader returning a fixed component list
pub struct MockComponentReader {
    pub components: Vec<Component>,
    pub should_fail: bool,
}

impl MockComponentReader {
    pub fn new(components: Vec<Component>) -> Self {
        Self {
            components,
            should_fail: false,
        }
    }

    pub fn with_failure() -> Self {
        Self {
            components: Vec::new(),
            should_fail: true,
        }
    }
}

impl ComponentReader for MockComponentReader {
    fn read_components(&self, _path: &Path) -> Result<Vec<Component>> {
        if self.should_fail {
            anyhow::bail!("Mock components read failure");
        }
        Ok(self.components.clone())
    }
}
