use crate::compatibility::domain::Component;
use crate::shared::Result;
use std::path::Path;

/// ComponentReader port for loading the normalized component inventory
///
/// The inventory is a JSON document produced upstream from an SBOM: either a
/// bare array of components or an object with a `components` array.
pub trait ComponentReader {
    /// Reads and parses the components file
    ///
    /// # Arguments
    /// * `path` - Path to the components JSON document
    ///
    /// # Returns
    /// The components in document order
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file does not exist
    /// - The file is not valid JSON or has neither accepted shape
    fn read_components(&self, path: &Path) -> Result<Vec<Component>>;
}
