use crate::shared::Result;
use std::path::Path;

/// DocumentReader port for reading knowledge-base, deny-list and alias files
///
/// Parsing stays in the domain; this port only hands back raw content so
/// malformed files can be skipped with a warning by the caller.
pub trait DocumentReader {
    /// Reads a whole document as UTF-8 text
    ///
    /// # Errors
    /// Returns an error if the file does not exist, is not a regular file
    /// or cannot be read
    fn read_document(&self, path: &Path) -> Result<String>;
}
