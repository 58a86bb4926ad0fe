use crate::shared::error::ValidatorError;
use crate::shared::Result;
use std::fs;
use std::path::Path;

/// Maximum size of any input document (components, knowledge base, deny list): 100 MB
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Validates that a path exists and is a regular file (not a directory or symlink)
///
/// # Security
/// Uses `symlink_metadata()` so the link itself is inspected, not its target.
///
/// # Arguments
/// * `path` - The path to validate
/// * `file_description` - Description of the file (e.g., "knowledge base", "deny list")
pub fn validate_regular_file(path: &Path, file_description: &str) -> Result<()> {
    let metadata = fs::symlink_metadata(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {} metadata: {}", file_description, e))?;

    if metadata.is_symlink() {
        return Err(ValidatorError::SecurityError {
            path: path.to_path_buf(),
            reason: format!("{} is a symbolic link", file_description),
            hint: "Pass the real file path instead of a symbolic link".to_string(),
        }
        .into());
    }

    if !metadata.is_file() {
        anyhow::bail!("{} is not a regular file", path.display());
    }

    Ok(())
}

/// Validates file size is within acceptable limits
pub fn validate_file_size(file_size: u64, path: &Path, max_size: u64) -> Result<()> {
    if file_size > max_size {
        anyhow::bail!(
            "Security: {} is too large ({} bytes). Maximum allowed size is {} bytes.",
            path.display(),
            file_size,
            max_size
        );
    }
    Ok(())
}

/// Reads an input document after the regular-file and size checks.
pub fn read_checked_file(path: &Path, file_description: &str) -> Result<String> {
    validate_regular_file(path, file_description)?;
    let size = fs::metadata(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {} metadata: {}", file_description, e))?
        .len();
    validate_file_size(size, path, MAX_FILE_SIZE)?;

    fs::read_to_string(path).map_err(|e| {
        ValidatorError::FileReadError {
            path: path.to_path_buf(),
            details: e.to_string(),
        }
        .into()
    })
}

/// Ensures a directory used for generated manifests or probe output is usable.
///
/// The directory is created when missing; an existing symlink is rejected so
/// generated files cannot be redirected elsewhere.
pub fn ensure_output_directory(path: &Path) -> Result<()> {
    if let Ok(metadata) = fs::symlink_metadata(path) {
        if metadata.is_symlink() {
            return Err(ValidatorError::SecurityError {
                path: path.to_path_buf(),
                reason: "Output directory is a symbolic link".to_string(),
                hint: "Choose a real directory for --output-dir".to_string(),
            }
            .into());
        }
        if !metadata.is_dir() {
            anyhow::bail!("{} exists and is not a directory", path.display());
        }
        return Ok(());
    }

    fs::create_dir_all(path).map_err(|e| {
        ValidatorError::FileWriteError {
            path: path.to_path_buf(),
            details: format!("Failed to create directory: {}", e),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_validate_regular_file_success() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("kb.json");
        fs::write(&file_path, "{}").unwrap();

        assert!(validate_regular_file(&file_path, "knowledge base").is_ok());
    }

    #[test]
    fn test_validate_regular_file_is_directory() {
        let temp_dir = TempDir::new().unwrap();
        let result = validate_regular_file(temp_dir.path(), "knowledge base");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not a regular file"));
    }

    #[cfg(unix)]
    #[test]
    fn test_validate_regular_file_rejects_symlink() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("real.json");
        let link = temp_dir.path().join("link.json");
        fs::write(&target, "{}").unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let err = validate_regular_file(&link, "deny list").unwrap_err();
        assert!(err.to_string().contains("Security violation"));
    }

    #[test]
    fn test_validate_file_size_exceeds_limit() {
        let path = PathBuf::from("/test/file.json");
        let result = validate_file_size(MAX_FILE_SIZE + 1, &path, MAX_FILE_SIZE);
        assert!(result.unwrap_err().to_string().contains("too large"));
    }

    #[test]
    fn test_read_checked_file_returns_content() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("components.json");
        fs::write(&file_path, "[]").unwrap();

        assert_eq!(read_checked_file(&file_path, "components").unwrap(), "[]");
    }

    #[test]
    fn test_read_checked_file_missing() {
        let result = read_checked_file(Path::new("/nonexistent/kb.json"), "knowledge base");
        assert!(result.is_err());
    }

    #[test]
    fn test_ensure_output_directory_creates_nested() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("reports").join("manifests");

        ensure_output_directory(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_ensure_output_directory_rejects_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("not-a-dir");
        fs::write(&file_path, "x").unwrap();

        assert!(ensure_output_directory(&file_path).is_err());
    }
}
