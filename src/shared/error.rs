use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application.
///
/// CI pipelines use these to tell a clean migration report apart from one
/// that found blocking components or from a run that could not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success - analysis completed (and no blocking components, if requested)
    Success = 0,
    /// Incompatible components were found and `--fail-on-incompatible` was set
    IncompatibleComponentsFound = 1,
    /// Invalid command-line arguments (clap parsing errors)
    InvalidArguments = 2,
    /// Application error (unreadable input, no knowledge base, file I/O error, etc.)
    ApplicationError = 3,
}

impl ExitCode {
    /// Convert to i32 for use with std::process::exit
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitCode::Success => write!(f, "Success (0)"),
            ExitCode::IncompatibleComponentsFound => write!(f, "Incompatible Components Found (1)"),
            ExitCode::InvalidArguments => write!(f, "Invalid Arguments (2)"),
            ExitCode::ApplicationError => write!(f, "Application Error (3)"),
        }
    }
}

/// Application-specific errors for compatibility analysis.
///
/// Messages are written for the person running the tool: each one names the
/// offending input and ends with a hint on how to fix it.
#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("Components file not found: {path}\n\n💡 Hint: {suggestion}")]
    ComponentsNotFound { path: PathBuf, suggestion: String },

    #[error("Failed to parse components file: {path}\nDetails: {details}\n\n💡 Hint: Provide a JSON array of components or an object with a \"components\" array")]
    ComponentsParseError { path: PathBuf, details: String },

    #[error("Invalid knowledge base: {source_name}\nDetails: {details}\n\n💡 Hint: Knowledge base files must contain a \"software_compatibility\" list whose entries have \"name\" and \"compatibility\"")]
    KnowledgeBaseError {
        source_name: String,
        details: String,
    },

    #[error("No knowledge base could be loaded ({attempted} file(s) attempted)\n\n💡 Hint: Pass at least one valid knowledge base with --knowledge-base or list one under 'knowledge_bases' in the config file")]
    NoKnowledgeBaseLoaded { attempted: usize },

    #[error("Invalid deny list: {source_name}\nDetails: {details}\n\n💡 Hint: Deny list files must contain a \"deny_list\" array (or a bare array) of entries with \"package_name\" and \"reason\"")]
    DenyListError {
        source_name: String,
        details: String,
    },

    #[error("Failed to write to file: {path}\nDetails: {details}\n\n💡 Hint: Please verify that the directory exists and you have write permissions")]
    FileWriteError { path: PathBuf, details: String },

    #[error("Failed to read file: {path}\nDetails: {details}\n\n💡 Hint: Please verify that the file exists and you have read permissions")]
    FileReadError { path: PathBuf, details: String },

    #[error("Security violation: {path}\nReason: {reason}\n\n💡 Hint: {hint}")]
    SecurityError {
        path: PathBuf,
        reason: String,
        hint: String,
    },

    /// Validation error for value objects and configuration
    #[error("Validation error: {message}")]
    Validation { message: String },
}
