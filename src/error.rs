//! Error types for confstore
//!
//! Provides structured error types with suggestions for common issues.

use serde::Serialize;
use thiserror::Error;

/// Result type for store operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Main error type for configuration operations
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Path could not be resolved to a loadable file
    #[error("Cannot resolve configuration file: {path}")]
    FileResolution { path: String, searched: Vec<String> },

    /// File loaded but did not contain a key/value object
    #[error("Invalid configuration file export, object expected: {path} (found {found})")]
    InvalidFileExport { path: String, found: String },

    /// File exists but could not be parsed
    #[error("Failed to parse configuration file {path}: {message}")]
    FileParse { path: String, message: String },

    /// Strict interpolation hit a reference with no value
    #[error("{name} is not defined (referenced by '{key}')")]
    UnresolvedReference { name: String, key: String },

    /// Malformed argument list
    #[error("Argument error: {0}")]
    Argument(String),

    /// Invalid environment match pattern
    #[error("Invalid match pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Serializable error summary for host applications
#[derive(Debug, Serialize, Clone)]
pub struct ErrorInfo {
    pub message: String,
    pub error_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub searched: Vec<String>,
}

impl From<&ConfigError> for ErrorInfo {
    fn from(err: &ConfigError) -> Self {
        let (error_type, suggestion, searched) = match err {
            ConfigError::FileResolution { searched, .. } => (
                "file_resolution",
                Some("Check the path; .json and .toml extensions are tried automatically".to_string()),
                searched.clone(),
            ),
            ConfigError::InvalidFileExport { .. } => (
                "invalid_file_export",
                Some("The top level of a configuration file must be an object".to_string()),
                vec![],
            ),
            ConfigError::FileParse { .. } => ("file_parse", None, vec![]),
            ConfigError::UnresolvedReference { name, .. } => (
                "unresolved_reference",
                Some(format!(
                    "Set {} in the environment, escape the reference as \\${{{}}}, or interpolate with strict disabled",
                    name, name
                )),
                vec![],
            ),
            ConfigError::Argument(_) => ("argument", None, vec![]),
            ConfigError::Pattern(_) => (
                "pattern",
                Some("The environment match pattern must be a valid regular expression".to_string()),
                vec![],
            ),
            ConfigError::Io(_) => ("io_error", None, vec![]),
        };

        ErrorInfo {
            message: err.to_string(),
            error_type: error_type.to_string(),
            suggestion,
            searched,
        }
    }
}
