//! # Lookup Error Types Module
//!
//! Error kinds raised by the workshop catalog and machine info lookups.
//! Every variant is recovered at the handler boundary: the user gets a short
//! message and a back button, the full context goes to the log.

use std::path::PathBuf;

/// Errors produced while resolving workshops, machines and machine info
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// Workshop name is not part of the configured set
    UnknownWorkshop(String),
    /// Backing file does not exist on disk
    ResourceNotFound { path: PathBuf },
    /// Backing file exists but cannot be opened or parsed
    ResourceUnreadable { path: PathBuf, cause: String },
    /// Spreadsheet has no column with the expected header
    SchemaMismatch { path: PathBuf, column: String },
    /// Machine identifier has no block in the info file
    NotFound { machine: String },
}

impl LookupError {
    /// Localization key of the message shown to the user for this error
    pub fn message_key(&self) -> &'static str {
        match self {
            LookupError::UnknownWorkshop(_) => "error-unknown-workshop",
            LookupError::ResourceNotFound { .. } => "error-file-not-found",
            LookupError::ResourceUnreadable { .. } => "error-file-unreadable",
            LookupError::SchemaMismatch { .. } => "error-missing-column",
            LookupError::NotFound { .. } => "error-machine-not-found",
        }
    }
}

impl std::fmt::Display for LookupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupError::UnknownWorkshop(name) => write!(f, "Unknown workshop: {name}"),
            LookupError::ResourceNotFound { path } => {
                write!(f, "Resource not found: {}", path.display())
            }
            LookupError::ResourceUnreadable { path, cause } => {
                write!(f, "Resource unreadable: {}: {cause}", path.display())
            }
            LookupError::SchemaMismatch { path, column } => {
                write!(f, "Column '{column}' missing in {}", path.display())
            }
            LookupError::NotFound { machine } => write!(f, "No info for machine: {machine}"),
        }
    }
}

impl std::error::Error for LookupError {}
