//! Error handling module for the wizard
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Validation failures and confirmation mismatches end up as an inline message
//! (a mismatch also rewinds the flow), degraded discovery as a fallback value;
//! the rest are reported when the flow ends.

use crate::config_file::PersistenceError;
use crate::validators::ValidationError;
use thiserror::Error;

/// Main error type for the wizard
#[derive(Error, Debug)]
pub enum WizardError {
    /// IO errors (file operations, terminal, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A candidate answer failed its question's validator
    #[error("{0}")]
    Validation(ValidationError),

    /// A confirmation field disagreed with the field it confirms
    #[error("{0}")]
    Mismatch(ValidationError),

    /// Hardware probing failed and a fallback was substituted
    #[error("Discovery degraded: {0}")]
    DiscoveryDegraded(String),

    /// Writing or verifying the answers file failed
    #[error("Persistence failure: {0}")]
    Persistence(#[from] PersistenceError),

    /// The install script failed to start or exited non-zero
    #[error("Installer failed: {0}")]
    ProcessLaunch(String),

    /// The question catalog is malformed (duplicate id, select without options)
    #[error("Catalog error: {0}")]
    Catalog(String),
}

/// Result type alias for wizard operations
pub type Result<T> = std::result::Result<T, WizardError>;

/// Mismatches get their own kind so the engine can rewind on them
impl From<ValidationError> for WizardError {
    fn from(err: ValidationError) -> Self {
        if err.is_mismatch() {
            Self::Mismatch(err)
        } else {
            Self::Validation(err)
        }
    }
}

impl WizardError {
    /// Create a degraded-discovery error
    pub fn discovery(msg: impl Into<String>) -> Self {
        Self::DiscoveryDegraded(msg.into())
    }

    /// Create an installer launch error
    pub fn process_launch(msg: impl Into<String>) -> Self {
        Self::ProcessLaunch(msg.into())
    }

    /// Create a catalog error
    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog(msg.into())
    }

    /// Id of the field a mismatched confirmation should be re-entered from
    pub fn mismatch_source(&self) -> Option<&str> {
        match self {
            Self::Mismatch(ValidationError::Mismatch { source_id, .. }) => Some(source_id),
            _ => None,
        }
    }
}
