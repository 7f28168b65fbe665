//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// One or more requests produced a non-200 reply
    #[error("{failed} of {total} request(s) failed (last status {status})")]
    RequestFailed {
        status: u16,
        failed: u64,
        total: u64,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::RequestFailed { status, .. } if *status < 500 => 2,
            Self::RequestFailed { .. } => 3,
            _ => 1,
        }
    }
}
