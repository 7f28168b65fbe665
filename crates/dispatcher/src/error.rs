//! Dispatcher construction errors
//!
//! Per-request failures are [`contracts::DispatchError`]; this type only covers
//! building a dispatcher.

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Configuration rejected while building
    #[error("invalid dispatcher configuration: {0}")]
    InvalidConfig(#[from] contracts::ContractError),
}
