//! Layered error definitions
//!
//! Categorized by source: config / payload / generator / dispatch

use thiserror::Error;

use crate::FeedType;

/// Public message for every internal failure. Detail never leaves the server.
pub const INTERNAL_ERROR_MESSAGE: &str = "Failed to generate SQL";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ContractError {
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Failure to turn a request body into a [`crate::FeedRequest`]
#[derive(Debug, Error)]
pub enum PayloadError {
    /// Body is not valid JSON
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Body is JSON but not an object
    #[error("payload must be a JSON object, got {found}")]
    NotAnObject { found: &'static str },

    /// Body exceeds the configured limit
    #[error("payload exceeds {limit} bytes")]
    TooLarge { limit: usize },

    /// Transport read failure
    #[error("failed to read payload: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure raised by a SQL generator collaborator
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// Generator state cannot produce a query (e.g. missing table reference)
    #[error("template error for {feed}: {message}")]
    Template { feed: FeedType, message: String },

    /// Input could not be rendered into the template
    #[error("render error for {feed}: {message}")]
    Render { feed: FeedType, message: String },
}

impl GeneratorError {
    pub fn template(feed: FeedType, message: impl Into<String>) -> Self {
        Self::Template {
            feed,
            message: message.into(),
        }
    }

    pub fn render(feed: FeedType, message: impl Into<String>) -> Self {
        Self::Render {
            feed,
            message: message.into(),
        }
    }
}

/// Outcome of a failed dispatch
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A required field for the resolved feed is missing (client error)
    #[error("{message}")]
    Validation {
        feed: FeedType,
        message: &'static str,
    },

    /// Payload or generator failure (server error). `reason` is for logs only.
    #[error("{}", INTERNAL_ERROR_MESSAGE)]
    Internal { reason: String },
}

impl DispatchError {
    /// Missing-field error for `feed`
    pub fn validation(feed: FeedType) -> Self {
        Self::Validation {
            feed,
            message: feed.missing_fields_message(),
        }
    }

    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal {
            reason: reason.into(),
        }
    }

    /// Status code reported to the caller
    pub fn status(&self) -> crate::ReplyStatus {
        match self {
            Self::Validation { .. } => crate::ReplyStatus::BadRequest,
            Self::Internal { .. } => crate::ReplyStatus::InternalServerError,
        }
    }

    /// Message safe to show the caller
    pub fn message(&self) -> &'static str {
        match self {
            Self::Validation { message, .. } => *message,
            Self::Internal { .. } => INTERNAL_ERROR_MESSAGE,
        }
    }
}

impl From<PayloadError> for DispatchError {
    fn from(err: PayloadError) -> Self {
        Self::internal(err.to_string())
    }
}

impl From<GeneratorError> for DispatchError {
    fn from(err: GeneratorError) -> Self {
        Self::internal(err.to_string())
    }
}
