//! FeedResponse / DispatchReply - outbound contract
//!
//! A reply carries exactly one of `sql` or `error`, never both.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{DispatchError, FeedType};

/// Status code attached to a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplyStatus {
    Ok,
    BadRequest,
    InternalServerError,
}

impl ReplyStatus {
    pub fn as_u16(&self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::BadRequest => 400,
            Self::InternalServerError => 500,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for ReplyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

/// Response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeedResponse {
    Sql { sql: String },
    Error { error: String },
}

impl FeedResponse {
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::Sql { sql } => Some(sql),
            Self::Error { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Sql { .. } => None,
            Self::Error { error } => Some(error),
        }
    }
}

/// Response body plus status code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReply {
    pub status: ReplyStatus,
    pub body: FeedResponse,
    /// Feed the request resolved to; `None` when the payload never parsed.
    /// Not part of the wire body.
    pub feed: Option<FeedType>,
}

impl DispatchReply {
    /// 200 reply carrying generated SQL
    pub fn success(sql: String) -> Self {
        Self {
            status: ReplyStatus::Ok,
            body: FeedResponse::Sql { sql },
            feed: None,
        }
    }

    /// Error reply; only the public message is kept
    pub fn failure(err: &DispatchError) -> Self {
        Self {
            status: err.status(),
            body: FeedResponse::Error {
                error: err.message().to_string(),
            },
            feed: None,
        }
    }

    /// Attach the resolved feed
    pub fn with_feed(mut self, feed: Option<FeedType>) -> Self {
        self.feed = feed;
        self
    }

    /// Feed label for logs and metrics
    pub fn feed_label(&self) -> &'static str {
        self.feed.map_or("unknown", |feed| feed.as_str())
    }

    /// Serialize the body as JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.body)
    }

    /// Serialize the body as pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.body)
    }
}

impl From<Result<String, DispatchError>> for DispatchReply {
    fn from(result: Result<String, DispatchError>) -> Self {
        match result {
            Ok(sql) => Self::success(sql),
            Err(err) => Self::failure(&err),
        }
    }
}
