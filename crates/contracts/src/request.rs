//! FeedRequest - inbound payload of the feed endpoint
//!
//! Fields are normalised while deserialising: falsy values (null, false, zero,
//! empty string) become `None`, so validation only ever has to check
//! `Option::is_some`. Any other value is kept as text.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::{FeedType, PayloadError};

/// Inbound request payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedRequest {
    /// `YYYY-MM-DD`, opaque at this layer
    #[serde(default, deserialize_with = "present_text")]
    pub start_date: Option<String>,

    /// `YYYY-MM-DD`, opaque at this layer
    #[serde(default, deserialize_with = "present_text")]
    pub end_date: Option<String>,

    /// Raw selector; see [`FeedRequest::feed`]
    #[serde(default, deserialize_with = "selector_text")]
    pub feed_type: Option<String>,

    /// Identifier for `trend_series`
    #[serde(default, deserialize_with = "present_text")]
    pub subid: Option<String>,

    /// Window size for `trend_series`; `None` when absent or unusable
    #[serde(default, deserialize_with = "positive_days")]
    pub days: Option<u32>,
}

impl FeedRequest {
    /// Empty request (resolves to the legacy feed)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the raw feed selector
    pub fn with_feed_type(mut self, feed_type: impl Into<String>) -> Self {
        self.feed_type = Some(feed_type.into());
        self
    }

    /// Set both range bounds
    pub fn with_dates(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start_date = Some(start.into());
        self.end_date = Some(end.into());
        self
    }

    /// Set the trend subid
    pub fn with_subid(mut self, subid: impl Into<String>) -> Self {
        self.subid = Some(subid.into());
        self
    }

    /// Set the trend window
    pub fn with_days(mut self, days: u32) -> Self {
        self.days = Some(days);
        self
    }

    /// Resolved feed variant. Never fails.
    pub fn feed(&self) -> FeedType {
        FeedType::resolve(self.feed_type.as_deref())
    }

    /// Decode a request from a JSON document.
    ///
    /// # Errors
    /// The document is not a JSON object.
    pub fn from_value(value: &Value) -> Result<Self, PayloadError> {
        if !value.is_object() {
            return Err(PayloadError::NotAnObject {
                found: json_kind(value),
            });
        }
        Ok(Self::deserialize(value)?)
    }

    /// Decode a request from raw body bytes.
    ///
    /// # Errors
    /// Malformed JSON, or a document that is not an object.
    pub fn from_slice(body: &[u8]) -> Result<Self, PayloadError> {
        let value: Value = serde_json::from_slice(body)?;
        Self::from_value(&value)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Text of a truthy value; non-strings keep their JSON text
fn present_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(Value::Number(n)) if n.as_f64().map_or(true, |f| f == 0.0) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Only string selectors can name a feed; everything else is legacy
fn selector_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

/// Positive integers (JSON integers or digit strings) that fit in `u32`
fn positive_days<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let days = match value {
        Some(Value::Number(n)) => n.as_u64().and_then(|d| u32::try_from(d).ok()),
        Some(Value::String(s)) => s.trim().parse::<u32>().ok(),
        _ => None,
    };
    Ok(days.filter(|d| *d > 0))
}
