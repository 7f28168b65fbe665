//! FeedType - the closed set of feed variants
//!
//! Every inbound `feedType` value resolves to exactly one variant. Values that
//! are missing or unrecognised resolve to [`FeedType::Legacy`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Feed variant selected by a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedType {
    /// Original default report, used when no explicit feed type is given
    #[default]
    Legacy,
    FeedA,
    FeedB,
    FeedC,
    /// Per-subid time series over a day-count window
    TrendSeries,
}

impl FeedType {
    /// All variants, in wire order
    pub const ALL: [FeedType; 5] = [
        FeedType::Legacy,
        FeedType::FeedA,
        FeedType::FeedB,
        FeedType::FeedC,
        FeedType::TrendSeries,
    ];

    /// Resolve a raw `feedType` value.
    ///
    /// Total: anything other than the four named non-legacy values is legacy.
    pub fn resolve(raw: Option<&str>) -> Self {
        match raw {
            Some("feed_a") => Self::FeedA,
            Some("feed_b") => Self::FeedB,
            Some("feed_c") => Self::FeedC,
            Some("trend_series") => Self::TrendSeries,
            _ => Self::Legacy,
        }
    }

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::FeedA => "feed_a",
            Self::FeedB => "feed_b",
            Self::FeedC => "feed_c",
            Self::TrendSeries => "trend_series",
        }
    }

    /// Request fields that must be present for this variant
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Legacy | Self::FeedA | Self::FeedB | Self::FeedC => &["startDate", "endDate"],
            Self::TrendSeries => &["subid"],
        }
    }

    /// Message returned when a required field is missing
    pub fn missing_fields_message(&self) -> &'static str {
        match self {
            Self::Legacy => "Start date and end date are required",
            Self::FeedA => "Start date and end date are required for feed_a",
            Self::FeedB => "Start date and end date are required for feed_b",
            Self::FeedC => "Start date and end date are required for feed_c",
            Self::TrendSeries => "subid is required for trend_series",
        }
    }
}

impl fmt::Display for FeedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
