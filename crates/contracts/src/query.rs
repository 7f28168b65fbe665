//! FeedQuery - validated, generator-ready form of a request

use serde::{Deserialize, Serialize};

use crate::FeedType;

/// Window used by `trend_series` when the request gives no usable `days`
pub const DEFAULT_TREND_DAYS: u32 = 180;

/// Resolve the trend window size.
pub fn resolve_trend_days(days: Option<u32>) -> u32 {
    match days {
        Some(d) if d > 0 => d,
        _ => DEFAULT_TREND_DAYS,
    }
}

/// Inclusive date range, both bounds in `YYYY-MM-DD` form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

impl DateRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

/// A request whose required fields have been checked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "feed", rename_all = "snake_case")]
pub enum FeedQuery {
    Legacy(DateRange),
    FeedA(DateRange),
    FeedB(DateRange),
    FeedC(DateRange),
    TrendSeries { subid: String, days: u32 },
}

impl FeedQuery {
    /// Variant this query belongs to
    pub fn feed(&self) -> FeedType {
        match self {
            Self::Legacy(_) => FeedType::Legacy,
            Self::FeedA(_) => FeedType::FeedA,
            Self::FeedB(_) => FeedType::FeedB,
            Self::FeedC(_) => FeedType::FeedC,
            Self::TrendSeries { .. } => FeedType::TrendSeries,
        }
    }
}
