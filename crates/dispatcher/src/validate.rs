//! Request validation
//!
//! Resolves the feed variant and checks its required fields, producing a
//! [`FeedQuery`] ready for the generator. Fields that belong to other
//! variants are never inspected.

use contracts::{resolve_trend_days, DateRange, DispatchError, FeedQuery, FeedRequest, FeedType};

/// Validate `request` against the rules of its resolved feed.
///
/// # Errors
/// [`DispatchError::Validation`] when a required field is missing or empty.
pub fn validate(request: &FeedRequest) -> Result<FeedQuery, DispatchError> {
    let feed = request.feed();
    match feed {
        FeedType::Legacy => date_range(request, feed).map(FeedQuery::Legacy),
        FeedType::FeedA => date_range(request, feed).map(FeedQuery::FeedA),
        FeedType::FeedB => date_range(request, feed).map(FeedQuery::FeedB),
        FeedType::FeedC => date_range(request, feed).map(FeedQuery::FeedC),
        FeedType::TrendSeries => {
            let subid = present(&request.subid).ok_or_else(|| DispatchError::validation(feed))?;
            Ok(FeedQuery::TrendSeries {
                subid: subid.to_string(),
                days: resolve_trend_days(request.days),
            })
        }
    }
}

fn date_range(request: &FeedRequest, feed: FeedType) -> Result<DateRange, DispatchError> {
    match (present(&request.start_date), present(&request.end_date)) {
        (Some(start), Some(end)) => Ok(DateRange::new(start, end)),
        _ => Err(DispatchError::validation(feed)),
    }
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}
