//! Query templates
//!
//! Date-range feeds share one shape (daily rows over an inclusive date range)
//! and differ only in their grouping dimensions and measures. The trend series
//! is keyed by a single subid instead of a caller-supplied range.

use contracts::FeedType;

use crate::literal::string_literal;

/// Shape of a date-range feed
#[derive(Debug, Clone, Copy)]
pub struct RangeTemplate {
    pub feed: FeedType,
    /// Grouping columns after `report_date`
    pub dimensions: &'static [&'static str],
    /// Aggregate expressions, already aliased
    pub measures: &'static [&'static str],
}

pub const LEGACY: RangeTemplate = RangeTemplate {
    feed: FeedType::Legacy,
    dimensions: &[],
    measures: &[
        "COUNT(*) AS events",
        "COUNT(DISTINCT subid) AS active_subids",
        "SUM(revenue) AS revenue",
    ],
};

pub const FEED_A: RangeTemplate = RangeTemplate {
    feed: FeedType::FeedA,
    dimensions: &["subid"],
    measures: &[
        "COUNTIF(event_type = 'click') AS clicks",
        "COUNTIF(event_type = 'conversion') AS conversions",
        "SAFE_DIVIDE(COUNTIF(event_type = 'conversion'), COUNTIF(event_type = 'click')) AS conversion_rate",
    ],
};

pub const FEED_B: RangeTemplate = RangeTemplate {
    feed: FeedType::FeedB,
    dimensions: &["subid"],
    measures: &[
        "SUM(revenue) AS revenue",
        "SUM(payout) AS payout",
        "SUM(revenue) - SUM(payout) AS margin",
    ],
};

pub const FEED_C: RangeTemplate = RangeTemplate {
    feed: FeedType::FeedC,
    dimensions: &["campaign_id"],
    measures: &[
        "SUM(impressions) AS impressions",
        "SUM(spend) AS spend",
        "SAFE_DIVIDE(SUM(spend) * 1000, SUM(impressions)) AS cpm",
    ],
};

/// Render a date-range feed over `[start, end]`.
pub fn render_range(
    template: &RangeTemplate,
    table: &str,
    timestamp_column: &str,
    start: &str,
    end: &str,
) -> String {
    let mut select = vec![format!("DATE({timestamp_column}) AS report_date")];
    select.extend(template.dimensions.iter().map(|d| d.to_string()));
    select.extend(template.measures.iter().map(|m| m.to_string()));

    let mut group = vec!["report_date"];
    group.extend(template.dimensions.iter().copied());
    let group = group.join(", ");

    [
        "SELECT".to_string(),
        indent_list(&select),
        format!("FROM {table}"),
        format!(
            "WHERE DATE({timestamp_column}) BETWEEN {} AND {}",
            string_literal(start),
            string_literal(end)
        ),
        format!("GROUP BY {group}"),
        format!("ORDER BY {group}"),
    ]
    .join("\n")
}

/// Render the trend series for `subid` over `[window_start, window_end]`.
pub fn render_trend_series(
    table: &str,
    timestamp_column: &str,
    subid: &str,
    window_start: &str,
    window_end: &str,
) -> String {
    let select = [
        format!("DATE({timestamp_column}) AS report_date"),
        "COUNT(*) AS events".to_string(),
        "COUNTIF(event_type = 'click') AS clicks".to_string(),
        "SUM(revenue) AS revenue".to_string(),
    ];

    [
        "SELECT".to_string(),
        indent_list(&select),
        format!("FROM {table}"),
        format!("WHERE subid = {}", string_literal(subid)),
        format!(
            "  AND DATE({timestamp_column}) BETWEEN {} AND {}",
            string_literal(window_start),
            string_literal(window_end)
        ),
        "GROUP BY report_date".to_string(),
        "ORDER BY report_date".to_string(),
    ]
    .join("\n")
}

fn indent_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("  {item}"))
        .collect::<Vec<_>>()
        .join(",\n")
}
