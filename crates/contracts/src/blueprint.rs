//! WarehouseConfig - Config Loader output
//!
//! Describes where each feed's data lives in the warehouse and how the
//! dispatcher reads request bodies. Every field has a default, so an empty
//! configuration file is valid.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::FeedType;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct WarehouseConfig {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Warehouse location
    #[serde(default)]
    #[validate(nested)]
    pub warehouse: WarehouseSettings,

    /// Source table per feed
    #[serde(default)]
    #[validate(nested)]
    pub tables: FeedTables,

    /// Request handling limits
    #[serde(default)]
    #[validate(nested)]
    pub dispatcher: DispatcherSettings,
}

impl WarehouseConfig {
    /// Backtick-quoted `project.dataset.table` for a feed, as it appears in SQL
    pub fn table_ref(&self, feed: FeedType) -> String {
        format!(
            "`{}.{}.{}`",
            self.warehouse.project,
            self.warehouse.dataset,
            self.tables.table_for(feed)
        )
    }
}

/// Warehouse project / dataset settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WarehouseSettings {
    /// Warehouse project id
    #[serde(default = "default_project")]
    #[validate(length(min = 1))]
    pub project: String,

    /// Dataset holding the feed tables
    #[serde(default = "default_dataset")]
    #[validate(length(min = 1))]
    pub dataset: String,

    /// Event timestamp column shared by all feed tables
    #[serde(default = "default_timestamp_column")]
    #[validate(length(min = 1))]
    pub timestamp_column: String,
}

impl Default for WarehouseSettings {
    fn default() -> Self {
        Self {
            project: default_project(),
            dataset: default_dataset(),
            timestamp_column: default_timestamp_column(),
        }
    }
}

fn default_project() -> String {
    "analytics".to_string()
}

fn default_dataset() -> String {
    "reporting".to_string()
}

fn default_timestamp_column() -> String {
    "event_time".to_string()
}

/// Source table names, one per feed
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FeedTables {
    #[serde(default = "default_legacy_table")]
    #[validate(length(min = 1))]
    pub legacy: String,

    #[serde(default = "default_feed_a_table")]
    #[validate(length(min = 1))]
    pub feed_a: String,

    #[serde(default = "default_feed_b_table")]
    #[validate(length(min = 1))]
    pub feed_b: String,

    #[serde(default = "default_feed_c_table")]
    #[validate(length(min = 1))]
    pub feed_c: String,

    #[serde(default = "default_trend_series_table")]
    #[validate(length(min = 1))]
    pub trend_series: String,
}

impl FeedTables {
    pub fn table_for(&self, feed: FeedType) -> &str {
        match feed {
            FeedType::Legacy => &self.legacy,
            FeedType::FeedA => &self.feed_a,
            FeedType::FeedB => &self.feed_b,
            FeedType::FeedC => &self.feed_c,
            FeedType::TrendSeries => &self.trend_series,
        }
    }
}

impl Default for FeedTables {
    fn default() -> Self {
        Self {
            legacy: default_legacy_table(),
            feed_a: default_feed_a_table(),
            feed_b: default_feed_b_table(),
            feed_c: default_feed_c_table(),
            trend_series: default_trend_series_table(),
        }
    }
}

fn default_legacy_table() -> String {
    "report_events".to_string()
}

fn default_feed_a_table() -> String {
    "feed_a_events".to_string()
}

fn default_feed_b_table() -> String {
    "feed_b_events".to_string()
}

fn default_feed_c_table() -> String {
    "feed_c_events".to_string()
}

fn default_trend_series_table() -> String {
    "subid_daily_stats".to_string()
}

/// Request handling limits
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DispatcherSettings {
    /// Maximum accepted request body, in bytes
    #[serde(default = "default_max_body_bytes")]
    #[validate(range(min = 64, max = 67_108_864))]
    pub max_body_bytes: usize,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}
