//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;

use contracts::{FeedType, WarehouseConfig, DEFAULT_TREND_DAYS};

use crate::cli::InfoArgs;
use crate::commands::load_config;

/// Feed catalogue for JSON output
#[derive(Serialize)]
struct ServiceInfo {
    version: String,
    warehouse: WarehouseInfo,
    feeds: Vec<FeedInfo>,
    max_body_bytes: usize,
}

#[derive(Serialize)]
struct WarehouseInfo {
    project: String,
    dataset: String,
    timestamp_column: String,
}

#[derive(Serialize)]
struct FeedInfo {
    feed_type: &'static str,
    required_fields: &'static [&'static str],
    table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    default_days: Option<u32>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;

    if args.json {
        let info = build_service_info(&config);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize service info")?;
        println!("{}", json);
    } else {
        print_service_info(&config);
    }

    Ok(())
}

fn build_service_info(config: &WarehouseConfig) -> ServiceInfo {
    let feeds = FeedType::ALL
        .iter()
        .map(|feed| FeedInfo {
            feed_type: feed.as_str(),
            required_fields: feed.required_fields(),
            table: config.table_ref(*feed),
            default_days: matches!(feed, FeedType::TrendSeries).then_some(DEFAULT_TREND_DAYS),
        })
        .collect();

    ServiceInfo {
        version: format!("{:?}", config.version),
        warehouse: WarehouseInfo {
            project: config.warehouse.project.clone(),
            dataset: config.warehouse.dataset.clone(),
            timestamp_column: config.warehouse.timestamp_column.clone(),
        },
        feeds,
        max_body_bytes: config.dispatcher.max_body_bytes,
    }
}

fn print_service_info(config: &WarehouseConfig) {
    println!("feedsql configuration ({:?})\n", config.version);

    println!("Warehouse");
    println!("   ├─ Project: {}", config.warehouse.project);
    println!("   ├─ Dataset: {}", config.warehouse.dataset);
    println!("   └─ Timestamp column: {}", config.warehouse.timestamp_column);

    println!("\nFeeds ({})", FeedType::ALL.len());
    for (i, feed) in FeedType::ALL.iter().enumerate() {
        let is_last = i == FeedType::ALL.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        println!("   {} {}", prefix, feed);
        println!("   {}  ├─ Requires: {}", child_prefix, feed.required_fields().join(", "));
        if *feed == FeedType::TrendSeries {
            println!("   {}  ├─ Default days: {}", child_prefix, DEFAULT_TREND_DAYS);
        }
        println!("   {}  └─ Table: {}", child_prefix, config.table_ref(*feed));
    }

    println!("\nUnknown or missing feedType values are served as legacy.");
    println!("Max request body: {} bytes\n", config.dispatcher.max_body_bytes);
}
