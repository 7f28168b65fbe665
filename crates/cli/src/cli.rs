//! CLI argument definitions using clap.

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// feedsql - warehouse SQL for reporting feeds
#[derive(Parser, Debug)]
#[command(
    name = "feedsql",
    author,
    version,
    about = "Generate warehouse SQL for reporting feeds",
    long_about = "Validates feed requests (legacy, feed_a, feed_b, feed_c, trend_series) \n\
                  and renders the warehouse SQL for each one.\n\n\
                  Replies are printed as JSON: {\"sql\": ...} on success, \n\
                  {\"error\": ...} on failure."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "FEEDSQL_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format (logs go to stderr)
    #[arg(
        long,
        value_enum,
        default_value = "compact",
        global = true,
        env = "FEEDSQL_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value = "0", global = true, env = "FEEDSQL_METRICS_PORT")]
    pub metrics_port: u16,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate SQL for one request (or one per line with --ndjson)
    Generate(GenerateArgs),

    /// Validate configuration file
    Validate(ValidateArgs),

    /// Display feed and table information
    Info(InfoArgs),
}

/// Arguments for the `generate` command
#[derive(Parser, Debug, Clone)]
pub struct GenerateArgs {
    /// Path to configuration file (TOML or JSON); defaults apply when omitted
    #[arg(short, long, env = "FEEDSQL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Request payload file ("-" for stdin). Stdin is read when neither
    /// --payload nor --body is given.
    #[arg(short, long, conflicts_with = "body")]
    pub payload: Option<PathBuf>,

    /// Inline request payload
    #[arg(short, long)]
    pub body: Option<String>,

    /// Treat the input as newline-delimited requests
    #[arg(long, conflicts_with = "body")]
    pub ndjson: bool,

    /// Pin "today" for trend windows (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date, env = "FEEDSQL_TODAY")]
    pub today: Option<NaiveDate>,

    /// Pretty-print the reply
    #[arg(long)]
    pub pretty: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "feedsql.toml", env = "FEEDSQL_CONFIG")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file; defaults apply when omitted
    #[arg(short, long, env = "FEEDSQL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}
