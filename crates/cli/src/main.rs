//! # feedsql CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载与验证
//! - 请求读取与 SQL 生成（单条或 NDJSON 批量）
//! - 退出码映射：400 → 2，500 → 3，其他错误 → 1

mod cli;
mod commands;
mod error;

use std::process::ExitCode;

use clap::Parser;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_generate, run_info, run_validate};
use error::CliError;
use observability::ObservabilityConfig;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = observability::init_with_config(observability_config(&cli)) {
        eprintln!("Failed to initialize logging: {e:#}");
        return ExitCode::FAILURE;
    }

    info!(version = env!("CARGO_PKG_VERSION"), "feedsql starting");

    // Execute command
    let result = match &cli.command {
        Commands::Generate(args) => run_generate(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            let code = e.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
            ExitCode::from(code)
        }
    }
}

/// Map CLI flags onto the observability setup
fn observability_config(cli: &Cli) -> ObservabilityConfig {
    let default_log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port: (cli.metrics_port != 0).then_some(cli.metrics_port),
        default_log_level: default_log_level.to_string(),
    }
}
