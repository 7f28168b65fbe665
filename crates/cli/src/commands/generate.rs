//! `generate` command implementation.

use anyhow::{Context, Result};
use std::path::Path;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::info;

use contracts::DispatchReply;
use dispatcher::{DispatcherBuilder, FeedDispatcher, SqlGenerator};
use observability::DispatchStats;

use crate::cli::GenerateArgs;
use crate::commands::load_config;
use crate::error::CliError;

type Input = Box<dyn AsyncRead + Unpin + Send>;

/// Execute the `generate` command
pub async fn run_generate(args: &GenerateArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;

    let mut builder = DispatcherBuilder::new(config);
    if let Some(today) = args.today {
        info!(%today, "Pinning trend window end date");
        builder = builder.with_today(today);
    }
    let dispatcher = builder.build().context("Failed to build dispatcher")?;

    let mut stats = DispatchStats::new();
    let mut worst_failure = None;

    if args.ndjson {
        let input = open_input(args.payload.as_deref()).await?;
        let mut lines = BufReader::new(input).lines();
        while let Some(line) = lines.next_line().await.map_err(CliError::from)? {
            if line.trim().is_empty() {
                continue;
            }
            let reply = handle_timed(&dispatcher, &mut stats, line.as_bytes());
            emit(&reply, args.pretty)?;
            worst_failure = worst_status(worst_failure, &reply);
        }
        eprintln!("{}", stats.summary());
    } else {
        let reply = match &args.body {
            Some(body) => handle_timed(&dispatcher, &mut stats, body.as_bytes()),
            None => {
                let input = open_input(args.payload.as_deref()).await?;
                let started = Instant::now();
                let reply = dispatcher.handle_reader(input).await;
                stats.record(reply.feed_label(), reply.status.as_u16(), elapsed_ms(started));
                reply
            }
        };
        emit(&reply, args.pretty)?;
        worst_failure = worst_status(worst_failure, &reply);
    }

    match worst_failure {
        Some(status) => Err(CliError::RequestFailed {
            status,
            failed: stats.failures(),
            total: stats.total(),
        }
        .into()),
        None => Ok(()),
    }
}

/// Stdin for `None` or `-`, otherwise the named file
async fn open_input(path: Option<&Path>) -> Result<Input> {
    match path {
        None => Ok(Box::new(tokio::io::stdin())),
        Some(p) if p.as_os_str() == "-" => Ok(Box::new(tokio::io::stdin())),
        Some(p) => {
            let file = tokio::fs::File::open(p)
                .await
                .map_err(CliError::from)
                .with_context(|| format!("Failed to open payload {}", p.display()))?;
            Ok(Box::new(file))
        }
    }
}

fn handle_timed<G: SqlGenerator>(
    dispatcher: &FeedDispatcher<G>,
    stats: &mut DispatchStats,
    body: &[u8],
) -> DispatchReply {
    let started = Instant::now();
    let reply = dispatcher.handle_body(body);
    stats.record(reply.feed_label(), reply.status.as_u16(), elapsed_ms(started));
    reply
}

/// Highest failing status seen so far; 500 outranks 400
fn worst_status(worst: Option<u16>, reply: &DispatchReply) -> Option<u16> {
    if reply.status.is_success() {
        return worst;
    }
    let status = reply.status.as_u16();
    Some(worst.map_or(status, |w| w.max(status)))
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

fn emit(reply: &DispatchReply, pretty: bool) -> Result<()> {
    let json = if pretty {
        reply.to_json_pretty()
    } else {
        reply.to_json()
    }
    .context("Failed to serialize reply")?;
    println!("{}", json);
    Ok(())
}
