mod cli;
mod commands;
mod config;
mod output;

use std::process;

use anyhow::{Context, Result};
use bili_catalog::{HistoryCursor, SearchQuery, SendDanmakuRequest};
use clap::{CommandFactory, Parser};
#[cfg(feature = "colored-output")]
use colored::*;
use tracing::{Level, error};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use crate::{
    cli::{Args, Commands},
    commands::CommandExecutor,
    config::AppConfig,
    output::OutputManager,
};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let json_errors = args.output.is_some_and(|o| o.is_json());

    if let Err(e) = run(args).await {
        if json_errors {
            let error_json = serde_json::json!({
                "status": "error",
                "message": format!("{e:#}"),
            });
            println!("{error_json}");
        } else {
            error!("Application error: {:#}", e);
            #[cfg(feature = "colored-output")]
            {
                eprintln!("{} {:#}", "Error:".red().bold(), e);
            }
            #[cfg(not(feature = "colored-output"))]
            {
                eprintln!("Error: {:#}", e);
            }
        }
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    init_logging(args.verbose, args.quiet);

    let config_path = AppConfig::resolve_path(args.config.as_deref())?;

    // commands that never touch the network; config runs before loading so
    // --reset can repair a broken file
    match &args.command {
        Commands::Config { show, reset } => {
            println!("{}", AppConfig::run_command(&config_path, *show, *reset)?);
            return Ok(());
        }
        Commands::Completions { shell } => {
            let mut cmd = Args::command();
            let bin_name = cmd.get_name().to_string();
            clap_complete::generate(*shell, &mut cmd, bin_name, &mut std::io::stdout());
            return Ok(());
        }
        _ => {}
    }

    let mut config = AppConfig::load(&config_path)?;

    if args.cookies.is_some() {
        config.cookies = args.cookies;
    }
    let format = args.output.unwrap_or(config.output);
    let output = OutputManager::new(format, config.colored);
    let settings_path = AppConfig::settings_path(&config_path);
    let executor = CommandExecutor::new(config, settings_path, output)?;

    match args.command {
        Commands::Feed { size } => executor.feed(size).await?,
        Commands::Video { id } => executor.video(&id).await?,
        Commands::Related { id } => executor.related(&id).await?,
        Commands::Play { target, quality } => executor.play(&target, quality).await?,
        Commands::Search {
            keyword,
            kind,
            page,
        } => {
            let query = SearchQuery::new(keyword)
                .kind(kind.into())
                .page(page.page)
                .page_size(page.size);
            executor.search(query).await?
        }
        Commands::Hot { limit } => executor.hot(limit).await?,
        Commands::Danmaku {
            target,
            all,
            report,
        } => executor.danmaku(&target, all, report).await?,
        Commands::Send {
            target,
            message,
            at,
            color,
            mode,
            font_size,
        } => {
            if !at.is_finite() || at < 0.0 {
                anyhow::bail!("--at must be a non-negative number of seconds");
            }
            let mut request = SendDanmakuRequest::new(0, message)
                .progress((at * 1000.0).round() as u64)
                .mode(mode.into());
            if let Some(color) = color {
                request = request.color(color);
            }
            if let Some(size) = font_size {
                request = request.font_size(size);
            }
            executor.send(&target, request).await?
        }
        Commands::Me => executor.me().await?,
        Commands::Uploads { mid, order, page } => {
            executor.uploads(mid, order.into(), page.into()).await?
        }
        Commands::Favorites { mid, folder, page } => {
            executor.favorites(mid, folder, page.into()).await?
        }
        Commands::History {
            max,
            view_at,
            business,
            size,
        } => {
            let cursor = HistoryCursor {
                max,
                view_at,
                business,
            };
            executor.history(cursor, size).await?
        }
        Commands::Comments { id, sort, page } => {
            executor.comments(&id, sort.into(), page.into()).await?
        }
        Commands::Followers { mid, page } => executor.followers(mid, page.into()).await?,
        Commands::Following { mid, page } => executor.following(mid, page.into()).await?,
        Commands::Ranking { rid } => executor.ranking(rid).await?,
        Commands::Region { rid, page } => executor.region(rid, page.into()).await?,
        Commands::Unread => executor.unread().await?,
        Commands::At { id, time } => executor.at(id, time).await?,
        Commands::Live { page } => executor.live(page.into()).await?,
        Commands::LivePlay { room_id, qn } => executor.live_play(room_id, qn).await?,
        Commands::Settings { action } => executor
            .settings(action)
            .context("failed to update danmaku settings")?,
        Commands::Config { .. } | Commands::Completions { .. } => {}
    }

    Ok(())
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(verbose),
        )
        .init();
}
