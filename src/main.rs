mod feed;
mod render;
mod run;
mod telegram;
mod utils;

use std::path::PathBuf;

use anyhow::{Context, Result};
use calmerge_core::config::CalmergeConfig;
use calmerge_core::control::{Intent, NoticeLevel};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::feed::HttpFeeds;
use crate::run::RunOptions;
use crate::telegram::TelegramBot;

#[derive(Parser)]
#[command(name = "calmerge")]
#[command(about = "Merge read-only calendar feeds into one managed calendar")]
struct Cli {
    /// Arm an override: sync the next skip day (or today with --first)
    #[arg(long = "override")]
    override_: bool,

    /// Cancel the armed override and retract what it synced
    #[arg(long)]
    cancel: bool,

    /// Show what would change without writing anything
    #[arg(long)]
    dry_run: bool,

    /// This is the first scheduled run of the day
    #[arg(long)]
    first: bool,

    /// This is the last scheduled run of the day
    #[arg(long)]
    last: bool,

    /// Config file (default ~/.config/calmerge/config.toml)
    #[arg(long, env = "CALMERGE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// List every planned event instead of counts
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let settings = CalmergeConfig::load(cli.config.as_deref())
        .and_then(CalmergeConfig::resolve)
        .context("Invalid configuration")?;

    let client = reqwest::Client::builder()
        .user_agent(concat!("calmerge/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Could not build HTTP client")?;

    let bot = settings
        .telegram
        .as_ref()
        .map(|t| TelegramBot::new(client.clone(), t));

    let options = RunOptions {
        intent: Intent {
            override_requested: cli.override_,
            cancel_requested: cli.cancel,
            first_run: cli.first,
            last_run: cli.last,
        },
        dry_run: cli.dry_run,
        verbose: cli.verbose,
    };

    let feeds = HttpFeeds::new(client);
    let report = run::execute(
        &settings,
        &options,
        &settings.target,
        bot.as_ref(),
        &feeds,
        chrono::Utc::now(),
    )
    .await?;
    info!(synced = report.synced, dry_run = options.dry_run, "run finished");

    for notice in &report.notices {
        match notice.level {
            NoticeLevel::Info => info!(message = %notice.message, "notice"),
            NoticeLevel::Warning => warn!(message = %notice.message, "notice"),
        }
        if options.dry_run {
            continue;
        }
        if let Some(bot) = &bot {
            if let Err(e) = bot.send(&notice.to_string()).await {
                warn!(error = %e, "could not deliver notice");
            }
        }
    }

    if !report.failures.is_empty() {
        anyhow::bail!(
            "{} operation(s) failed:\n  {}",
            report.failures.len(),
            report.failures.join("\n  ")
        );
    }

    Ok(())
}
