//! feedbot CLI: run the bot, or query the feeds from a terminal.
//!
//! Usage:
//!   feedbot run           Start the Telegram bot and health endpoint
//!   feedbot lc            Print today's LeetCode daily challenge
//!   feedbot quote AAPL    Print a stock quote
//!   feedbot status        Show configuration health
//!   feedbot init          Write a config template

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use feedbot_core::bus::{dispatch_outbound, MessageBus};
use feedbot_core::commands::handlers::normalize_symbol;
use feedbot_core::commands::Dispatcher;
use feedbot_core::config::{Config, ENV_FINNHUB_KEY};
use feedbot_core::feeds::clients_from_config;
use feedbot_core::format::{format_question_on, format_quote, today};
use feedbot_core::gateway::{health, CommandBridge};
#[cfg(feature = "telegram")]
use feedbot_core::gateway::channels::telegram::TelegramTransport;

#[derive(Parser)]
#[command(
    name = "feedbot",
    version,
    about = "Telegram bot relaying the LeetCode daily challenge and stock quotes"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot (default)
    Run,

    /// Print today's LeetCode daily challenge
    Lc,

    /// Print a stock quote
    Quote {
        /// Ticker symbol, e.g. AAPL
        symbol: String,
    },

    /// Show configuration status
    Status,

    /// Write a config template to ~/.feedbot/config.json
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; real deployments use the environment.
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run) | None => cmd_run().await?,
        Some(Commands::Lc) => cmd_lc().await?,
        Some(Commands::Quote { symbol }) => cmd_quote(&symbol).await?,
        Some(Commands::Status) => cmd_status()?,
        Some(Commands::Init) => cmd_init()?,
    }

    Ok(())
}

fn validate_config(config: &Config) -> Result<()> {
    report_config_errors(config.validate())
}

fn report_config_errors(result: std::result::Result<(), Vec<String>>) -> Result<()> {
    if let Err(errors) = result {
        eprintln!("\n  \x1b[31m❌ Configuration errors:\x1b[0m");
        for e in &errors {
            eprintln!("     • {}", e);
        }
        eprintln!();
        anyhow::bail!("Fix the above {} error(s) and try again", errors.len());
    }
    Ok(())
}

// ── Run Command ─────────────────────────────────────────────────────

async fn cmd_run() -> Result<()> {
    if cfg!(not(feature = "telegram")) {
        anyhow::bail!("feedbot was built without the `telegram` feature");
    }

    let config = Config::load()?;
    validate_config(&config)?;

    if !config.has_finnhub_key() {
        tracing::warn!(
            "{} is not set; stock quotes will answer with a configuration error",
            ENV_FINNHUB_KEY
        );
    }

    let dispatcher = Arc::new(Dispatcher::from_config(&config));
    let triggers = dispatcher
        .registry()
        .commands()
        .map(|c| c.trigger().trim_end())
        .collect::<Vec<_>>()
        .join(" ");
    let (bus, receivers) = MessageBus::new(100);
    let bus = Arc::new(bus);
    let cancel = CancellationToken::new();
    let mut tasks = Vec::new();

    // 1. Transport first, so its delivery callback exists before any reply.
    #[cfg(feature = "telegram")]
    {
        let transport = TelegramTransport::new(
            config.telegram.token.clone(),
            Arc::clone(&bus),
            config.telegram.allow_from.clone(),
        );
        tasks.push(tokio::spawn(async move {
            if let Err(e) = transport.run().await {
                tracing::error!("Telegram transport failed: {}", e);
            }
        }));
    }

    // 2. Outbound delivery.
    let subs = bus.subscribers();
    tasks.push(tokio::spawn(dispatch_outbound(subs, receivers.outbound_rx)));

    // 3. Command bridge.
    let bridge = CommandBridge::new(bus.outbound_sender(), dispatcher, cancel.clone());
    let inbound_rx = receivers.inbound_rx;
    tasks.push(tokio::spawn(async move {
        if let Err(e) = bridge.run(inbound_rx).await {
            tracing::error!("Command bridge failed: {}", e);
        }
    }));

    // 4. Health endpoint.
    if config.gateway.enabled {
        let host = config.gateway.host.clone();
        let port = config.gateway.port;
        let cancel_health = cancel.clone();
        tasks.push(tokio::spawn(async move {
            if let Err(e) = health::serve(&host, port, cancel_health).await {
                tracing::error!("Health server failed: {:#}", e);
            }
        }));
    }

    tracing::info!(
        commands = %triggers,
        health = config.gateway.enabled,
        port = config.gateway.port,
        "Bot started"
    );

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
            cancel.cancel();
        }
        _ = futures::future::join_all(tasks) => {}
    }

    Ok(())
}

// ── One-shot Commands ───────────────────────────────────────────────

async fn cmd_lc() -> Result<()> {
    let config = Config::load()?;
    report_config_errors(config.validate_feeds())?;
    let (leetcode, _) = clients_from_config(&config);

    let question = leetcode
        .fetch_daily_question()
        .await
        .context("Failed to fetch LeetCode daily question")?;

    println!(
        "{}",
        format_question_on(&question, today(), &config.feeds.leetcode.site_url)
    );
    Ok(())
}

async fn cmd_quote(symbol: &str) -> Result<()> {
    let config = Config::load()?;
    report_config_errors(config.validate_feeds())?;
    let symbol = normalize_symbol(symbol)?;
    let (_, finnhub) = clients_from_config(&config);

    let quote = finnhub
        .fetch_quote(&symbol)
        .await
        .context("Failed to fetch stock quote")?;
    let profile = finnhub.fetch_profile(&symbol).await.ok();

    println!("{}", format_quote(&symbol, &quote, profile.as_ref()));
    Ok(())
}

// ── Status / Init ───────────────────────────────────────────────────

fn cmd_status() -> Result<()> {
    let config_path = Config::default_path();
    let config = Config::load()?;

    println!();
    println!("  feedbot status");
    println!("  ─────────────────────────────────────");

    if config_path.exists() {
        println!("  Config:    {}", config_path.display());
    } else {
        println!("  Config:    (none, using defaults and environment)");
    }

    let mark = |ok: bool| if ok { "✅" } else { "❌" };
    println!(
        "  Telegram:  {} token",
        mark(!config.telegram.token.trim().is_empty())
    );
    println!("  Finnhub:   {} API key", mark(config.has_finnhub_key()));
    println!("  LeetCode:  {}", config.feeds.leetcode.graphql_url);
    println!("  Timeout:   {}s", config.feeds.timeout_seconds);
    println!(
        "  Health:    {}",
        if config.gateway.enabled {
            format!("{}:{}/health", config.gateway.host, config.gateway.port)
        } else {
            "disabled".to_owned()
        }
    );
    println!("  Unknown:   {:?}", config.unknown_command_policy());

    if let Err(errors) = config.validate() {
        println!();
        for e in errors {
            println!("  ⚠️  {}", e);
        }
    }
    println!();
    Ok(())
}

fn cmd_init() -> Result<()> {
    let path = Config::write_default_template()?;
    println!();
    println!("  ✅ Configuration created at:");
    println!("     {}", path.display());
    println!();
    println!("  Next steps:");
    println!("  1. export TELEGRAM_BOT_TOKEN and FINNHUB_API_KEY (or put them in .env)");
    println!("  2. Run `feedbot run`");
    println!();
    Ok(())
}
