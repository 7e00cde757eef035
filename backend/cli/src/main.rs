mod check_cmd;
mod groups;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use botforge_channels::{parse_intents, DiscordGateway, DiscordRest, GatewayAdapter};
use botforge_commands::{publish, CommandRegistry, Dispatcher, GroupRegistry};
use botforge_config::defaults::{DEFAULT_LOG_DIR, DEFAULT_LOG_LEVEL};
use botforge_config::{load_and_prepare, resolve_config_path, BotConfig};
use botforge_core::{BotError, Transport};
use botforge_logging::init_logger;

/// Gateway events buffered ahead of the dispatcher.
const EVENT_QUEUE_DEPTH: usize = 256;

#[derive(Parser)]
#[command(name = "botforge")]
#[command(about = "BotForge: declarative slash-command bot runtime")]
#[command(version)]
struct Cli {
    /// Path to the config file (default: $BOTFORGE_CONFIG, ./botforge.yaml, ~/.botforge/botforge.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to the gateway and serve commands
    Run,
    /// Publish the command list and exit
    Publish {
        /// Publish to this guild instead of the configured one
        #[arg(long)]
        guild: Option<String>,
        /// Publish globally even if a guild is configured
        #[arg(long, conflicts_with = "guild")]
        global: bool,
    },
    /// Validate the config and list the declared command groups
    Check,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config.as_deref());

    match cli.command {
        Commands::Run => run_bot(&config_path).await?,
        Commands::Publish { guild, global } => {
            publish_commands(&config_path, guild, global).await?;
        }
        Commands::Check => {
            if !check_cmd::run(&config_path).await? {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Load the config, start logging, then enforce validation.
async fn prepare(path: &Path) -> Result<BotConfig> {
    let (config, report) = load_and_prepare(path).await?;

    let logging = config.logging.clone().unwrap_or_default();
    init_logger(
        logging.dir.as_deref().unwrap_or(DEFAULT_LOG_DIR),
        logging.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL),
    );

    report.log();
    report.into_result(path)?;
    Ok(config)
}

fn build_registry() -> Result<CommandRegistry, BotError> {
    let mut groups = GroupRegistry::new();
    groups::declare_all(&mut groups);

    let mut registry = CommandRegistry::new();
    registry.wire_all(&groups)?;
    Ok(registry)
}

fn credentials(config: &BotConfig) -> Result<(String, String)> {
    let token = config.token().context("discord.token is not set")?;
    let application_id = config
        .application_id()
        .context("discord.applicationId is not set")?;
    Ok((token.to_string(), application_id.to_string()))
}

async fn run_bot(path: &Path) -> Result<()> {
    let config = prepare(path).await?;
    let (token, application_id) = credentials(&config)?;
    let name = config
        .discord
        .as_ref()
        .and_then(|d| d.name.clone())
        .unwrap_or_else(|| "botforge".to_string());

    info!(bot = %name, application = %application_id, "Starting BotForge");

    let registry = Arc::new(build_registry()?);
    let transport: Arc<dyn Transport> = Arc::new(DiscordRest::new(token.clone()));

    if config.publish_on_start() {
        // Serving still works with the previously published list.
        if let Err(e) = publish(transport.as_ref(), &registry, &application_id, config.guild_id()).await {
            warn!("Continuing with the existing command list: {}", e);
        }
    }

    let dispatcher = Arc::new(Dispatcher::new(registry, transport).with_watchdog(config.watchdog()));
    let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
    let ingress = tokio::spawn(dispatcher.run(events_rx));

    let gateway = DiscordGateway::new(token, parse_intents(&config.intents())?, config.presence());
    info!(adapter = gateway.name(), "Connecting gateway");

    let result = tokio::select! {
        result = gateway.start(events_tx) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupt received; shutting down");
            Ok(())
        }
    };

    if let Err(e) = &result {
        error!("Gateway stopped: {:#}", e);
    }
    ingress.abort();
    result
}

async fn publish_commands(path: &Path, guild: Option<String>, global: bool) -> Result<()> {
    let config = prepare(path).await?;
    let (token, application_id) = credentials(&config)?;
    let guild = if global {
        None
    } else {
        guild.or_else(|| config.guild_id().map(str::to_string))
    };

    let registry = build_registry()?;
    let transport = DiscordRest::new(token);
    let count = publish(&transport, &registry, &application_id, guild.as_deref()).await?;

    match guild {
        Some(guild) => println!("Published {count} command(s) to guild {guild}"),
        None => println!("Published {count} command(s) globally"),
    }
    Ok(())
}
