use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use floorbot::application::errors::{BotError, ConfigError};
use floorbot::application::messaging::{ChannelThrottle, CommandParser};
use floorbot::application::services::BotController;
use floorbot::infrastructure::config::Config;
use floorbot::infrastructure::gateway::{GatewayConfig, GatewayManager};
use floorbot::infrastructure::health::HealthServer;
use floorbot::infrastructure::marketplace::MarketplaceClient;

#[derive(Parser)]
#[command(name = "floorbot")]
#[command(about = "Floor-price lookup bot for chat channels", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Gateway token (overrides config)
    #[arg(short, long)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            if let Err(e) = run_bot(cli.config, cli.token) {
                tracing::error!("Fatal: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Version => {
            println!("floorbot v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::InitConfig => {
            init_config();
        }
    }
}

fn run_bot(config_path: String, token_override: Option<String>) -> Result<(), BotError> {
    // Load config
    let mut config = if std::path::Path::new(&config_path).exists() {
        Config::load(&config_path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config: {}, using defaults", e);
            Config::load_env()
        })
    } else {
        Config::load_env()
    };

    if let Some(token) = token_override {
        config.gateway.token = Some(token);
    }
    config.validate()?;
    let token = config
        .gateway
        .token
        .clone()
        .ok_or_else(|| ConfigError::MissingField("gateway.token".to_string()))?;

    tracing::info!("Starting {}", config.bot.name);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        // Explicit construction in dependency order; no registry.
        let marketplace = Arc::new(MarketplaceClient::new(
            &config.marketplace.base_url,
            config.marketplace.api_key.clone(),
            Duration::from_secs(config.marketplace.timeout_secs),
        ));

        let parser = CommandParser::new(&config.bot.trigger);

        let mut gateway = GatewayManager::new(GatewayConfig {
            url: config.gateway.url.clone(),
            token,
            backoff_base: Duration::from_millis(config.gateway.backoff_base_ms),
            backoff_cap: Duration::from_millis(config.gateway.backoff_cap_ms),
            max_failed_connects: config.gateway.max_failed_connects,
            shutdown_grace: Duration::from_secs(config.gateway.shutdown_grace_secs),
        });

        let controller = BotController::new(
            parser,
            marketplace,
            Arc::new(gateway.reply_handle()),
            ChannelThrottle::new(
                config.limits.cooldown_max_commands,
                config.limits.cooldown_window_secs,
            ),
        );
        gateway.register_handler(Arc::new(controller));

        let health = HealthServer::bind(config.health.port, gateway.watch_health()).await?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
        let health_task = tokio::spawn(health.run(shutdown_rx.clone()));
        let gateway_task = tokio::spawn(gateway.run(shutdown_rx));

        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown signal received"),
            Err(e) => tracing::error!("Failed to listen for shutdown signal: {}", e),
        }
        let _ = shutdown_tx.send(true);

        let _ = gateway_task.await;
        let _ = health_task.await;
        Ok::<(), BotError>(())
    })
}

fn init_config() {
    let config = Config::default();
    match serde_yaml::to_string(&config) {
        Ok(yaml) => match std::fs::write("config.yaml", yaml) {
            Ok(()) => println!("Wrote default config to config.yaml"),
            Err(e) => eprintln!("Failed to write config.yaml: {}", e),
        },
        Err(e) => eprintln!("Failed to serialize config: {}", e),
    }
}
