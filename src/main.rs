use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use remonitor::application::config::AppConfig;
use remonitor::application::registry_handle::RegistryHandle;
use remonitor::domain::ports::channel::NotificationChannel;
use remonitor::domain::ports::store::{AlertStore, StatusStore};
use remonitor::infrastructure::channels::{
    CompositeChannel, LogFileChannel, TerminalChannel, WebhookChannel,
};
use remonitor::infrastructure::persistence::SqliteStore;
use remonitor::infrastructure::probers::NetworkProber;
use remonitor::presentation::cli::app::{Cli, Commands};
use remonitor::presentation::cli::commands::check::run_check;
use remonitor::presentation::cli::commands::daemon::run_daemon;
use remonitor::presentation::cli::commands::status::run_status;
use remonitor::presentation::cli::commands::validate::run_validate;

fn print_banner() {
    println!("{}", "━".repeat(40).cyan());
    println!("{}", "  REMONITOR — Endpoint Monitor".bold().cyan());
    println!("{}", "━".repeat(40).cyan());
}

fn setup_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn open_store(config: &AppConfig) -> anyhow::Result<SqliteStore> {
    let store = SqliteStore::new(&config.database.path)?;
    if let Err(e) = store.cleanup_old(config.database.retention_hours) {
        tracing::warn!("Failed to clean up old alerts: {e}");
    }
    Ok(store)
}

fn build_channel(config: &AppConfig) -> anyhow::Result<CompositeChannel> {
    let mut channels: Vec<Box<dyn NotificationChannel>> = vec![Box::new(TerminalChannel::new())];
    if let Some(ref path) = config.channels.log_file {
        channels.push(Box::new(LogFileChannel::new(path)));
    }
    if let Some(ref url) = config.channels.webhook_url {
        channels.push(Box::new(WebhookChannel::new(url.clone())?));
    }
    Ok(CompositeChannel::new(channels))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose);

    // Load configuration
    let config_path = match cli.config {
        Some(path) => path,
        None => AppConfig::config_path()?,
    };
    let config = AppConfig::load_or_create(&config_path)?;

    // Manual DI — main.rs is the only place that knows concrete types
    let prober = NetworkProber::new()?;

    match cli.command {
        Some(Commands::Daemon) | None => {
            print_banner();
            let registry = RegistryHandle::new(config.build_registry()?);
            let store = Arc::new(open_store(&config)?);
            run_daemon(
                &config,
                config_path,
                registry,
                Arc::new(prober),
                Arc::new(build_channel(&config)?),
                Arc::clone(&store) as Arc<dyn StatusStore>,
                store as Arc<dyn AlertStore>,
            )
            .await?;
        }
        Some(Commands::Check { json }) => {
            run_check(&config, &prober, json).await?;
        }
        Some(Commands::Status { json }) => {
            let store = open_store(&config)?;
            run_status(&store, &store, json)?;
        }
        Some(Commands::Validate) => {
            run_validate(&config)?;
        }
    }

    Ok(())
}
