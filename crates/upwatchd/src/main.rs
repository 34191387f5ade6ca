//! upwatchd — the upwatch daemon.
//!
//! Single binary that assembles the upwatch subsystems:
//! - Registry (redb)
//! - Health checker + notifier
//! - Interval scheduler
//! - Dashboard, form handlers and JSON API
//!
//! # Usage
//!
//! ```text
//! upwatchd --config /etc/upwatch/upwatch.toml serve
//! upwatchd check
//! upwatchd add-service https://example.com/health --health-string OK
//! upwatchd add-address ops@example.com
//! upwatchd list
//! ```

mod config;
mod scheduler;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use upwatch_health::{
    CycleRunner, HealthChecker, HttpClient, LogTransport, MailTransport, Notifier, WebhookTransport,
};
use upwatch_state::StateStore;

use crate::config::{Config, TransportKind};

const DEFAULT_LOG_FILTER: &str = "info,upwatchd=debug,upwatch=debug";

#[derive(Parser)]
#[command(name = "upwatchd", about = "upwatch uptime monitor", version)]
struct Cli {
    /// Configuration file. A missing file means defaults.
    #[arg(long, global = true, default_value = "/etc/upwatch/upwatch.toml")]
    config: PathBuf,

    /// Override `server.listen`.
    #[arg(long, global = true)]
    listen: Option<SocketAddr>,

    /// Override `storage.path`.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Override `check.interval` (e.g. "30s", "5m", "0" to disable).
    #[arg(long, global = true)]
    interval: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server and the check scheduler.
    Serve,

    /// Run exactly one check cycle and print the report.
    Check,

    /// Register a service.
    AddService {
        url: String,

        /// Substring expected in a healthy response body.
        #[arg(long, default_value = "")]
        health_string: String,
    },

    /// Register a notification address.
    AddAddress { email: String },

    /// Print all services and addresses.
    List,
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let mut config = Config::load(&cli.config)?;
    if let Some(listen) = cli.listen {
        config.server.listen = listen;
    }
    if let Some(db) = cli.db {
        config.storage.path = db;
    }
    if let Some(interval) = cli.interval {
        config.check.interval = interval;
    }
    config.validate()?;

    let store = open_store(&config)?;

    match cli.command {
        Command::Serve => run_serve(config, store).await,
        Command::Check => run_check(&config, store).await,
        Command::AddService { url, health_string } => {
            upwatch_health::validate_url(&url)
                .map_err(|e| anyhow::anyhow!("cannot monitor {url}: {e}"))?;
            let key = store.create_service(&url, &health_string)?;
            println!("{key}\t{url}");
            Ok(())
        }
        Command::AddAddress { email } => {
            let key = store.create_address(&email)?;
            println!("{key}\t{email}");
            Ok(())
        }
        Command::List => list(&store),
    }
}

fn open_store(config: &Config) -> anyhow::Result<StateStore> {
    let path = &config.storage.path;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating data directory {}", dir.display()))?;
    }
    let store = StateStore::open(path)?;
    info!(path = %path.display(), "registry opened");
    Ok(store)
}

/// Assemble the checker, notifier and cycle runner from configuration.
fn build_runner(config: &Config, store: &StateStore) -> anyhow::Result<CycleRunner> {
    let client = HttpClient::new(config.check_timeout()?)?;
    let checker = HealthChecker::with_client(client.clone());

    let notifier = if config.notify.enabled {
        let transport: Arc<dyn MailTransport> = match config.notify.transport {
            TransportKind::Log => Arc::new(LogTransport),
            TransportKind::Webhook => {
                let url = config
                    .notify
                    .webhook_url
                    .clone()
                    .context("notify.webhook_url is not set")?;
                Arc::new(WebhookTransport::new(url, client))
            }
        };
        let notify_config = upwatch_health::NotifyConfig {
            sender: config.notify.sender.clone(),
            subject_prefix: config.notify.subject_prefix.clone(),
        };
        info!(transport = transport.name(), "notifications enabled");
        Notifier::email(Arc::new(notify_config), transport)
    } else {
        info!("notifications disabled");
        Notifier::Disabled
    };

    Ok(CycleRunner::new(Arc::new(store.clone()), checker, notifier)
        .with_max_concurrency(config.check.max_concurrency))
}

async fn run_serve(config: Config, store: StateStore) -> anyhow::Result<()> {
    info!("upwatch daemon starting");

    let runner = Arc::new(build_runner(&config, &store)?);

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Scheduler ──────────────────────────────────────────────

    let scheduler_handle = match config.check_interval()? {
        Some(interval) => Some(tokio::spawn(scheduler::run(
            Arc::clone(&runner),
            interval,
            shutdown_rx,
        ))),
        None => {
            info!("check scheduler disabled, cycles run only via /check");
            None
        }
    };

    // ── HTTP server ────────────────────────────────────────────

    let router = upwatch_api::build_router(store, runner);
    let addr = config.server.listen;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "could not listen for shutdown signal");
            }
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    if let Some(handle) = scheduler_handle {
        let _ = handle.await;
    }

    info!("upwatch daemon stopped");
    Ok(())
}

async fn run_check(config: &Config, store: StateStore) -> anyhow::Result<()> {
    let runner = build_runner(config, &store)?;
    let summary = runner.run_cycle().await?;
    println!("{}", summary.text_report());
    Ok(())
}

fn list(store: &StateStore) -> anyhow::Result<()> {
    println!("services:");
    for record in store.list_services()? {
        let svc = &record.service;
        let state = match (svc.enabled, svc.up) {
            (false, _) => "disabled",
            (true, true) => "up",
            (true, false) => "down",
        };
        println!("  {}\t{state}\t{}\t{:?}", record.key, svc.url, svc.health_string);
    }
    println!("addresses:");
    for record in store.list_addresses()? {
        println!("  {}\t{}", record.key, record.address.email);
    }
    Ok(())
}
