//! Guardian CLI
//!
//! - `guardian check <config>`: run reconciliation cycles forever and serve
//!   the config document for inspection
//! - `guardian inspect <config> app_name <regex>`: print the config with
//!   draft entries for running apps that are not configured yet

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use guardian::checkers::CheckerRegistry;
use guardian::config::{self, GuardianConfig};
use guardian::yarn::YarnClient;
use guardian::{inspect, logging, server, Scheduler};
use notify::{AlertManagerConfig, AlertSink, Notifier};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Watchdog that keeps YARN applications at their desired instance count
#[derive(Parser)]
#[command(name = "guardian")]
#[command(about = "Watchdog that keeps YARN applications at their desired instance count")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory for the daily-rotating log file
    #[arg(long, global = true, env = "GUARDIAN_LOG_DIR", default_value = logging::DEFAULT_LOG_DIR)]
    log_dir: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Check applications periodically and restart the missing ones
    Check {
        /// Path to the guardian config document
        config: PathBuf,

        /// Address for the config inspection server
        #[arg(long, default_value = "0.0.0.0")]
        bind: String,
    },
    /// Print the config with draft entries for unguarded running apps
    Inspect {
        /// Path to the guardian config document
        config: PathBuf,

        /// Filter field (only "app_name" is supported)
        filter: String,

        /// Regular expression matched against running app names
        value: String,
    },
}

fn init_tracing(verbose: bool, log_dir: &Path) -> Result<WorkerGuard> {
    let default = if verbose {
        "guardian=debug,notify=debug"
    } else {
        "guardian=info,notify=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let appender = logging::file_appender(log_dir)
        .with_context(|| format!("Failed to open log directory {}", log_dir.display()))?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    // Console logs go to stderr so `inspect` output stays clean JSON.
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true),
        )
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.verbose, &cli.log_dir)?;

    match cli.command {
        Commands::Check { config, bind } => run_check(config, &bind).await,
        Commands::Inspect {
            config,
            filter,
            value,
        } => run_inspect(config, &filter, &value).await,
    }
}

async fn run_check(config_path: PathBuf, bind: &str) -> Result<()> {
    // A bad document at startup is fatal; later reloads only skip a cycle.
    let config = GuardianConfig::load(&config_path)
        .await
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;

    let alert_config = AlertManagerConfig::from_value(&config.alert_manager)
        .context("Failed to parse alert_manager config")?;
    let alerts: Arc<dyn AlertSink> = Arc::new(Notifier::from_config(&alert_config)?);

    let http = reqwest::Client::builder()
        .build()
        .context("Failed to create HTTP client")?;
    let scheduler = Scheduler::new(
        config_path.clone(),
        http,
        CheckerRegistry::with_defaults(),
        alerts,
    );

    let listener = TcpListener::bind((bind, config.port))
        .await
        .with_context(|| format!("Failed to bind inspection server on {bind}:{}", config.port))?;

    tokio::select! {
        () = scheduler.run() => {}
        result = server::serve(listener, config_path) => {
            if let Err(e) = result {
                error!(error = %e, "Config inspection server stopped");
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Exiting. Bye");
        }
    }

    Ok(())
}

async fn run_inspect(config_path: PathBuf, filter: &str, value: &str) -> Result<()> {
    let pattern = inspect::parse_filter(filter, value)?;
    let document = config::load_document(&config_path)
        .await
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;

    let timeout = document
        .pointer("/yarn/timeout_secs")
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(config::DEFAULT_YARN_TIMEOUT_SECS);
    let api = YarnClient::new(reqwest::Client::new(), Duration::from_secs(timeout));

    let document = inspect::inspect(document, &api, &pattern).await?;
    println!("{}", serde_json::to_string_pretty(&document)?);

    Ok(())
}
