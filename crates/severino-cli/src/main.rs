//! ponto - clock in on Facilita Ponto from the terminal.
//!
//! `ponto setup` stores the company code and CPF and performs the one-time
//! handshake that yields the employee id. `ponto` (or `ponto in`) records a
//! clock-in using the cached session, re-authenticating when needed.

mod setup;

use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use severino_core::{clock_in, PontoError, PortalClient, SessionManager, Settings};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// ponto - clock in on Facilita Ponto
#[derive(Parser, Debug)]
#[command(name = "ponto")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Discard stored session cookies and authenticate before clocking in
    #[arg(long, global = true)]
    update_cookies: bool,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Configure company code and CPF
    #[command(visible_alias = "auth", alias = "config")]
    Setup,

    /// Record a clock-in (default)
    In,
}

/// Initialize the tracing subscriber for logging
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&e),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::from_env().context("Failed to resolve settings")?;
    info!(config_dir = %settings.config_dir.display(), portal = %settings.portal_url, "ponto starting");

    let portal = PortalClient::new(&settings).context("Failed to create HTTP client")?;
    let session = SessionManager::from_settings(portal, &settings);

    match cli.command {
        Some(Commands::Setup) => setup::run(&session).await,
        Some(Commands::In) | None => {
            let receipt = clock_in(&session, cli.update_cookies).await?;
            println!("Clock-in recorded!");
            println!("Time: {}", receipt.timestamp);
            Ok(())
        }
    }
}

/// Print an error the way the user should see it and pick the exit code
fn report(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<PontoError>() {
        Some(ponto) => {
            eprintln!("{}", ponto);
            for line in ponto.details() {
                eprintln!("{}", line);
            }
            if !ponto.is_operational() {
                eprintln!("{:?}", err);
            }
            ExitCode::from(ponto.exit_code())
        }
        None => {
            eprintln!("Unexpected error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
