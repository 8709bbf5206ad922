use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use selena_core::{LoopControl, SelenaConfig};
use selena_reasoning::{TickOutcome, TickScheduler};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

mod app;
mod logging;

/// Selena: an autonomous character loop
#[derive(Parser, Debug)]
#[command(name = "selena", author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, global = true, env = "SELENA_CONFIG", default_value = "selena.toml")]
    config: PathBuf,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the character loop until interrupted (default)
    Run {
        /// Do not start the HTTP control surface
        #[arg(long)]
        no_gateway: bool,
    },
    /// Run a single tick now and print the result
    Tick,
    /// Print the stored state and the latest activity
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let cfg = SelenaConfig::load_or_default(&cli.config);
    let _guard = logging::init(&cfg.logging, cli.verbose)?;

    match cli.command.unwrap_or(Command::Run { no_gateway: false }) {
        Command::Run { no_gateway } => run(cfg, no_gateway).await,
        Command::Tick => tick(cfg).await,
        Command::Status => status(cfg).await,
    }
}

async fn run(cfg: SelenaConfig, no_gateway: bool) -> Result<()> {
    info!("Initializing {}...", cfg.character.name);
    let engine = app::build_engine(&cfg)?;
    let scheduler = Arc::new(TickScheduler::new(engine));

    #[cfg(feature = "gateway")]
    let gateway = if cfg.gateway.enabled && !no_gateway {
        let server = selena_gateway::GatewayServer::new(
            scheduler.clone(),
            &cfg.gateway.host,
            cfg.gateway.port,
        );
        Some(server.start())
    } else {
        None
    };
    #[cfg(not(feature = "gateway"))]
    let _ = no_gateway;

    scheduler.start().await;
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    info!("Shutting down");
    scheduler.stop().await;
    #[cfg(feature = "gateway")]
    if let Some(handle) = gateway {
        handle.abort();
    }
    Ok(())
}

async fn tick(cfg: SelenaConfig) -> Result<()> {
    let engine = app::build_engine(&cfg)?;
    match engine.run_tick(&|| true).await {
        TickOutcome::Completed {
            decision,
            state,
            next_tick,
            analyzer_fallback,
            ..
        } => {
            println!("Thoughts: {}", decision.thoughts);
            println!("Actions:  {}", decision.actions);
            println!(
                "Energy {:.3}, mood {:.3}, next tick in {} min{}",
                state.energy,
                state.mood,
                next_tick.as_secs().div_ceil(60),
                if analyzer_fallback {
                    " (analyzer fallback)"
                } else {
                    ""
                }
            );
            Ok(())
        }
        TickOutcome::Exhausted { entry } => {
            println!("Too tired to decide (energy {:.3}); sleeping", entry.energy);
            Ok(())
        }
        TickOutcome::Skipped { reason } => Err(anyhow::anyhow!("Tick skipped: {}", reason)),
        TickOutcome::Superseded => Ok(()),
    }
}

async fn status(cfg: SelenaConfig) -> Result<()> {
    let clock = app::clock(&cfg)?;
    let storage = app::storage(&cfg, clock)?;
    let state = storage.state.load().await;
    let latest = storage
        .activity_log
        .latest()
        .await
        .context("Failed to read activity log")?;

    let report = serde_json::json!({
        "name": cfg.character.name,
        "energy": state.energy,
        "mood": state.mood,
        "lastUpdate": state.last_update,
        "lastActivity": latest,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
