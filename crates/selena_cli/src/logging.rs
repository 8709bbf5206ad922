//! Diagnostic logging setup.
//!
//! Console output goes to stderr so command output on stdout stays clean.

use anyhow::{Context, Result};
use selena_core::config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber. Keep the returned guard alive for the
/// lifetime of the process or buffered file output is lost.
pub fn init(cfg: &LoggingConfig, verbose: bool) -> Result<Option<WorkerGuard>> {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let mut layers: Vec<BoxedLayer> = Vec::new();
    let console = fmt::layer().with_writer(std::io::stderr).with_target(false);
    layers.push(if cfg.json {
        console.json().boxed()
    } else {
        console.compact().boxed()
    });

    let mut guard = None;
    if let Some(dir) = &cfg.dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
        let (writer, worker_guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "selena.log"));
        let file = fmt::layer().with_writer(writer).with_ansi(false);
        layers.push(if cfg.json {
            file.json().boxed()
        } else {
            file.boxed()
        });
        guard = Some(worker_guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::debug!("Tracing initialized");
    Ok(guard)
}
