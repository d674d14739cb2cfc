// zuse - a multi-server IRC client for the terminal
//
// Architecture:
// - Connection tasks (tokio, one per live session): own the protocol client
//   and turn everything the server says into DomainEvents
// - Event bridge (mpsc): the only path from those tasks to the UI
// - TUI loop (ratatui): the single consumer; owns the session registry, the
//   log store and focus, and applies events in arrival order
// - Log store: buffers lines until the terminal has a size, then goes live

mod bridge;
mod cli;
mod commands;
mod config;
mod context;
mod events;
mod focus;
mod lifecycle;
mod logging;
mod rows;
mod session;
mod store;
mod tui;

use anyhow::Result;
use config::{Config, LogRotation};
use context::AppContext;
use lifecycle::IrcConnector;
use logging::{LogBuffer, TuiLogLayer};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Time given to QUIT messages to leave before the runtime shuts down
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

#[tokio::main]
async fn main() -> Result<()> {
    // Handle CLI commands first (config --show, --reset, --path)
    // If a command was handled, exit early
    if cli::handle_cli()? {
        return Ok(());
    }

    // Ensure config template exists (helps users discover options)
    Config::ensure_config_exists();

    // A config file that doesn't parse stops us here, before the terminal
    // is taken over, so the error is readable
    let config = Config::load()?;

    let log_buffer = LogBuffer::new();
    let _file_guard = init_tracing(&config, &log_buffer);

    tracing::info!(version = config::VERSION, "starting");

    let (bridge_tx, bridge_rx) = bridge::channel();
    let mut context = AppContext::new(
        config.client_settings(),
        bridge_tx,
        Box::new(IrcConnector),
    );

    // Presets become sessions before the UI has a size, so their banners
    // (and anything autoconnect produces) wait in the store
    let created = context.load_presets(&config.servers);
    if !created.is_empty() {
        tracing::info!(count = created.len(), "loaded server presets");
    }

    let mut context = tui::run_tui(context, bridge_rx, log_buffer, config.left_pane_width).await?;

    if context.shutdown() > 0 {
        tokio::time::sleep(SHUTDOWN_GRACE).await;
    }
    tracing::info!("exiting");

    Ok(())
}

/// Initialize tracing: captured into the log buffer while the TUI runs,
/// plus optional rotating JSON files
///
/// Precedence: RUST_LOG env var > config (and ZUSE_LOG_LEVEL) > default "info".
/// The returned guard must stay alive for file logs to flush.
fn init_tracing(
    config: &Config,
    log_buffer: &LogBuffer,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let default_filter = format!("zuse={},irc=warn", config.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    let logging = &config.logging;
    let (file_layer, guard) = if logging.file_enabled {
        match std::fs::create_dir_all(&logging.file_dir) {
            Ok(()) => {
                let file_appender = match logging.file_rotation {
                    LogRotation::Hourly => {
                        tracing_appender::rolling::hourly(&logging.file_dir, &logging.file_prefix)
                    }
                    LogRotation::Daily => {
                        tracing_appender::rolling::daily(&logging.file_dir, &logging.file_prefix)
                    }
                    LogRotation::Never => {
                        tracing_appender::rolling::never(&logging.file_dir, &logging.file_prefix)
                    }
                };

                // Writes happen on a background thread
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
                let layer = tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(non_blocking)
                    .with_ansi(false);
                (Some(layer), Some(guard))
            }
            Err(e) => {
                eprintln!(
                    "Warning: Could not create log directory {:?}: {}",
                    logging.file_dir, e
                );
                (None, None)
            }
        }
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(TuiLogLayer::new(log_buffer.clone()))
        .with(file_layer)
        .init();

    guard
}
