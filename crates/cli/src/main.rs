//! Console entry point for the smart-fridge simulation.

use std::time::Duration;

use cli::{CliError, CommandError, Config, Console, ConsoleCommand, Flow, HELP, LogFormat};
use fridge::{Fridge, FridgeEvent};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, shutting down");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, shutting down");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so they do not interleave with receipts and listings.
    match config.log_format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

/// Echoes fridge events to the debug log until the fridge goes away.
async fn log_events(mut events: broadcast::Receiver<FridgeEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(json) => tracing::debug!(event_type = event.event_type(), %json, "fridge event"),
                Err(e) => tracing::warn!(error = %e, "failed to serialize fridge event"),
            },
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event log fell behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

/// Reads commands from stdin until `quit`, end of input or a shutdown signal.
async fn run_console(console: &Console) -> Result<(), CliError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            () = &mut shutdown => break,
        };
        let Some(line) = line else {
            tracing::info!("end of input");
            break;
        };

        match line.parse::<ConsoleCommand>() {
            Ok(command) => {
                if console.execute(command)? == Flow::Quit {
                    break;
                }
            }
            Err(CommandError::Empty) => {}
            Err(e) => println!("{e}"),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    // 1. Load configuration and initialize tracing
    let config = Config::from_env();
    init_tracing(&config);

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Start the fridge and its trackers
    let (fridge, fridge_task) = Fridge::spawn(config.fridge_config());
    let event_log = tokio::spawn(log_events(fridge.subscribe()));
    tracing::info!(
        max_weight = config.max_weight,
        max_space = config.max_space,
        reply_timeout_ms = config.reply_timeout_ms,
        "fridge simulation started"
    );

    // 4. Serve console commands
    println!("{HELP}");
    let console = Console::new(fridge, Some(metrics_handle));
    let result = run_console(&console).await;

    // 5. Let in-flight orders settle, then stop
    drop(console);
    if tokio::time::timeout(SHUTDOWN_GRACE, fridge_task).await.is_err() {
        tracing::warn!("fridge did not stop within the grace period");
    }
    event_log.abort();

    tracing::info!("fridge simulation stopped");
    result
}
