use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};
use trigbench_correlation::TracingTelemetry;
use trigbench_server::api::{self, AppState};
use trigbench_server::config::{CUSTOM_HANDLER_PORT_ENV, TrigbenchConfig};
use trigbench_server::storage_factory::create_storage;

/// Azure Functions custom handler running the trigger benchmarks.
#[derive(Parser, Debug)]
#[command(name = "trigbench-server", about = "Trigger benchmark custom handler")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "trigbench.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port. `FUNCTIONS_CUSTOMHANDLER_PORT` wins when set.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = TrigbenchConfig::load(&cli.config)?;

    let telemetry_guard = trigbench_server::telemetry::init(&config.telemetry);

    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    let host_port = std::env::var(CUSTOM_HANDLER_PORT_ENV).ok();
    if config.server.apply_custom_handler_port(host_port.as_deref()) {
        info!(port = config.server.port, "using port assigned by the Functions host");
    }

    let storage = create_storage(&config.storage, &config.secrets);
    let state = AppState::new(
        storage,
        Arc::new(TracingTelemetry::new()),
        config.benchmark.settings(),
        config.benchmark.workload_n,
    )?;
    let app = api::router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "trigbench custom handler listening");

    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);
    let (signalled_tx, signalled_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        let _ = signalled_tx.send(());
    });
    let drain_deadline = async move {
        if signalled_rx.await.is_ok() {
            tokio::time::sleep(shutdown_timeout).await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        result = server.into_future() => result?,
        () = drain_deadline => {
            warn!(
                timeout_seconds = config.server.shutdown_timeout_seconds,
                "in-flight invocations did not finish before the shutdown timeout"
            );
        }
    }

    info!("server stopped");
    telemetry_guard.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
