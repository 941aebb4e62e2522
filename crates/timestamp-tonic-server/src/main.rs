#![doc = include_str!("../README.md")]

mod server;

use anyhow::Context;
use clap::Parser;
use server::config::{CliArgs, ServerConfig};
use server::process::{ServerProcess, ShutdownHandle};
use server::telemetry::init_telemetry;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_stream::wrappers::TcpListenerStream;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    let providers = init_telemetry()?;
    tracing::info!("Starting timestamp service");

    let process = ServerProcess::new(config.clone());
    spawn_signal_listener(process.shutdown_handle())?;

    let res = if config.uds {
        #[cfg(unix)]
        {
            use tokio::net::UnixListener;
            use tokio_stream::wrappers::UnixListenerStream;
            let uds_path = config.server_addr.clone();
            let uds = UnixListener::bind(&uds_path)
                .with_context(|| format!("failed to bind unix socket {uds_path}"))?;
            log_startup_info(&uds_path, process.config());
            let res = process
                .run_with_incoming(UnixListenerStream::new(uds))
                .await;
            // Best effort: a panic can still leave the socket file behind.
            let _ = std::fs::remove_file(&uds_path);
            res
        }
        #[cfg(not(unix))]
        {
            anyhow::bail!("Unix domain sockets are not supported on this platform");
        }
    } else {
        let tcp_addr = config.server_addr.clone();
        let tcp = TcpListener::bind(&tcp_addr)
            .await
            .with_context(|| format!("failed to bind {tcp_addr}"))?;
        log_startup_info(&tcp_addr, process.config());
        process
            .run_with_incoming(TcpListenerStream::new(tcp))
            .await
    };

    match &res {
        Ok(()) => tracing::info!("Timestamp service shutdown complete"),
        Err(e) => tracing::error!("Server error: {:#}", e),
    }
    providers.shutdown();
    res
}

fn log_startup_info(addr: &str, config: &ServerConfig) {
    if cfg!(debug_assertions) {
        tracing::info!(
            "Timestamp service listening on {} with full config: {:#?}",
            addr,
            config
        );
    } else {
        tracing::info!("Timestamp service listening on {}", addr);
    }
}

/// Installs SIGINT and SIGTERM handlers that fire `handle`.
///
/// Handlers are installed before binding so a failure surfaces as a startup
/// error rather than a panic later on.
fn spawn_signal_listener(handle: ShutdownHandle) -> anyhow::Result<()> {
    #[cfg(unix)]
    let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())
        .context("failed to install SIGTERM handler")?;

    tokio::spawn(async move {
        #[cfg(unix)]
        let terminate = async {
            terminate.recv().await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                // Without a Ctrl+C handler only SIGTERM can stop us.
                tracing::warn!("Ctrl+C handler unavailable: {}", e);
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            () = ctrl_c => tracing::info!("Received Ctrl+C signal"),
            () = terminate => tracing::info!("Received SIGTERM signal"),
        }

        handle.shutdown();
    });

    Ok(())
}
