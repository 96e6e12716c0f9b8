use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use authguard::config::{AuthGuardConfig, LogFormat, LoggingConfig};
use authguard::grpc::GrpcServer;
use authguard::ratelimit::{PolicySet, RateLimiter, Throttle};
use authguard::reload::spawn_policy_reload;

/// Authentication attempt throttling service.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address for the gRPC server, overriding the configuration
    #[arg(long)]
    grpc_addr: Option<SocketAddr>,

    /// Path to a policies file, overriding the configuration
    #[arg(long)]
    policies: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AuthGuardConfig::load(cli.config.as_deref())?;
    if let Some(addr) = cli.grpc_addr {
        config.server.grpc_addr = addr;
    }
    if let Some(path) = cli.policies {
        config.limiter.policies_path = Some(path.display().to_string());
    }

    init_tracing(&config.logging);

    info!("Starting Authguard Throttling Service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!(grpc_addr = %config.server.grpc_addr, "Configuration loaded");

    let policies_path = config.limiter.policies_path.as_ref().map(PathBuf::from);
    let policies = match &policies_path {
        Some(path) => PolicySet::from_file(path)?,
        None => {
            warn!("No policies file configured, using built-in policies");
            PolicySet::default()
        }
    };
    info!(policies = policies.len(), "Throttling policies loaded");

    // Initialize the rate limiter and its sweeper
    let rate_limiter = Arc::new(RateLimiter::new());
    let sweeper = rate_limiter.spawn_sweeper(config.limiter.sweep_interval());
    let throttle = Arc::new(Throttle::new(rate_limiter, policies));

    let reloader = match (policies_path, config.limiter.policy_reload_interval()) {
        (Some(path), Some(interval)) => {
            Some(spawn_policy_reload(throttle.clone(), path, interval))
        }
        _ => None,
    };

    let grpc_server = GrpcServer::new(config.server.grpc_addr, throttle);

    // Run the server with graceful shutdown on Ctrl+C
    let served = grpc_server.serve_with_shutdown(shutdown_signal()).await;

    if let Some(reloader) = reloader {
        reloader.abort();
    }
    sweeper.shutdown().await;
    served?;

    info!("Authguard Throttling Service stopped");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    // RUST_LOG takes precedence over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
