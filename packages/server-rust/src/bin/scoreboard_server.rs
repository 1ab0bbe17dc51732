//! Scoreboard server binary.
//!
//! # Usage
//!
//! ```bash
//! # In-memory leaderboard on the default port
//! BACKEND_PASSWORD=hunter2 scoreboard-server
//!
//! # Persistent leaderboard with JSON logs and a Prometheus endpoint
//! BACKEND_PASSWORD=hunter2 DATA_PATH=/var/lib/scoreboard/scores.redb \
//!   scoreboard-server --log-format json --metrics-addr 0.0.0.0:9100
//! ```

use std::io::IsTerminal;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use metrics_exporter_prometheus::PrometheusBuilder;
use scoreboard_core::SystemClock;
use scoreboard_server::network::{BackendPassword, NetworkConfig, NetworkModule, TlsConfig};
use scoreboard_server::service::ServerConfig;
use scoreboard_server::{build_services, StorageConfig};
use tokio::signal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    /// Human-readable text.
    Text,
    /// One JSON object per event.
    Json,
    /// JSON when stdout is not a terminal, text otherwise.
    Auto,
}

/// Leaderboard backend serving ranked score windows over HTTP.
#[derive(Debug, Parser)]
#[command(name = "scoreboard-server", version, about)]
struct Cli {
    /// Address to bind.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 9320)]
    port: u16,

    /// Password clients must send as `Authorization: Bearer <password>` to submit scores.
    #[arg(long, env = "BACKEND_PASSWORD", hide_env_values = true)]
    backend_password: String,

    /// redb database file. Scores are kept in memory when unset.
    #[arg(long, env = "DATA_PATH")]
    data_path: Option<PathBuf>,

    /// Per-operation deadline in milliseconds.
    #[arg(long, env = "OPERATION_TIMEOUT_MS", default_value_t = 30_000)]
    operation_timeout_ms: u64,

    /// Operations allowed in flight before new ones are shed.
    #[arg(long, env = "MAX_CONCURRENT_OPERATIONS", default_value_t = 1000)]
    max_concurrent_operations: u32,

    /// Allowed CORS origin; repeat for several. `*` mirrors any origin.
    #[arg(long = "cors-origin", env = "CORS_ORIGINS", value_delimiter = ',', default_value = "*")]
    cors_origins: Vec<String>,

    /// PEM certificate chain; enables TLS together with `--tls-key`.
    #[arg(long, env = "TLS_CERT", requires = "tls_key")]
    tls_cert: Option<PathBuf>,

    /// PEM private key.
    #[arg(long, env = "TLS_KEY", requires = "tls_cert")]
    tls_key: Option<PathBuf>,

    /// Serve Prometheus metrics on this address.
    #[arg(long, env = "METRICS_ADDR")]
    metrics_addr: Option<SocketAddr>,

    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Auto)]
    log_format: LogFormat,
}

impl Cli {
    fn storage_config(&self) -> StorageConfig {
        match &self.data_path {
            Some(path) => StorageConfig::Redb { path: path.clone() },
            None => StorageConfig::Memory,
        }
    }

    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            default_operation_timeout_ms: self.operation_timeout_ms,
            max_concurrent_operations: self.max_concurrent_operations,
        }
    }

    fn network_config(&self) -> NetworkConfig {
        let tls = match (&self.tls_cert, &self.tls_key) {
            (Some(cert_path), Some(key_path)) => Some(TlsConfig {
                cert_path: cert_path.clone(),
                key_path: key_path.clone(),
            }),
            _ => None,
        };
        NetworkConfig {
            host: self.host.clone(),
            port: self.port,
            tls,
            cors_origins: self.cors_origins.clone(),
            // Leave room for the operation deadline to fire first.
            request_timeout: Duration::from_millis(self.operation_timeout_ms)
                + Duration::from_secs(1),
            ..NetworkConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format);

    if let Some(addr) = cli.metrics_addr {
        init_metrics_exporter(addr)?;
    }

    let storage = cli.storage_config();
    if storage == StorageConfig::Memory {
        tracing::warn!(
            "No DATA_PATH set. Scores are kept in memory and lost on shutdown."
        );
    }

    let services = build_services(
        storage,
        cli.server_config(),
        BackendPassword::new(cli.backend_password.clone()),
        Arc::new(SystemClock),
    )
    .context("failed to open score storage")?;

    let mut module = NetworkModule::new(cli.network_config(), services);
    let port = module.start().await.context("failed to bind listener")?;
    tracing::info!(host = %cli.host, port, "Server now listening");

    module.serve(shutdown_signal()).await?;
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` controls filtering and defaults to `info`.
fn init_logging(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = match format {
        LogFormat::Json => true,
        LogFormat::Text => false,
        LogFormat::Auto => !std::io::stdout().is_terminal(),
    };

    if use_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().flatten_event(true).with_current_span(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer())
            .init();
    }
}

/// Starts the Prometheus exporter, serving `/metrics` on `addr`.
fn init_metrics_exporter(addr: SocketAddr) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("failed to install Prometheus exporter")?;
    tracing::info!(metrics_addr = %addr, "Prometheus metrics exporter started");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl-C, initiating shutdown"),
        () = terminate => tracing::info!("Received SIGTERM, initiating shutdown"),
    }
}
