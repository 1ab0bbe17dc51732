//! Network module with deferred startup lifecycle.
//!
//! Implements the deferred startup pattern: `new()` creates resources,
//! `start()` binds the TCP listener, and `serve()` starts accepting
//! connections. This separation lets the binary report the bound port
//! (and fail fast on bind errors) before it starts serving.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::auth::BackendPassword;
use super::config::NetworkConfig;
use super::handlers::{
    get_scores_handler, health_handler, liveness_handler, post_score_handler, readiness_handler,
    AppState,
};
use super::middleware::build_http_layers;
use super::shutdown::ShutdownController;
use crate::service::{OperationPipeline, OperationService};

/// Leaderboard facts reported by `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardInfo {
    pub storage_backend: &'static str,
    pub modes: Vec<&'static str>,
}

/// Application services the HTTP handlers call into.
#[derive(Clone)]
pub struct ApiServices {
    pub classifier: Arc<OperationService>,
    pub pipeline: OperationPipeline,
    pub password: BackendPassword,
    pub board: Arc<BoardInfo>,
}

/// Manages the full HTTP server lifecycle.
///
/// Follows the deferred startup pattern:
/// 1. `new()` -- allocates shared state (shutdown controller)
/// 2. `start()` -- binds TCP listener to the configured address
/// 3. `serve()` -- begins accepting connections until shutdown is signalled
pub struct NetworkModule {
    config: NetworkConfig,
    services: ApiServices,
    listener: Option<TcpListener>,
    shutdown: Arc<ShutdownController>,
    start_time: Instant,
}

impl NetworkModule {
    /// Creates a new network module without binding any port.
    #[must_use]
    pub fn new(config: NetworkConfig, services: ApiServices) -> Self {
        Self {
            config,
            services,
            listener: None,
            shutdown: Arc::new(ShutdownController::new()),
            start_time: Instant::now(),
        }
    }

    /// Returns a shared reference to the shutdown controller.
    ///
    /// Other modules use this to check health state or trigger shutdown.
    #[must_use]
    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.shutdown)
    }

    /// Assembles the axum router with all routes and middleware.
    ///
    /// Routes:
    /// - `GET /health` -- detailed health JSON
    /// - `GET /health/live` -- liveness check
    /// - `GET /health/ready` -- readiness check
    /// - `GET /api/scores/{mode}` -- point lookup or window read
    /// - `POST /api/scores/{mode}` -- authorized score submission
    pub fn build_router(&self) -> Router {
        let state = AppState {
            classifier: Arc::clone(&self.services.classifier),
            pipeline: self.services.pipeline.clone(),
            password: self.services.password.clone(),
            shutdown: Arc::clone(&self.shutdown),
            board: Arc::clone(&self.services.board),
            start_time: self.start_time,
        };

        router(state, &self.config)
    }

    /// Binds the TCP listener to the configured host and port.
    ///
    /// Returns the actual bound port, which may differ from the configured
    /// port when port 0 is used (OS-assigned ephemeral port).
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound (e.g., port in use).
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        info!("TCP listener bound to {}:{}", self.config.host, port);

        self.listener = Some(listener);
        Ok(port)
    }

    /// Starts serving connections until the shutdown signal fires.
    ///
    /// After the shutdown signal:
    /// 1. Health state transitions to Draining
    /// 2. Waits up to `drain_timeout` for in-flight requests to complete
    /// 3. Health state transitions to Stopped
    ///
    /// # Errors
    ///
    /// Returns an error if the server encounters a fatal I/O error.
    ///
    /// # Panics
    ///
    /// Panics if `start()` was not called before `serve()`.
    pub async fn serve(
        mut self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let listener = self
            .listener
            .take()
            .expect("start() must be called before serve()");
        let router = self.build_router();
        let shutdown_ctrl = self.shutdown;
        let drain_timeout = self.config.drain_timeout;

        // Transition to Ready so readiness checks pass.
        shutdown_ctrl.set_ready();

        if let Some(ref tls_config) = self.config.tls {
            serve_tls(listener, router, tls_config, &shutdown_ctrl, shutdown).await?;
        } else {
            serve_plain(listener, router, shutdown).await?;
        }

        drain(&shutdown_ctrl, drain_timeout).await;
        Ok(())
    }
}

fn router(state: AppState, config: &NetworkConfig) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        .route(
            "/api/scores/{mode}",
            get(get_scores_handler).post(post_score_handler),
        )
        .layer(build_http_layers(config))
        .with_state(state)
}

/// Serves plain HTTP connections using axum's built-in server.
async fn serve_plain(
    listener: TcpListener,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    info!("Serving plain HTTP connections");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Serves TLS connections using `axum-server` with rustls.
///
/// Reuses the pre-bound TCP listener by converting it to a `std::net::TcpListener`.
async fn serve_tls(
    listener: TcpListener,
    router: Router,
    tls_config: &super::config::TlsConfig,
    shutdown_ctrl: &ShutdownController,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    use axum_server::tls_rustls::RustlsConfig;

    let rustls_config = RustlsConfig::from_pem_file(&tls_config.cert_path, &tls_config.key_path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load TLS certificates: {e}"))?;

    let addr = listener.local_addr()?;
    let std_listener = listener.into_std()?;
    let handle = axum_server::Handle::new();
    let shutdown_handle = handle.clone();
    let mut shutdown_rx = shutdown_ctrl.shutdown_receiver();

    // Stop accepting on either the caller's signal or a programmatic
    // trigger_shutdown().
    tokio::spawn(async move {
        tokio::select! {
            () = shutdown => {}
            _ = shutdown_rx.changed() => {}
        }
        shutdown_handle.graceful_shutdown(None);
    });

    info!("Serving TLS connections on {}", addr);

    axum_server::from_tcp_rustls(std_listener, rustls_config)
        .handle(handle)
        .serve(router.into_make_service())
        .await?;
    Ok(())
}

/// Waits for in-flight requests and transitions to Stopped.
async fn drain(shutdown_ctrl: &ShutdownController, timeout: Duration) {
    shutdown_ctrl.trigger_shutdown();

    let in_flight = shutdown_ctrl.in_flight();
    if in_flight.total() > 0 {
        info!(
            reads = in_flight.reads,
            submits = in_flight.submits,
            "draining in-flight requests"
        );
    }

    if shutdown_ctrl.wait_for_drain(timeout).await {
        info!("All in-flight requests drained");
    } else {
        warn!("Drain timeout expired with in-flight requests remaining");
    }
}
