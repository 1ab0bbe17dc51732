//! HTTP handler definitions for the scoreboard server.
//!
//! This module defines `AppState` (the shared state carried through axum
//! extractors) and re-exports all handler functions for convenient access
//! when building the router.

pub mod health;
pub mod scores;

pub use health::{health_handler, liveness_handler, readiness_handler};
pub use scores::{get_scores_handler, post_score_handler};

use std::sync::Arc;
use std::time::Instant;

use super::{BackendPassword, BoardInfo, ShutdownController};
use crate::service::{OperationPipeline, OperationService};

/// Shared application state passed to all axum handlers via `State` extraction.
///
/// Holds `Arc` references to shared resources so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Turns query strings and bodies into operations.
    pub classifier: Arc<OperationService>,
    /// Load-shed, timeout, and metrics layers around the leaderboard.
    pub pipeline: OperationPipeline,
    /// Password required by write endpoints.
    pub password: BackendPassword,
    /// Graceful shutdown controller with health state and in-flight tracking.
    pub shutdown: Arc<ShutdownController>,
    /// Storage backend and modes, for the health body.
    pub board: Arc<BoardInfo>,
    /// Server process start time, used for uptime calculation.
    pub start_time: Instant,
}
