//! HTTP transport: configuration, middleware, authorization, handlers, and shutdown control.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod module;
pub mod shutdown;

pub use auth::{AuthError, BackendPassword};
pub use config::*;
pub use error::ApiError;
pub use handlers::AppState;
pub use module::{ApiServices, BoardInfo, NetworkModule};
pub use shutdown::*;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::time::Instant;

    use scoreboard_core::ManualClock;

    use super::{ApiServices, AppState, BackendPassword, BoardInfo, ShutdownController};
    use crate::ranking::{Leaderboard, TableRegistry};
    use crate::service::{build_operation_pipeline, LeaderboardService, OperationService, ServerConfig};
    use crate::storage::{StorageConfig, StoreFactory};

    pub const TEST_PASSWORD: &str = "secret";

    /// Services over fresh in-memory stores.
    pub fn test_services() -> ApiServices {
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let config = Arc::new(ServerConfig::default());
        let factory = StoreFactory::new(StorageConfig::Memory, clock.clone()).unwrap();
        let registry = Arc::new(TableRegistry::build(&factory).unwrap());
        let board = Arc::new(BoardInfo {
            storage_backend: factory.backend_name(),
            modes: registry.modes(),
        });
        let service = Arc::new(LeaderboardService::new(Leaderboard::new(registry)));
        ApiServices {
            classifier: Arc::new(OperationService::new(clock, config.clone())),
            pipeline: build_operation_pipeline(service, &config),
            password: BackendPassword::new(TEST_PASSWORD),
            board,
        }
    }

    pub fn test_state() -> AppState {
        let services = test_services();
        AppState {
            classifier: services.classifier,
            pipeline: services.pipeline,
            password: services.password,
            shutdown: Arc::new(ShutdownController::new()),
            board: services.board,
            start_time: Instant::now(),
        }
    }
}
