//! Wiring from configuration to the services the HTTP layer serves.

use std::sync::Arc;

use scoreboard_core::ClockSource;
use tracing::info;

use crate::network::{ApiServices, BackendPassword, BoardInfo};
use crate::ranking::{Leaderboard, TableRegistry};
use crate::service::{build_operation_pipeline, LeaderboardService, OperationService, ServerConfig};
use crate::storage::{StorageConfig, StoreError, StoreFactory};

/// Opens every mode's store and composes the operation pipeline.
///
/// # Errors
///
/// Returns [`StoreError`] if the storage backend cannot be opened.
pub fn build_services(
    storage: StorageConfig,
    server: ServerConfig,
    password: BackendPassword,
    clock: Arc<dyn ClockSource>,
) -> Result<ApiServices, StoreError> {
    let factory = StoreFactory::new(storage, Arc::clone(&clock))?;
    let registry = Arc::new(TableRegistry::build(&factory)?);
    info!(
        backend = factory.backend_name(),
        modes = ?registry.modes(),
        "score stores opened"
    );

    let board = Arc::new(BoardInfo {
        storage_backend: factory.backend_name(),
        modes: registry.modes(),
    });
    let server = Arc::new(server);
    let service = Arc::new(LeaderboardService::new(Leaderboard::new(registry)));
    Ok(ApiServices {
        classifier: Arc::new(OperationService::new(clock, Arc::clone(&server))),
        pipeline: build_operation_pipeline(service, &server),
        password,
        board,
    })
}
