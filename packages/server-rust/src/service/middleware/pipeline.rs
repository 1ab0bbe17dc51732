//! Pipeline composition: combines all middleware layers into a single service stack.

use std::sync::Arc;

use tower::util::BoxCloneSyncService;
use tower::ServiceBuilder;

use super::load_shed::LoadShedLayer;
use super::metrics::MetricsLayer;
use super::timeout::TimeoutLayer;
use crate::service::config::ServerConfig;
use crate::service::domain::LeaderboardService;
use crate::service::operation::{Operation, OperationError, OperationResponse};

/// The composed pipeline as stored by request handlers.
pub type OperationPipeline = BoxCloneSyncService<Operation, OperationResponse, OperationError>;

/// Build the operation pipeline by wrapping the `LeaderboardService` with middleware layers.
///
/// Layer order (outermost to innermost):
/// 1. `LoadShedLayer` -- reject when overloaded (fail fast before doing any work)
/// 2. `TimeoutLayer` -- enforce per-operation timeouts
/// 3. `MetricsLayer` -- record timing and outcome (closest to the actual handler)
#[must_use]
pub fn build_operation_pipeline(
    service: Arc<LeaderboardService>,
    config: &ServerConfig,
) -> OperationPipeline {
    BoxCloneSyncService::new(
        ServiceBuilder::new()
            .layer(LoadShedLayer::new(config.max_concurrent_operations))
            .layer(TimeoutLayer)
            .layer(MetricsLayer)
            .service(service),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use scoreboard_core::{ManualClock, NewScore, ScoreExtras, WindowQuery};
    use tower::ServiceExt;

    use super::*;
    use crate::ranking::{Leaderboard, TableRegistry};
    use crate::service::operation::OperationContext;
    use crate::storage::{StorageConfig, StoreFactory};

    fn pipeline(config: &ServerConfig) -> OperationPipeline {
        let factory =
            StoreFactory::new(StorageConfig::Memory, Arc::new(ManualClock::new(0))).unwrap();
        let registry = Arc::new(TableRegistry::build(&factory).unwrap());
        let service = Arc::new(LeaderboardService::new(Leaderboard::new(registry)));
        build_operation_pipeline(service, config)
    }

    #[tokio::test]
    async fn pipeline_routes_through_all_layers() {
        let config = ServerConfig {
            max_concurrent_operations: 100,
            ..ServerConfig::default()
        };
        let svc = pipeline(&config);

        let submitted = svc
            .clone()
            .oneshot(Operation::SubmitScore {
                ctx: OperationContext::new(1, "oneTiming", 0, 5000),
                score: NewScore {
                    score: 3,
                    username: "abc".to_string(),
                    extras: ScoreExtras::default(),
                },
            })
            .await
            .unwrap();
        assert!(matches!(submitted, OperationResponse::Record(ref r) if r.placement == Some(1)));

        let window = svc
            .oneshot(Operation::GetWindow {
                ctx: OperationContext::new(2, "oneTiming", 0, 5000),
                query: WindowQuery::top(),
            })
            .await
            .unwrap();
        assert!(matches!(window, OperationResponse::Records(ref rs) if rs.len() == 1));
    }

    #[tokio::test]
    async fn zero_capacity_pipeline_sheds_everything() {
        let config = ServerConfig {
            max_concurrent_operations: 0,
            ..ServerConfig::default()
        };
        let err = pipeline(&config)
            .oneshot(Operation::GetSingle {
                ctx: OperationContext::new(1, "timing", 0, 5000),
                id: 1,
            })
            .await
            .unwrap_err();
        assert_eq!(err, OperationError::Overloaded);
    }
}
