//! Leaderboard domain service.
//!
//! Implements `tower::Service<Operation>` on `Arc<LeaderboardService>` so
//! the pipeline can clone it per call without copying state.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tower::Service;

use crate::ranking::Leaderboard;
use crate::service::operation::{Operation, OperationError, OperationResponse};

/// Dispatches operations to the [`Leaderboard`].
pub struct LeaderboardService {
    leaderboard: Leaderboard,
}

impl LeaderboardService {
    #[must_use]
    pub fn new(leaderboard: Leaderboard) -> Self {
        Self { leaderboard }
    }
}

impl Service<Operation> for Arc<LeaderboardService> {
    type Response = OperationResponse;
    type Error = OperationError;
    type Future = Pin<Box<dyn Future<Output = Result<OperationResponse, OperationError>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, op: Operation) -> Self::Future {
        let board = self.leaderboard.clone();
        Box::pin(async move {
            let result = match op {
                Operation::GetWindow { ctx, query } => board
                    .get_window(&ctx.mode, query)
                    .await
                    .map(OperationResponse::Records),
                Operation::GetSingle { ctx, id } => board
                    .get_single(&ctx.mode, id)
                    .await
                    .map(OperationResponse::Record),
                Operation::SubmitScore { ctx, score } => board
                    .submit(&ctx.mode, score)
                    .await
                    .map(OperationResponse::Record),
            };
            result.map_err(OperationError::from)
        })
    }
}
