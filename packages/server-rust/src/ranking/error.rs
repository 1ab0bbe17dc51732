//! Ranking engine errors.

use scoreboard_core::{ScoreId, WindowError};

use crate::storage::StoreError;

/// Errors returned by [`Leaderboard`](super::Leaderboard) operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RankingError {
    #[error(transparent)]
    InvalidArgument(#[from] WindowError),
    #[error("unknown mode: {0}")]
    UnknownMode(String),
    #[error("score {0} not found")]
    RecordNotFound(ScoreId),
    /// The insert+recompute transaction did not commit; nothing changed.
    #[error("transaction failed: {0}")]
    TransactionFailure(StoreError),
    #[error("storage error: {0}")]
    Storage(StoreError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for RankingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AnchorNotFound(anchor) => Self::RecordNotFound(anchor.0),
            other => Self::Storage(other),
        }
    }
}

impl RankingError {
    /// True for errors caused by the caller's input.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument(_) | Self::UnknownMode(_) | Self::RecordNotFound(_)
        )
    }
}
