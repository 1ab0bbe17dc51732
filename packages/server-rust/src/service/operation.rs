//! Operation types flowing through the service pipeline.

use scoreboard_core::{NewScore, ScoreId, ScoreRecord, WindowQuery};

use crate::ranking::RankingError;

/// Context carried with every operation through the pipeline.
#[derive(Debug, Clone)]
pub struct OperationContext {
    pub call_id: u64,
    /// Mode named in the request path; resolved by the leaderboard.
    pub mode: String,
    /// Milliseconds since Unix epoch when the operation was classified.
    pub started_at_ms: i64,
    pub call_timeout_ms: u64,
}

impl OperationContext {
    #[must_use]
    pub fn new(call_id: u64, mode: impl Into<String>, started_at_ms: i64, call_timeout_ms: u64) -> Self {
        Self {
            call_id,
            mode: mode.into(),
            started_at_ms,
            call_timeout_ms,
        }
    }
}

/// Typed leaderboard operations.
#[derive(Debug)]
pub enum Operation {
    /// Top-of-board or centered window read.
    GetWindow { ctx: OperationContext, query: WindowQuery },
    /// Point lookup by id.
    GetSingle { ctx: OperationContext, id: ScoreId },
    /// Insert plus placement recomputation.
    SubmitScore { ctx: OperationContext, score: NewScore },
}

impl Operation {
    #[must_use]
    pub fn ctx(&self) -> &OperationContext {
        match self {
            Self::GetWindow { ctx, .. }
            | Self::GetSingle { ctx, .. }
            | Self::SubmitScore { ctx, .. } => ctx,
        }
    }

    /// Short name used in logs and metric labels.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::GetWindow { .. } => "get_window",
            Self::GetSingle { .. } => "get_single",
            Self::SubmitScore { .. } => "submit_score",
        }
    }
}

/// Successful response from the leaderboard service.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationResponse {
    Record(ScoreRecord),
    Records(Vec<ScoreRecord>),
}

/// Errors returned by the operation pipeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OperationError {
    #[error(transparent)]
    Ranking(#[from] RankingError),
    #[error("operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("server overloaded, try again later")]
    Overloaded,
}

/// Errors from turning raw request input into an [`Operation`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifyError {
    #[error("invalid {field}: {reason}")]
    InvalidArgument { field: &'static str, reason: String },
    #[error("submission rejected: {}", errors.join("; "))]
    Validation { errors: Vec<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ctx_and_kind_cover_every_variant() {
        let ops = [
            Operation::GetWindow {
                ctx: OperationContext::new(1, "timing", 0, 100),
                query: WindowQuery::top(),
            },
            Operation::GetSingle {
                ctx: OperationContext::new(2, "timing", 0, 100),
                id: 5,
            },
            Operation::SubmitScore {
                ctx: OperationContext::new(3, "timing", 0, 100),
                score: NewScore {
                    score: 1,
                    username: "abc".to_string(),
                    extras: scoreboard_core::ScoreExtras::default(),
                },
            },
        ];
        let kinds: Vec<_> = ops.iter().map(Operation::kind).collect();
        assert_eq!(kinds, vec!["get_window", "get_single", "submit_score"]);
        let ids: Vec<_> = ops.iter().map(|op| op.ctx().call_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn validation_error_lists_every_problem() {
        let err = ClassifyError::Validation {
            errors: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(err.to_string(), "submission rejected: a; b");
    }
}
