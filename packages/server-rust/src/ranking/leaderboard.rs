//! Async entry point of the ranking engine.
//!
//! Store work is synchronous, so every call hops onto the blocking pool.
//! Reads open one read snapshot per call. Submissions take the mode's
//! write gate and run insert, recompute, and the re-read of the new record
//! inside a single store write transaction: either all of it commits or
//! none of it is visible.

use std::sync::Arc;

use scoreboard_core::{NewScore, ScoreId, ScoreRecord, WindowQuery};
use tracing::{debug, info, warn};

use crate::ranking::{RankingError, RecomputeSummary, TableRegistry};

/// Leaderboard operations over every registered mode.
#[derive(Clone)]
pub struct Leaderboard {
    registry: Arc<TableRegistry>,
}

impl Leaderboard {
    #[must_use]
    pub fn new(registry: Arc<TableRegistry>) -> Self {
        Self { registry }
    }

    #[must_use]
    pub fn registry(&self) -> &TableRegistry {
        &self.registry
    }

    /// Point lookup of `id` in `mode`.
    ///
    /// # Errors
    ///
    /// `UnknownMode`, `RecordNotFound`, or a storage failure.
    pub async fn get_single(&self, mode: &str, id: ScoreId) -> Result<ScoreRecord, RankingError> {
        let table = self.registry.resolve(mode)?;
        let store = table.store.clone();
        let reader = table.reader;
        run_blocking(move || {
            let snapshot = store.begin_read()?;
            reader.get_single(&*snapshot, id)
        })
        .await
    }

    /// Window read of `mode`.
    ///
    /// # Errors
    ///
    /// `UnknownMode`, `RecordNotFound` for a missing center, or a storage
    /// failure.
    pub async fn get_window(
        &self,
        mode: &str,
        query: WindowQuery,
    ) -> Result<Vec<ScoreRecord>, RankingError> {
        let table = self.registry.resolve(mode)?;
        let store = table.store.clone();
        let reader = table.reader;
        let window = run_blocking(move || {
            let snapshot = store.begin_read()?;
            reader.get_window(&*snapshot, &query)
        })
        .await?;
        debug!(
            mode,
            load_count = query.load_count(),
            center_on = ?query.center_on(),
            returned = window.len(),
            "window read"
        );
        Ok(window)
    }

    /// Inserts `score` into `mode`, recomputes every placement, and returns
    /// the new record with its placement.
    ///
    /// # Errors
    ///
    /// `UnknownMode` before anything is touched; `TransactionFailure` if any
    /// step of the write fails, in which case the mode is unchanged.
    pub async fn submit(&self, mode: &str, score: NewScore) -> Result<ScoreRecord, RankingError> {
        let table = self.registry.resolve(mode)?;
        let store = table.store.clone();
        let reader = table.reader;
        let engine = table.engine;
        let name = table.name();

        // The owned guard moves into the blocking task so the gate stays
        // held until the transaction ends, even if this future is dropped.
        let gate = table.write_gate.clone().lock_owned().await;

        let outcome = run_blocking(move || {
            let _gate = gate;
            let mut txn = store.begin_write().map_err(RankingError::TransactionFailure)?;
            let inserted = txn.insert(score).map_err(RankingError::TransactionFailure)?;
            let summary = engine
                .recompute(name, &mut *txn)
                .map_err(RankingError::TransactionFailure)?;
            let record = reader.get_single(&*txn, inserted.id)?;
            txn.commit().map_err(RankingError::TransactionFailure)?;
            Ok::<(ScoreRecord, RecomputeSummary), RankingError>((record, summary))
        })
        .await;

        match outcome {
            Ok((record, summary)) => {
                info!(
                    mode = name,
                    id = record.id,
                    score = record.score,
                    placement = ?record.placement,
                    total = summary.total,
                    changed = summary.changed,
                    "score submitted"
                );
                Ok(record)
            }
            Err(err) => {
                warn!(mode = name, error = %err, "score submission rolled back");
                Err(err)
            }
        }
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, RankingError>
where
    F: FnOnce() -> Result<T, RankingError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| RankingError::Internal(format!("blocking task failed: {e}")))?
}
