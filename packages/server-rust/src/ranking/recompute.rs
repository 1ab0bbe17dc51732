//! Dense placement recomputation.

use std::time::Instant;

use scoreboard_core::{PlacementUpdate, RankOrder};
use tracing::debug;

use crate::storage::{FindMany, ScoreTxn, StoreError};

/// Outcome of one recomputation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecomputeSummary {
    /// Records in the mode.
    pub total: usize,
    /// Records whose placement was written.
    pub changed: usize,
}

/// Rewrites placements so they are exactly `1..=N` in ranking order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementEngine {
    order: RankOrder,
}

impl PlacementEngine {
    #[must_use]
    pub fn new(order: RankOrder) -> Self {
        Self { order }
    }

    /// Reads every record through `txn` in ranking order, assigns
    /// `index + 1`, and writes the placements that differ in one
    /// `apply_bulk` call.
    ///
    /// Nothing is visible outside `txn` until the caller commits it.
    ///
    /// # Errors
    ///
    /// Propagates store failures; `txn` must then be dropped.
    pub fn recompute<T: ScoreTxn + ?Sized>(
        &self,
        mode: &str,
        txn: &mut T,
    ) -> Result<RecomputeSummary, StoreError> {
        let started = Instant::now();
        let ranked = txn.find_many(&FindMany::all(self.order))?;

        let mut updates = Vec::new();
        for (index, record) in ranked.iter().enumerate() {
            let placement = u32::try_from(index + 1)
                .map_err(|_| StoreError::Backend(format!("{} records exceed placement range", ranked.len())))?;
            if record.placement != Some(placement) {
                updates.push(PlacementUpdate {
                    id: record.id,
                    placement,
                });
            }
        }

        if !updates.is_empty() {
            txn.apply_bulk(&updates)?;
        }

        let elapsed = started.elapsed();
        metrics::histogram!("scoreboard_recompute_duration_seconds", "mode" => mode.to_string())
            .record(elapsed.as_secs_f64());
        debug!(
            mode,
            total = ranked.len(),
            changed = updates.len(),
            elapsed_us = elapsed.as_micros(),
            "placements recomputed"
        );

        Ok(RecomputeSummary {
            total: ranked.len(),
            changed: updates.len(),
        })
    }
}
