//! Windowed reads over one mode's records.
//!
//! A window is either the top of the board or a run centered on a record:
//! up to `load_count / 2` records strictly before the center, then the
//! center and enough records after it to fill `load_count`. Both halves
//! are cursor-relative fetches against the same [`ScoreTable`], so callers
//! pass a single read snapshot to see one consistent placement state.

use scoreboard_core::{Cursor, RankOrder, ScoreId, ScoreRecord, WindowQuery};

use crate::ranking::RankingError;
use crate::storage::{FindMany, ScoreTable};

/// Serves `get_single` and `get_window` in a fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowedReader {
    order: RankOrder,
}

impl WindowedReader {
    #[must_use]
    pub fn new(order: RankOrder) -> Self {
        Self { order }
    }

    #[must_use]
    pub fn order(&self) -> RankOrder {
        self.order
    }

    /// Point lookup.
    ///
    /// # Errors
    ///
    /// [`RankingError::RecordNotFound`] if `id` is not in the table.
    pub fn get_single<T: ScoreTable + ?Sized>(
        &self,
        table: &T,
        id: ScoreId,
    ) -> Result<ScoreRecord, RankingError> {
        table.get(id)?.ok_or(RankingError::RecordNotFound(id))
    }

    /// Window read.
    ///
    /// # Errors
    ///
    /// [`RankingError::RecordNotFound`] if the center record is not in the
    /// ordered set.
    pub fn get_window<T: ScoreTable + ?Sized>(
        &self,
        table: &T,
        query: &WindowQuery,
    ) -> Result<Vec<ScoreRecord>, RankingError> {
        let Some(center) = query.center_on() else {
            return Ok(table.find_many(&FindMany::top(self.order, query.load_count()))?);
        };

        let mut window = table.find_many(&FindMany::around(
            self.order,
            Cursor::before(center),
            query.before_budget(),
        ))?;
        let after = table.find_many(&FindMany::around(
            self.order,
            Cursor::at(center),
            query.after_budget(window.len()),
        ))?;
        window.extend(after);
        Ok(window)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use scoreboard_core::{ManualClock, NewScore, PlacementUpdate, ScoreExtras};

    use super::*;
    use crate::storage::engines::MemoryScoreStore;
    use crate::storage::ScoreStore;

    /// Store with `n` records placed 1..=n in id order.
    fn placed_store(n: u32) -> MemoryScoreStore {
        let store = MemoryScoreStore::new("timing", Arc::new(ManualClock::new(0)));
        let mut updates = Vec::new();
        for p in 1..=n {
            let record = store
                .insert(NewScore {
                    score: i64::from(1000 - p),
                    username: "abc".to_string(),
                    extras: ScoreExtras::default(),
                })
                .unwrap();
            updates.push(PlacementUpdate {
                id: record.id,
                placement: p,
            });
        }
        store.apply_bulk(&updates).unwrap();
        store
    }

    fn placements(records: &[ScoreRecord]) -> Vec<u32> {
        records.iter().filter_map(|r| r.placement).collect()
    }

    fn window(store: &MemoryScoreStore, load: i64, center: Option<ScoreId>) -> Vec<ScoreRecord> {
        let reader = WindowedReader::new(RankOrder::Placement);
        let snapshot = store.begin_read().unwrap();
        let query = WindowQuery::new(Some(load), center).unwrap();
        reader.get_window(&*snapshot, &query).unwrap()
    }

    #[test]
    fn top_window_is_first_load_count_placements() {
        let store = placed_store(15);
        assert_eq!(placements(&window(&store, 10, None)), (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn top_window_shorter_than_board() {
        let store = placed_store(3);
        assert_eq!(placements(&window(&store, 10, None)), vec![1, 2, 3]);
    }

    #[test]
    fn centered_window_in_the_middle() {
        let store = placed_store(20);
        assert_eq!(placements(&window(&store, 5, Some(10))), vec![8, 9, 10, 11, 12]);
    }

    #[test]
    fn centered_window_near_top_absorbs_shortfall() {
        let store = placed_store(20);
        assert_eq!(placements(&window(&store, 6, Some(2))), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(placements(&window(&store, 6, Some(1))), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn centered_window_shrinks_at_bottom() {
        let store = placed_store(10);
        assert_eq!(placements(&window(&store, 6, Some(9))), vec![6, 7, 8, 9, 10]);
    }

    #[test]
    fn load_count_one_is_just_the_center() {
        let store = placed_store(5);
        assert_eq!(placements(&window(&store, 1, Some(3))), vec![3]);
    }

    #[test]
    fn missing_center_is_not_found() {
        let store = placed_store(5);
        let reader = WindowedReader::new(RankOrder::Placement);
        let snapshot = store.begin_read().unwrap();
        let query = WindowQuery::new(None, Some(99)).unwrap();
        assert_eq!(
            reader.get_window(&*snapshot, &query),
            Err(RankingError::RecordNotFound(99))
        );
    }

    #[test]
    fn get_single_hits_and_misses() {
        let store = placed_store(2);
        let reader = WindowedReader::new(RankOrder::Placement);
        let snapshot = store.begin_read().unwrap();
        assert_eq!(reader.get_single(&*snapshot, 2).unwrap().placement, Some(2));
        assert_eq!(
            reader.get_single(&*snapshot, 3),
            Err(RankingError::RecordNotFound(3))
        );
    }
}
