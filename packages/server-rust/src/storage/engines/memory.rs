//! In-memory [`ScoreStore`] implementation.
//!
//! The committed record set is an immutable [`TableState`] published through
//! [`ArcSwap`]: readers load the current `Arc` and keep a consistent snapshot
//! for as long as they hold it, without locking. Writers are serialized by a
//! mutex, work on a private copy, and publish it with a single pointer swap
//! on commit. A dropped transaction simply discards its copy.

use std::collections::{BTreeMap, HashSet};
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::{Mutex, MutexGuard};
use scoreboard_core::order::select;
use scoreboard_core::{
    AnchorNotFound, ClockSource, Cursor, Direction, NewScore, Placement, PlacementUpdate,
    RankOrder, ScoreId, ScoreRecord,
};

use crate::storage::store::{FindMany, ScoreStore, ScoreTable, ScoreTxn, StoreError};

/// Records plus the placement index, as one immutable unit.
#[derive(Debug, Clone, Default)]
struct TableState {
    records: BTreeMap<ScoreId, ScoreRecord>,
    by_placement: BTreeMap<Placement, ScoreId>,
}

impl TableState {
    fn get(&self, id: ScoreId) -> Option<ScoreRecord> {
        self.records.get(&id).cloned()
    }

    fn find_many(&self, query: &FindMany) -> Result<Vec<ScoreRecord>, StoreError> {
        match query.order {
            RankOrder::Placement => {
                self.find_placed(query.cursor, query.take.unwrap_or(usize::MAX))
            }
            RankOrder::Ranking => {
                let mut sorted: Vec<ScoreRecord> = self.records.values().cloned().collect();
                RankOrder::Ranking.sort(&mut sorted);
                Ok(select(&sorted, query.cursor, query.take)?)
            }
        }
    }

    /// Placement-ordered fetch served from the placement index.
    fn find_placed(
        &self,
        cursor: Option<Cursor>,
        take: usize,
    ) -> Result<Vec<ScoreRecord>, StoreError> {
        let ids: Vec<ScoreId> = match cursor {
            None => self.by_placement.values().take(take).copied().collect(),
            Some(cursor) => {
                let anchor = self
                    .records
                    .get(&cursor.anchor)
                    .and_then(|r| r.placement)
                    .ok_or(AnchorNotFound(cursor.anchor))?;

                match cursor.direction {
                    Direction::Forward => {
                        let start = if cursor.include_anchor {
                            Bound::Included(anchor)
                        } else {
                            Bound::Excluded(anchor)
                        };
                        self.by_placement
                            .range((start, Bound::Unbounded))
                            .take(take)
                            .map(|(_, id)| *id)
                            .collect()
                    }
                    Direction::Backward => {
                        let end = if cursor.include_anchor {
                            Bound::Included(anchor)
                        } else {
                            Bound::Excluded(anchor)
                        };
                        let mut ids: Vec<ScoreId> = self
                            .by_placement
                            .range((Bound::Unbounded, end))
                            .rev()
                            .take(take)
                            .map(|(_, id)| *id)
                            .collect();
                        ids.reverse();
                        ids
                    }
                }
            }
        };

        ids.into_iter()
            .map(|id| self.get(id).ok_or(StoreError::UnknownRecord(id)))
            .collect()
    }

    fn apply_bulk(&mut self, updates: &[PlacementUpdate]) -> Result<(), StoreError> {
        let mut updated: HashSet<ScoreId> = HashSet::with_capacity(updates.len());
        for update in updates {
            if !updated.insert(update.id) {
                return Err(StoreError::DuplicateUpdate(update.id));
            }
        }
        let mut claimed = HashSet::with_capacity(updates.len());
        for update in updates {
            if !self.records.contains_key(&update.id) {
                return Err(StoreError::UnknownRecord(update.id));
            }
            if !claimed.insert(update.placement) {
                return Err(StoreError::DuplicatePlacement(update.placement));
            }
            if let Some(holder) = self.by_placement.get(&update.placement) {
                if !updated.contains(holder) {
                    return Err(StoreError::DuplicatePlacement(update.placement));
                }
            }
        }

        // Clear every old slot first so a record moving into a slot another
        // updated record is vacating does not get its index entry removed.
        for update in updates {
            if let Some(old) = self.records.get(&update.id).and_then(|r| r.placement) {
                self.by_placement.remove(&old);
            }
        }
        for update in updates {
            if let Some(record) = self.records.get_mut(&update.id) {
                record.placement = Some(update.placement);
            }
            self.by_placement.insert(update.placement, update.id);
        }
        Ok(())
    }
}

/// In-memory score store for one mode.
pub struct MemoryScoreStore {
    name: String,
    state: ArcSwap<TableState>,
    writer: Mutex<()>,
    next_id: AtomicU64,
    clock: Arc<dyn ClockSource>,
}

impl MemoryScoreStore {
    /// Creates an empty store for `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, clock: Arc<dyn ClockSource>) -> Self {
        Self {
            name: name.into(),
            state: ArcSwap::from_pointee(TableState::default()),
            writer: Mutex::new(()),
            next_id: AtomicU64::new(1),
            clock,
        }
    }
}

impl ScoreStore for MemoryScoreStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn begin_read(&self) -> Result<Box<dyn ScoreTable + '_>, StoreError> {
        Ok(Box::new(MemorySnapshot(self.state.load_full())))
    }

    fn begin_write(&self) -> Result<Box<dyn ScoreTxn + '_>, StoreError> {
        let guard = self.writer.lock();
        // Copy after taking the lock: no other writer can publish in between.
        let staged = TableState::clone(&self.state.load());
        Ok(Box::new(MemoryTxn {
            store: self,
            staged,
            _guard: guard,
        }))
    }
}

/// Committed state as of `begin_read`.
struct MemorySnapshot(Arc<TableState>);

impl ScoreTable for MemorySnapshot {
    fn get(&self, id: ScoreId) -> Result<Option<ScoreRecord>, StoreError> {
        Ok(self.0.get(id))
    }

    fn find_many(&self, query: &FindMany) -> Result<Vec<ScoreRecord>, StoreError> {
        self.0.find_many(query)
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.0.records.len())
    }
}

/// Write transaction holding the store's writer lock and a private copy.
struct MemoryTxn<'a> {
    store: &'a MemoryScoreStore,
    staged: TableState,
    _guard: MutexGuard<'a, ()>,
}

impl ScoreTable for MemoryTxn<'_> {
    fn get(&self, id: ScoreId) -> Result<Option<ScoreRecord>, StoreError> {
        Ok(self.staged.get(id))
    }

    fn find_many(&self, query: &FindMany) -> Result<Vec<ScoreRecord>, StoreError> {
        self.staged.find_many(query)
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.staged.records.len())
    }
}

impl ScoreTxn for MemoryTxn<'_> {
    fn insert(&mut self, score: NewScore) -> Result<ScoreRecord, StoreError> {
        // Ids come from a counter outside the staged copy, so an id handed
        // to a rolled-back insert is never issued again.
        let id = self.store.next_id.fetch_add(1, Ordering::Relaxed);
        let record = ScoreRecord::from_new(id, self.store.clock.now_millis(), score);
        self.staged.records.insert(id, record.clone());
        Ok(record)
    }

    fn apply_bulk(&mut self, updates: &[PlacementUpdate]) -> Result<(), StoreError> {
        self.staged.apply_bulk(updates)
    }

    fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryTxn {
            store,
            staged,
            _guard,
        } = *self;
        store.state.store(Arc::new(staged));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use scoreboard_core::{ManualClock, ScoreExtras};

    use super::*;

    fn store() -> (MemoryScoreStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000));
        (MemoryScoreStore::new("timing", clock.clone()), clock)
    }

    fn new_score(score: i64) -> NewScore {
        NewScore {
            score,
            username: "abc".to_string(),
            extras: ScoreExtras::default(),
        }
    }

    fn ids(records: &[ScoreRecord]) -> Vec<ScoreId> {
        records.iter().map(|r| r.id).collect()
    }

    /// Inserts `n` records and places them in id order.
    fn seeded(n: u32) -> MemoryScoreStore {
        let (store, clock) = store();
        let mut updates = Vec::new();
        for p in 1..=n {
            let record = store.insert(new_score(i64::from(p))).unwrap();
            clock.advance(1);
            updates.push(PlacementUpdate {
                id: record.id,
                placement: p,
            });
        }
        store.apply_bulk(&updates).unwrap();
        store
    }

    #[test]
    fn insert_assigns_sequential_ids_and_clock_time() {
        let (store, clock) = store();
        let a = store.insert(new_score(10)).unwrap();
        clock.advance(5);
        let b = store.insert(new_score(20)).unwrap();

        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!((a.created_on, b.created_on), (1_000, 1_005));
        assert_eq!(a.placement, None);
    }

    #[test]
    fn uncommitted_transaction_is_invisible_and_discarded() {
        let (store, _) = store();
        {
            let mut txn = store.begin_write().unwrap();
            txn.insert(new_score(1)).unwrap();
            assert_eq!(txn.len().unwrap(), 1);
            assert_eq!(store.begin_read().unwrap().len().unwrap(), 0);
        }
        assert!(store.begin_read().unwrap().is_empty().unwrap());
    }

    #[test]
    fn rolled_back_ids_are_not_reused() {
        let (store, _) = store();
        {
            let mut txn = store.begin_write().unwrap();
            assert_eq!(txn.insert(new_score(1)).unwrap().id, 1);
        }
        assert_eq!(store.insert(new_score(1)).unwrap().id, 2);
    }

    #[test]
    fn snapshot_is_stable_across_commits() {
        let store = seeded(3);
        let snapshot = store.begin_read().unwrap();

        store.insert(new_score(99)).unwrap();

        assert_eq!(snapshot.len().unwrap(), 3);
        assert_eq!(store.begin_read().unwrap().len().unwrap(), 4);
    }

    #[test]
    fn placement_order_skips_unplaced() {
        let store = seeded(2);
        store.insert(new_score(50)).unwrap();

        let read = store.begin_read().unwrap();
        let out = read.find_many(&FindMany::all(RankOrder::Placement)).unwrap();
        assert_eq!(ids(&out), vec![1, 2]);

        let err = read
            .find_many(&FindMany::around(RankOrder::Placement, Cursor::at(3), 1))
            .unwrap_err();
        assert_eq!(err, StoreError::AnchorNotFound(AnchorNotFound(3)));
    }

    #[test]
    fn placement_cursor_reads_both_directions() {
        let store = seeded(6);
        let read = store.begin_read().unwrap();

        let before = read
            .find_many(&FindMany::around(RankOrder::Placement, Cursor::before(4), 2))
            .unwrap();
        assert_eq!(ids(&before), vec![2, 3]);

        let after = read
            .find_many(&FindMany::around(RankOrder::Placement, Cursor::at(4), 10))
            .unwrap();
        assert_eq!(ids(&after), vec![4, 5, 6]);
    }

    #[test]
    fn ranking_order_sorts_by_score_then_time() {
        let (store, clock) = store();
        store.insert(new_score(100)).unwrap();
        clock.advance(1);
        store.insert(new_score(200)).unwrap();
        clock.advance(1);
        store.insert(new_score(100)).unwrap();

        let read = store.begin_read().unwrap();
        let out = read.find_many(&FindMany::all(RankOrder::Ranking)).unwrap();
        assert_eq!(ids(&out), vec![2, 1, 3]);
    }

    #[test]
    fn apply_bulk_swaps_placements() {
        let store = seeded(3);
        store
            .apply_bulk(&[
                PlacementUpdate { id: 1, placement: 3 },
                PlacementUpdate { id: 3, placement: 1 },
            ])
            .unwrap();

        let read = store.begin_read().unwrap();
        let out = read.find_many(&FindMany::all(RankOrder::Placement)).unwrap();
        assert_eq!(ids(&out), vec![3, 2, 1]);
    }

    #[test]
    fn apply_bulk_rejects_unknown_id_without_changes() {
        let store = seeded(2);
        let err = store
            .apply_bulk(&[
                PlacementUpdate { id: 2, placement: 1 },
                PlacementUpdate { id: 1, placement: 2 },
                PlacementUpdate { id: 42, placement: 3 },
            ])
            .unwrap_err();
        assert_eq!(err, StoreError::UnknownRecord(42));

        let read = store.begin_read().unwrap();
        assert_eq!(read.get(1).unwrap().unwrap().placement, Some(1));
    }

    #[test]
    fn apply_bulk_rejects_collision_with_untouched_record() {
        let store = seeded(3);
        let err = store
            .apply_bulk(&[PlacementUpdate { id: 1, placement: 2 }])
            .unwrap_err();
        assert_eq!(err, StoreError::DuplicatePlacement(2));
    }

    #[test]
    fn apply_bulk_rejects_duplicate_in_batch() {
        let store = seeded(2);
        let err = store
            .apply_bulk(&[
                PlacementUpdate { id: 1, placement: 5 },
                PlacementUpdate { id: 2, placement: 5 },
            ])
            .unwrap_err();
        assert_eq!(err, StoreError::DuplicatePlacement(5));
    }

    #[test]
    fn apply_bulk_rejects_repeated_record() {
        let store = seeded(2);
        let err = store
            .apply_bulk(&[
                PlacementUpdate { id: 1, placement: 5 },
                PlacementUpdate { id: 1, placement: 6 },
            ])
            .unwrap_err();
        assert_eq!(err, StoreError::DuplicateUpdate(1));

        let placed: Vec<_> = store
            .begin_read()
            .unwrap()
            .find_many(&FindMany::all(RankOrder::Placement))
            .unwrap()
            .into_iter()
            .map(|r| (r.id, r.placement))
            .collect();
        assert_eq!(placed, vec![(1, Some(1)), (2, Some(2))]);
    }
}
