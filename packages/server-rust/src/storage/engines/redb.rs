//! [`ScoreStore`] backed by an embedded redb database file.
//!
//! One database file holds every mode. Per mode there are two tables:
//!
//! - `scores::{mode}`: `id → MsgPack(ScoreRecord)` (named fields via `rmp-serde`)
//! - `placements::{mode}`: `placement → id`, the ordered index that serves
//!   placement-ordered range reads
//!
//! plus one shared `sequences` table holding the next id per mode. Reads run
//! in redb read transactions (MVCC snapshots); every write path runs in a
//! single redb write transaction, so aborted writes leave no trace.

use std::collections::HashSet;
use std::ops::Bound;
use std::sync::Arc;

use redb::{Database, ReadTransaction, ReadableTable, TableDefinition, WriteTransaction};
use scoreboard_core::order::select;
use scoreboard_core::{
    AnchorNotFound, ClockSource, Cursor, Direction, NewScore, Placement, PlacementUpdate,
    RankOrder, ScoreId, ScoreRecord,
};

use crate::storage::store::{FindMany, ScoreStore, ScoreTable, ScoreTxn, StoreError};

/// Next id to assign, keyed by mode name.
const SEQUENCES: TableDefinition<'static, &'static str, u64> = TableDefinition::new("sequences");

fn backend(err: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(err.to_string())
}

fn encode(record: &ScoreRecord) -> Result<Vec<u8>, StoreError> {
    rmp_serde::to_vec_named(record).map_err(|e| StoreError::Encoding(e.to_string()))
}

fn decode(bytes: &[u8]) -> Result<ScoreRecord, StoreError> {
    rmp_serde::from_slice(bytes).map_err(|e| StoreError::Encoding(e.to_string()))
}

/// Opens (or creates) the database file shared by all modes.
///
/// # Errors
///
/// Returns [`StoreError::Backend`] if the file cannot be opened or created.
pub fn open_database(path: &std::path::Path) -> Result<Arc<Database>, StoreError> {
    Database::create(path).map(Arc::new).map_err(backend)
}

/// redb-backed score store for one mode.
pub struct RedbScoreStore {
    name: String,
    records_table: String,
    placements_table: String,
    db: Arc<Database>,
    clock: Arc<dyn ClockSource>,
}

impl RedbScoreStore {
    /// Opens the store for `name`, creating its tables if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the tables cannot be created.
    pub fn open(
        db: Arc<Database>,
        name: impl Into<String>,
        clock: Arc<dyn ClockSource>,
    ) -> Result<Self, StoreError> {
        let name = name.into();
        let store = Self {
            records_table: format!("scores::{name}"),
            placements_table: format!("placements::{name}"),
            name,
            db,
            clock,
        };

        // Opening a table in a write transaction creates it; read
        // transactions fail on tables that were never created.
        let txn = store.db.begin_write().map_err(backend)?;
        txn.open_table(store.records_def()).map_err(backend)?;
        txn.open_table(store.placements_def()).map_err(backend)?;
        txn.open_table(SEQUENCES).map_err(backend)?;
        txn.commit().map_err(backend)?;

        Ok(store)
    }

    fn records_def(&self) -> TableDefinition<'_, u64, &'static [u8]> {
        TableDefinition::new(&self.records_table)
    }

    fn placements_def(&self) -> TableDefinition<'_, u32, u64> {
        TableDefinition::new(&self.placements_table)
    }
}

impl ScoreStore for RedbScoreStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn begin_read(&self) -> Result<Box<dyn ScoreTable + '_>, StoreError> {
        let txn = self.db.begin_read().map_err(backend)?;
        Ok(Box::new(RedbRead { store: self, txn }))
    }

    fn begin_write(&self) -> Result<Box<dyn ScoreTxn + '_>, StoreError> {
        let txn = self.db.begin_write().map_err(backend)?;
        Ok(Box::new(RedbWrite { store: self, txn }))
    }
}

// ---------------------------------------------------------------------------
// Table-generic helpers (shared by read and write transactions)
// ---------------------------------------------------------------------------

fn load<T: ReadableTable<u64, &'static [u8]>>(
    records: &T,
    id: ScoreId,
) -> Result<Option<ScoreRecord>, StoreError> {
    match records.get(id).map_err(backend)? {
        Some(guard) => decode(guard.value()).map(Some),
        None => Ok(None),
    }
}

fn load_all<T: ReadableTable<u64, &'static [u8]>>(
    records: &T,
) -> Result<Vec<ScoreRecord>, StoreError> {
    let mut out = Vec::new();
    for entry in records.iter().map_err(backend)? {
        let (_, value) = entry.map_err(backend)?;
        out.push(decode(value.value())?);
    }
    Ok(out)
}

fn count<T: ReadableTable<u64, &'static [u8]>>(records: &T) -> Result<usize, StoreError> {
    let mut n = 0;
    for entry in records.iter().map_err(backend)? {
        entry.map_err(backend)?;
        n += 1;
    }
    Ok(n)
}

/// Reads up to `take` ids from an index range, nearest-to-the-end first
/// when `reverse`, and returns them in ascending placement order.
fn drain_ids(
    range: redb::Range<'_, u32, u64>,
    reverse: bool,
    take: usize,
) -> Result<Vec<ScoreId>, StoreError> {
    let mut ids = Vec::new();
    if reverse {
        for entry in range.rev().take(take) {
            let (_, id) = entry.map_err(backend)?;
            ids.push(id.value());
        }
        ids.reverse();
    } else {
        for entry in range.take(take) {
            let (_, id) = entry.map_err(backend)?;
            ids.push(id.value());
        }
    }
    Ok(ids)
}

fn find_many_in<R, P>(records: &R, index: &P, query: &FindMany) -> Result<Vec<ScoreRecord>, StoreError>
where
    R: ReadableTable<u64, &'static [u8]>,
    P: ReadableTable<u32, u64>,
{
    match query.order {
        RankOrder::Ranking => {
            let mut sorted = load_all(records)?;
            RankOrder::Ranking.sort(&mut sorted);
            Ok(select(&sorted, query.cursor, query.take)?)
        }
        RankOrder::Placement => {
            let take = query.take.unwrap_or(usize::MAX);
            let ids = match query.cursor {
                None => drain_ids(index.iter().map_err(backend)?, false, take)?,
                Some(cursor) => find_placed_ids(records, index, cursor, take)?,
            };
            ids.into_iter()
                .map(|id| load(records, id)?.ok_or(StoreError::UnknownRecord(id)))
                .collect()
        }
    }
}

fn find_placed_ids<R, P>(
    records: &R,
    index: &P,
    cursor: Cursor,
    take: usize,
) -> Result<Vec<ScoreId>, StoreError>
where
    R: ReadableTable<u64, &'static [u8]>,
    P: ReadableTable<u32, u64>,
{
    let anchor: Placement = load(records, cursor.anchor)?
        .and_then(|r| r.placement)
        .ok_or(AnchorNotFound(cursor.anchor))?;

    let edge = if cursor.include_anchor {
        Bound::Included(anchor)
    } else {
        Bound::Excluded(anchor)
    };

    match cursor.direction {
        Direction::Forward => {
            let range = index
                .range::<u32>((edge, Bound::Unbounded))
                .map_err(backend)?;
            drain_ids(range, false, take)
        }
        Direction::Backward => {
            let range = index
                .range::<u32>((Bound::Unbounded, edge))
                .map_err(backend)?;
            drain_ids(range, true, take)
        }
    }
}

// ---------------------------------------------------------------------------
// Read transaction
// ---------------------------------------------------------------------------

struct RedbRead<'a> {
    store: &'a RedbScoreStore,
    txn: ReadTransaction,
}

impl ScoreTable for RedbRead<'_> {
    fn get(&self, id: ScoreId) -> Result<Option<ScoreRecord>, StoreError> {
        let records = self
            .txn
            .open_table(self.store.records_def())
            .map_err(backend)?;
        load(&records, id)
    }

    fn find_many(&self, query: &FindMany) -> Result<Vec<ScoreRecord>, StoreError> {
        let records = self
            .txn
            .open_table(self.store.records_def())
            .map_err(backend)?;
        let index = self
            .txn
            .open_table(self.store.placements_def())
            .map_err(backend)?;
        find_many_in(&records, &index, query)
    }

    fn len(&self) -> Result<usize, StoreError> {
        let records = self
            .txn
            .open_table(self.store.records_def())
            .map_err(backend)?;
        count(&records)
    }
}

// ---------------------------------------------------------------------------
// Write transaction
// ---------------------------------------------------------------------------

struct RedbWrite<'a> {
    store: &'a RedbScoreStore,
    txn: WriteTransaction,
}

impl RedbWrite<'_> {
    fn next_id(&self) -> Result<ScoreId, StoreError> {
        let mut sequences = self.txn.open_table(SEQUENCES).map_err(backend)?;
        let key = self.store.name.as_str();
        let next = sequences
            .get(key)
            .map_err(backend)?
            .map_or(1, |guard| guard.value());
        sequences.insert(key, next + 1).map_err(backend)?;
        Ok(next)
    }
}

impl ScoreTable for RedbWrite<'_> {
    fn get(&self, id: ScoreId) -> Result<Option<ScoreRecord>, StoreError> {
        let records = self
            .txn
            .open_table(self.store.records_def())
            .map_err(backend)?;
        load(&records, id)
    }

    fn find_many(&self, query: &FindMany) -> Result<Vec<ScoreRecord>, StoreError> {
        let records = self
            .txn
            .open_table(self.store.records_def())
            .map_err(backend)?;
        let index = self
            .txn
            .open_table(self.store.placements_def())
            .map_err(backend)?;
        find_many_in(&records, &index, query)
    }

    fn len(&self) -> Result<usize, StoreError> {
        let records = self
            .txn
            .open_table(self.store.records_def())
            .map_err(backend)?;
        count(&records)
    }
}

impl ScoreTxn for RedbWrite<'_> {
    fn insert(&mut self, score: NewScore) -> Result<ScoreRecord, StoreError> {
        let id = self.next_id()?;
        let record = ScoreRecord::from_new(id, self.store.clock.now_millis(), score);
        let bytes = encode(&record)?;

        let mut records = self
            .txn
            .open_table(self.store.records_def())
            .map_err(backend)?;
        records.insert(id, bytes.as_slice()).map_err(backend)?;
        Ok(record)
    }

    fn apply_bulk(&mut self, updates: &[PlacementUpdate]) -> Result<(), StoreError> {
        let mut records = self
            .txn
            .open_table(self.store.records_def())
            .map_err(backend)?;
        let mut index = self
            .txn
            .open_table(self.store.placements_def())
            .map_err(backend)?;

        // Validate the whole batch before touching either table.
        let mut updated: HashSet<ScoreId> = HashSet::with_capacity(updates.len());
        for update in updates {
            if !updated.insert(update.id) {
                return Err(StoreError::DuplicateUpdate(update.id));
            }
        }
        let mut claimed = HashSet::with_capacity(updates.len());
        let mut staged = Vec::with_capacity(updates.len());
        for update in updates {
            let record = load(&records, update.id)?.ok_or(StoreError::UnknownRecord(update.id))?;
            if !claimed.insert(update.placement) {
                return Err(StoreError::DuplicatePlacement(update.placement));
            }
            let holder = index
                .get(update.placement)
                .map_err(backend)?
                .map(|guard| guard.value());
            if let Some(holder) = holder {
                if !updated.contains(&holder) {
                    return Err(StoreError::DuplicatePlacement(update.placement));
                }
            }
            staged.push((record, update.placement));
        }

        for (record, _) in &staged {
            if let Some(old) = record.placement {
                index.remove(old).map_err(backend)?;
            }
        }
        for (mut record, placement) in staged {
            record.placement = Some(placement);
            let bytes = encode(&record)?;
            records.insert(record.id, bytes.as_slice()).map_err(backend)?;
            index.insert(placement, record.id).map_err(backend)?;
        }
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.txn.commit().map_err(backend)
    }
}
