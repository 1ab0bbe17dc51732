//! Score store traits and the ordered fetch request.
//!
//! Defines the storage seam the ranking engine runs against:
//!
//! - [`ScoreTable`]: a read view (consistent snapshot or in-progress write).
//! - [`ScoreTxn`]: an exclusive write transaction. Dropping it without
//!   calling [`commit()`](ScoreTxn::commit) discards every change it made.
//! - [`ScoreStore`]: one mode's persisted record set; hands out read views
//!   and write transactions.
//!
//! All operations are synchronous. Storage engines are synchronous (an
//! in-memory map, an embedded B-tree file), so async callers move store
//! work onto the blocking pool.

use scoreboard_core::{
    AnchorNotFound, Cursor, NewScore, Placement, PlacementUpdate, RankOrder, ScoreId, ScoreRecord,
};

/// Errors surfaced by score stores.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    AnchorNotFound(#[from] AnchorNotFound),
    #[error("record {0} does not exist")]
    UnknownRecord(ScoreId),
    #[error("placement {0} assigned to more than one record")]
    DuplicatePlacement(Placement),
    #[error("record {0} appears more than once in one batch")]
    DuplicateUpdate(ScoreId),
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("record encoding error: {0}")]
    Encoding(String),
}

/// Ordered, optionally cursor-relative fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindMany {
    pub order: RankOrder,
    pub cursor: Option<Cursor>,
    /// Maximum number of records; `None` reads to the end of the order.
    pub take: Option<usize>,
}

impl FindMany {
    /// Every record in `order`.
    #[must_use]
    pub fn all(order: RankOrder) -> Self {
        Self {
            order,
            cursor: None,
            take: None,
        }
    }

    /// The first `take` records in `order`.
    #[must_use]
    pub fn top(order: RankOrder, take: usize) -> Self {
        Self {
            order,
            cursor: None,
            take: Some(take),
        }
    }

    /// Up to `take` records relative to `cursor`.
    #[must_use]
    pub fn around(order: RankOrder, cursor: Cursor, take: usize) -> Self {
        Self {
            order,
            cursor: Some(cursor),
            take: Some(take),
        }
    }
}

/// Read access to one mode's records.
///
/// [`RankOrder::Placement`] fetches only see placed records; a cursor
/// anchored on an unplaced or missing record fails with
/// [`StoreError::AnchorNotFound`].
pub trait ScoreTable {
    /// Point lookup by id.
    fn get(&self, id: ScoreId) -> Result<Option<ScoreRecord>, StoreError>;

    /// Ordered fetch.
    fn find_many(&self, query: &FindMany) -> Result<Vec<ScoreRecord>, StoreError>;

    /// Number of records, placed or not.
    fn len(&self) -> Result<usize, StoreError>;

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

/// Exclusive write transaction over one mode's records.
///
/// Reads through the transaction observe its own uncommitted writes.
pub trait ScoreTxn: ScoreTable {
    /// Stores a new record, assigning `id` and `created_on`. The record is
    /// unplaced until a placement update names it.
    fn insert(&mut self, score: NewScore) -> Result<ScoreRecord, StoreError>;

    /// Rewrites the placements of the named records.
    ///
    /// The whole batch is validated before anything changes: an unknown id,
    /// or a placement claimed twice (within the batch or by a record outside
    /// it), fails the call with no effect.
    fn apply_bulk(&mut self, updates: &[PlacementUpdate]) -> Result<(), StoreError>;

    /// Publishes every change made through this transaction atomically.
    fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

/// Persisted record set of one mode.
///
/// Used as `Arc<dyn ScoreStore>`. At most one write transaction per store
/// is open at a time; `begin_write` blocks until the previous one ends.
pub trait ScoreStore: Send + Sync + 'static {
    /// Name of the mode this store holds.
    fn name(&self) -> &str;

    /// Opens a consistent read snapshot.
    fn begin_read(&self) -> Result<Box<dyn ScoreTable + '_>, StoreError>;

    /// Opens an exclusive write transaction.
    fn begin_write(&self) -> Result<Box<dyn ScoreTxn + '_>, StoreError>;

    /// Auto-committed single insert.
    fn insert(&self, score: NewScore) -> Result<ScoreRecord, StoreError> {
        let mut txn = self.begin_write()?;
        let record = txn.insert(score)?;
        txn.commit()?;
        Ok(record)
    }

    /// Auto-committed bulk placement rewrite.
    fn apply_bulk(&self, updates: &[PlacementUpdate]) -> Result<(), StoreError> {
        let mut txn = self.begin_write()?;
        txn.apply_bulk(updates)?;
        txn.commit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_many_constructors() {
        let all = FindMany::all(RankOrder::Ranking);
        assert_eq!(all.take, None);
        assert!(all.cursor.is_none());

        let top = FindMany::top(RankOrder::Placement, 10);
        assert_eq!(top.take, Some(10));

        let around = FindMany::around(RankOrder::Placement, Cursor::before(4), 2);
        assert_eq!(around.cursor, Some(Cursor::before(4)));
    }

    #[test]
    fn anchor_error_converts() {
        let err: StoreError = AnchorNotFound(9).into();
        assert_eq!(err, StoreError::AnchorNotFound(AnchorNotFound(9)));
        assert_eq!(err.to_string(), "cursor anchor 9 is not in the ordered set");
    }
}
