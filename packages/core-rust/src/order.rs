//! Order keys and cursor-relative selection over ordered record sequences.
//!
//! Two orders exist per mode:
//!
//! - [`RankOrder::Placement`]: how leaderboards are read (placement ascending).
//! - [`RankOrder::Ranking`]: how placements are computed
//!   (score descending, `createdOn` ascending, `id` ascending).
//!
//! [`select`] implements the cursor semantics shared by every store backend
//! that does not have a native ordered index for the requested order.

use std::cmp::Ordering;

use crate::types::{ScoreId, ScoreRecord};

/// Order key for ordered fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RankOrder {
    /// Placement ascending. Unplaced records sort last, by id.
    Placement,
    /// Score descending, then `createdOn` ascending, then id ascending.
    Ranking,
}

impl RankOrder {
    /// Total comparator for this order.
    #[must_use]
    pub fn compare(self, a: &ScoreRecord, b: &ScoreRecord) -> Ordering {
        match self {
            Self::Placement => match (a.placement, b.placement) {
                (Some(pa), Some(pb)) => pa.cmp(&pb).then_with(|| a.id.cmp(&b.id)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => a.id.cmp(&b.id),
            },
            Self::Ranking => b
                .score
                .cmp(&a.score)
                .then_with(|| a.created_on.cmp(&b.created_on))
                .then_with(|| a.id.cmp(&b.id)),
        }
    }

    /// Sorts `records` in place by this order.
    pub fn sort(self, records: &mut [ScoreRecord]) {
        records.sort_by(|a, b| self.compare(a, b));
    }

    /// Short label used in logs and metrics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Placement => "placement",
            Self::Ranking => "ranking",
        }
    }
}

/// Which side of the anchor a cursor fetch reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Records at or after the anchor.
    Forward,
    /// Records at or before the anchor, nearest ones kept.
    Backward,
}

/// Anchor position for a cursor-relative fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub anchor: ScoreId,
    pub direction: Direction,
    /// Whether the anchor record itself is part of the result.
    pub include_anchor: bool,
}

impl Cursor {
    /// Cursor reading forward from `anchor`, anchor included.
    #[must_use]
    pub fn at(anchor: ScoreId) -> Self {
        Self {
            anchor,
            direction: Direction::Forward,
            include_anchor: true,
        }
    }

    /// Cursor reading the records strictly before `anchor`.
    #[must_use]
    pub fn before(anchor: ScoreId) -> Self {
        Self {
            anchor,
            direction: Direction::Backward,
            include_anchor: false,
        }
    }
}

/// The cursor anchor is not part of the ordered sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cursor anchor {0} is not in the ordered set")]
pub struct AnchorNotFound(pub ScoreId);

/// Selects records from an already-ordered sequence.
///
/// Without a cursor the first `take` records are returned. With a cursor,
/// the anchor is located by id and up to `take` records are read in the
/// cursor's direction. Backward selections keep the records nearest to the
/// anchor and are returned in ascending order.
///
/// # Errors
///
/// Returns [`AnchorNotFound`] if the cursor anchor is not in `sorted`.
pub fn select(
    sorted: &[ScoreRecord],
    cursor: Option<Cursor>,
    take: Option<usize>,
) -> Result<Vec<ScoreRecord>, AnchorNotFound> {
    let take = take.unwrap_or(usize::MAX);
    let Some(cursor) = cursor else {
        return Ok(sorted.iter().take(take).cloned().collect());
    };

    let pos = sorted
        .iter()
        .position(|r| r.id == cursor.anchor)
        .ok_or(AnchorNotFound(cursor.anchor))?;

    let range = match cursor.direction {
        Direction::Forward => {
            let start = if cursor.include_anchor { pos } else { pos + 1 };
            let end = start.saturating_add(take).min(sorted.len());
            start..end.max(start)
        }
        Direction::Backward => {
            let end = if cursor.include_anchor { pos + 1 } else { pos };
            let start = end.saturating_sub(take);
            start..end
        }
    };

    Ok(sorted[range].to_vec())
}
