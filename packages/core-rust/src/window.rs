//! Window request arithmetic.
//!
//! A window is either the top `load_count` records, or a run of records
//! centered on a given record id: up to `load_count / 2` records before the
//! center, then the center and as many records after it as are needed to
//! fill `load_count`. A short `before` run (center near the top) is absorbed
//! by a longer `after` run; only the bottom edge can shrink the window.

use crate::types::ScoreId;

/// Number of records returned when the caller does not ask for a size.
pub const DEFAULT_LOAD_COUNT: u32 = 10;

/// Rejected window request parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WindowError {
    #[error("loadCount must be a positive integer, got {0}")]
    NonPositiveLoadCount(i64),
    #[error("loadCount {0} is too large")]
    LoadCountTooLarge(i64),
}

/// A validated window request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowQuery {
    load_count: u32,
    center_on: Option<ScoreId>,
}

impl WindowQuery {
    /// Validates raw window parameters.
    ///
    /// `load_count` defaults to [`DEFAULT_LOAD_COUNT`].
    ///
    /// # Errors
    ///
    /// Returns [`WindowError`] if `load_count` is zero, negative, or does not
    /// fit in a `u32`.
    pub fn new(load_count: Option<i64>, center_on: Option<ScoreId>) -> Result<Self, WindowError> {
        let load_count = match load_count {
            None => DEFAULT_LOAD_COUNT,
            Some(n) if n <= 0 => return Err(WindowError::NonPositiveLoadCount(n)),
            Some(n) => u32::try_from(n).map_err(|_| WindowError::LoadCountTooLarge(n))?,
        };
        Ok(Self {
            load_count,
            center_on,
        })
    }

    /// Top-of-board window of `DEFAULT_LOAD_COUNT` records.
    #[must_use]
    pub fn top() -> Self {
        Self {
            load_count: DEFAULT_LOAD_COUNT,
            center_on: None,
        }
    }

    #[must_use]
    pub fn load_count(&self) -> usize {
        self.load_count as usize
    }

    #[must_use]
    pub fn center_on(&self) -> Option<ScoreId> {
        self.center_on
    }

    /// Maximum number of records taken strictly before the center.
    #[must_use]
    pub fn before_budget(&self) -> usize {
        self.load_count() / 2
    }

    /// Number of records taken from the center onward, given how many were
    /// actually found before it.
    #[must_use]
    pub fn after_budget(&self, before_len: usize) -> usize {
        self.load_count().saturating_sub(before_len)
    }
}

impl Default for WindowQuery {
    fn default() -> Self {
        Self::top()
    }
}
