//! Score storage for the scoreboard server.
//!
//! - [`store`]: the [`ScoreTable`] / [`ScoreTxn`] / [`ScoreStore`] trait seam
//!   the ranking engine runs against
//! - [`engines`]: backends (in-memory snapshots, embedded redb file)
//! - [`factory`]: builds one store per mode from a [`StorageConfig`]

pub mod engines;
pub mod factory;
pub mod store;

pub use factory::{StorageConfig, StoreFactory};
pub use store::{FindMany, ScoreStore, ScoreTable, ScoreTxn, StoreError};
