//! Factory for creating per-mode [`ScoreStore`] instances.
//!
//! [`StoreFactory`] is the dependency injection point between configuration
//! and the ranking engine: it owns the selected backend (and, for redb, the
//! shared database handle) plus the clock that stamps `created_on`.

use std::sync::Arc;

use scoreboard_core::ClockSource;

use crate::storage::engines::MemoryScoreStore;
use crate::storage::store::{ScoreStore, StoreError};

/// Which backend holds score records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StorageConfig {
    /// Process-local maps; contents are lost on restart.
    #[default]
    Memory,
    /// Embedded redb database file shared by all modes.
    #[cfg(feature = "redb")]
    Redb { path: std::path::PathBuf },
}

enum Backend {
    Memory,
    #[cfg(feature = "redb")]
    Redb(Arc<::redb::Database>),
}

/// Creates one [`ScoreStore`] per mode.
pub struct StoreFactory {
    backend: Backend,
    clock: Arc<dyn ClockSource>,
}

impl StoreFactory {
    /// Prepares the configured backend. For redb this opens (or creates)
    /// the database file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the database file cannot be opened.
    pub fn new(config: StorageConfig, clock: Arc<dyn ClockSource>) -> Result<Self, StoreError> {
        let backend = match config {
            StorageConfig::Memory => Backend::Memory,
            #[cfg(feature = "redb")]
            StorageConfig::Redb { path } => {
                Backend::Redb(crate::storage::engines::redb::open_database(&path)?)
            }
        };
        Ok(Self { backend, clock })
    }

    /// Name of the selected backend, for logging.
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            Backend::Memory => "memory",
            #[cfg(feature = "redb")]
            Backend::Redb(_) => "redb",
        }
    }

    /// Creates the store holding `mode`'s records.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the backend cannot create the
    /// mode's tables.
    pub fn create(&self, mode: &str) -> Result<Arc<dyn ScoreStore>, StoreError> {
        match &self.backend {
            Backend::Memory => Ok(Arc::new(MemoryScoreStore::new(mode, self.clock.clone()))),
            #[cfg(feature = "redb")]
            Backend::Redb(db) => Ok(Arc::new(crate::storage::engines::RedbScoreStore::open(
                db.clone(),
                mode,
                self.clock.clone(),
            )?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use scoreboard_core::{ManualClock, NewScore, ScoreExtras};

    use super::*;

    fn new_score() -> NewScore {
        NewScore {
            score: 10,
            username: "abc".to_string(),
            extras: ScoreExtras::default(),
        }
    }

    #[test]
    fn storage_config_defaults_to_memory() {
        assert_eq!(StorageConfig::default(), StorageConfig::Memory);
    }

    #[test]
    fn memory_factory_creates_independent_stores() {
        let factory = StoreFactory::new(StorageConfig::Memory, Arc::new(ManualClock::new(0))).unwrap();
        assert_eq!(factory.backend_name(), "memory");

        let a = factory.create("timing").unwrap();
        let b = factory.create("oneTiming").unwrap();
        assert_eq!(a.name(), "timing");

        a.insert(new_score()).unwrap();
        assert_eq!(a.begin_read().unwrap().len().unwrap(), 1);
        assert!(b.begin_read().unwrap().is_empty().unwrap());
    }

    #[cfg(feature = "redb")]
    #[test]
    fn redb_factory_opens_file_backed_stores() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = StorageConfig::Redb {
            path: dir.path().join("scores.redb"),
        };
        let factory = StoreFactory::new(config, Arc::new(ManualClock::new(0))).unwrap();
        assert_eq!(factory.backend_name(), "redb");

        let store = factory.create("timing").unwrap();
        let record = store.insert(new_score()).unwrap();
        assert_eq!(record.id, 1);
    }
}
