//! Mode name → per-mode ranking components.

use std::collections::HashMap;
use std::sync::Arc;

use scoreboard_core::{ModeDescriptor, MODES};
use tokio::sync::Mutex;

use crate::ranking::{PlacementEngine, RankingError, WindowedReader};
use crate::storage::{ScoreStore, StoreError, StoreFactory};

/// Everything needed to serve one mode.
pub struct ModeTable {
    pub descriptor: &'static ModeDescriptor,
    pub store: Arc<dyn ScoreStore>,
    pub reader: WindowedReader,
    pub engine: PlacementEngine,
    /// Held for the whole insert+recompute of a submission.
    pub write_gate: Arc<Mutex<()>>,
}

impl ModeTable {
    #[must_use]
    pub fn new(descriptor: &'static ModeDescriptor, store: Arc<dyn ScoreStore>) -> Self {
        Self {
            descriptor,
            store,
            reader: WindowedReader::new(descriptor.window_order),
            engine: PlacementEngine::new(descriptor.ranking_order),
            write_gate: Arc::new(Mutex::new(())),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }
}

/// Closed set of modes, fixed at startup.
pub struct TableRegistry {
    tables: HashMap<&'static str, ModeTable>,
}

impl TableRegistry {
    /// Creates a store for every known mode.
    ///
    /// # Errors
    ///
    /// Returns the first store creation failure.
    pub fn build(factory: &StoreFactory) -> Result<Self, StoreError> {
        let tables = MODES
            .iter()
            .map(|descriptor| {
                let store = factory.create(descriptor.name)?;
                Ok(ModeTable::new(descriptor, store))
            })
            .collect::<Result<Vec<_>, StoreError>>()?;
        Ok(Self::from_tables(tables))
    }

    #[must_use]
    pub fn from_tables(tables: impl IntoIterator<Item = ModeTable>) -> Self {
        Self {
            tables: tables.into_iter().map(|t| (t.name(), t)).collect(),
        }
    }

    /// Looks up a mode by its exact name.
    ///
    /// # Errors
    ///
    /// [`RankingError::UnknownMode`] for names outside the registered set.
    pub fn resolve(&self, mode: &str) -> Result<&ModeTable, RankingError> {
        self.tables
            .get(mode)
            .ok_or_else(|| RankingError::UnknownMode(mode.to_string()))
    }

    /// Registered mode names, sorted.
    #[must_use]
    pub fn modes(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.tables.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use scoreboard_core::{ManualClock, RankOrder};

    use super::*;
    use crate::storage::StorageConfig;

    fn registry() -> TableRegistry {
        let factory =
            StoreFactory::new(StorageConfig::Memory, Arc::new(ManualClock::new(0))).unwrap();
        TableRegistry::build(&factory).unwrap()
    }

    #[test]
    fn every_known_mode_resolves() {
        let registry = registry();
        assert_eq!(registry.modes(), vec!["multipleTiming", "oneTiming", "timing"]);
        for name in registry.modes() {
            let table = registry.resolve(name).unwrap();
            assert_eq!(table.store.name(), name);
            assert_eq!(table.reader.order(), RankOrder::Placement);
        }
    }

    #[test]
    fn unknown_and_miscased_modes_are_rejected() {
        let registry = registry();
        assert_eq!(
            registry.resolve("unknown").err(),
            Some(RankingError::UnknownMode("unknown".to_string()))
        );
        assert!(registry.resolve("Timing").is_err());
    }
}
