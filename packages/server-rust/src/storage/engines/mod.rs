//! Score store backends.

pub mod memory;
#[cfg(feature = "redb")]
pub mod redb;

pub use memory::MemoryScoreStore;
#[cfg(feature = "redb")]
pub use self::redb::RedbScoreStore;
