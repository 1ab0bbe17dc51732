//! Ranking engine: windowed reads, dense placement recomputation, the mode
//! registry, and the [`Leaderboard`] that ties them together.

pub mod error;
pub mod leaderboard;
pub mod reader;
pub mod recompute;
pub mod registry;

pub use error::RankingError;
pub use leaderboard::Leaderboard;
pub use reader::WindowedReader;
pub use recompute::{PlacementEngine, RecomputeSummary};
pub use registry::{ModeTable, TableRegistry};
