//! Scoreboard core: score records, ranking order, window arithmetic, mode schemas.

pub mod clock;
pub mod messages;
pub mod modes;
pub mod order;
pub mod schema;
pub mod types;
pub mod window;

pub use clock::{ClockSource, ManualClock, SystemClock};
pub use modes::{ModeDescriptor, MODES};
pub use order::{AnchorNotFound, Cursor, Direction, RankOrder};
pub use schema::{ModeSchema, ValidationResult};
pub use types::{NewScore, Placement, PlacementUpdate, ScoreExtras, ScoreId, ScoreRecord};
pub use window::{WindowError, WindowQuery, DEFAULT_LOAD_COUNT};
