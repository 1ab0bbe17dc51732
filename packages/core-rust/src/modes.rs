//! The closed set of leaderboard modes.
//!
//! A mode is a plain value: its name, the schema submissions must satisfy,
//! and the two order keys the ranking engine uses. Nothing dispatches on a
//! mode's type; components look the descriptor up and read its fields.

use crate::order::RankOrder;
use crate::schema::ModeSchema;

/// Static description of one leaderboard mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeDescriptor {
    /// Name used in request paths and storage table names.
    pub name: &'static str,
    /// Accepted submission shape.
    pub schema: ModeSchema,
    /// Order in which windows are read.
    pub window_order: RankOrder,
    /// Order from which placements are computed.
    pub ranking_order: RankOrder,
}

impl ModeDescriptor {
    const fn standard(name: &'static str, schema: ModeSchema) -> Self {
        Self {
            name,
            schema,
            window_order: RankOrder::Placement,
            ranking_order: RankOrder::Ranking,
        }
    }
}

/// Timed runs carrying a multiplier and modifier tags.
pub const TIMING: ModeDescriptor = ModeDescriptor::standard(
    "timing",
    ModeSchema {
        accepts_multiplier: true,
        accepts_mods: true,
    },
);

/// Single-note timing drill.
pub const ONE_TIMING: ModeDescriptor = ModeDescriptor::standard("oneTiming", ModeSchema::PLAIN);

/// Multi-note timing drill.
pub const MULTIPLE_TIMING: ModeDescriptor =
    ModeDescriptor::standard("multipleTiming", ModeSchema::PLAIN);

/// Every mode known at startup.
pub const MODES: &[ModeDescriptor] = &[TIMING, ONE_TIMING, MULTIPLE_TIMING];

/// Looks a mode up by name.
#[must_use]
pub fn find(name: &str) -> Option<&'static ModeDescriptor> {
    MODES.iter().find(|m| m.name == name)
}
