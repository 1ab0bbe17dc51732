//! Score record types shared by the store, the ranking engine, and the wire layer.

use serde::{Deserialize, Serialize};

/// Store-assigned record identifier. Reflects insertion order, never reused.
pub type ScoreId = u64;

/// 1-based dense rank of a record within its mode.
pub type Placement = u32;

/// Mode-specific optional fields. Opaque to ranking.
///
/// Serialized flattened next to the core record fields; absent fields are
/// omitted rather than written as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreExtras {
    /// Score multiplier reported by the client (timing mode).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<f64>,
    /// Modifier tags active during the attempt (timing mode).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mods: Option<Vec<String>>,
}

impl ScoreExtras {
    /// Returns `true` when no mode-specific field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.multiplier.is_none() && self.mods.is_none()
    }
}

/// A score submission that has passed validation but not yet been stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewScore {
    pub score: i64,
    pub username: String,
    pub extras: ScoreExtras,
}

/// A persisted score record.
///
/// `id` and `created_on` are assigned once by the store at insert and never
/// change. `placement` is `None` only between the insert and the
/// recomputation that runs in the same write transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRecord {
    pub id: ScoreId,
    pub score: i64,
    pub username: String,
    /// Milliseconds since Unix epoch.
    pub created_on: i64,
    pub placement: Option<Placement>,
    #[serde(flatten)]
    pub extras: ScoreExtras,
}

impl ScoreRecord {
    /// Builds the stored form of `new` with the identity fields the store assigns.
    #[must_use]
    pub fn from_new(id: ScoreId, created_on: i64, new: NewScore) -> Self {
        Self {
            id,
            score: new.score,
            username: new.username,
            created_on,
            placement: None,
            extras: new.extras,
        }
    }
}

/// One row of a bulk placement rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementUpdate {
    pub id: ScoreId,
    pub placement: Placement,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ScoreRecord {
        ScoreRecord::from_new(
            7,
            1_700_000_000_000,
            NewScore {
                score: -15,
                username: "abc".to_string(),
                extras: ScoreExtras {
                    multiplier: Some(1.5),
                    mods: Some(vec!["HD".to_string(), "DT".to_string()]),
                },
            },
        )
    }

    #[test]
    fn from_new_starts_unplaced() {
        let r = record();
        assert_eq!(r.id, 7);
        assert_eq!(r.placement, None);
        assert_eq!(r.extras.mods.as_deref().map(<[String]>::len), Some(2));
    }

    #[test]
    fn json_uses_camel_case_and_flattens_extras() {
        let mut r = record();
        r.placement = Some(3);
        let json = serde_json::to_value(&r).unwrap();

        assert_eq!(json["createdOn"], 1_700_000_000_000_i64);
        assert_eq!(json["placement"], 3);
        assert_eq!(json["multiplier"], 1.5);
        assert_eq!(json["mods"][1], "DT");
        assert!(json.get("extras").is_none());
    }

    #[test]
    fn json_omits_absent_extras() {
        let r = ScoreRecord::from_new(
            1,
            0,
            NewScore {
                score: 10,
                username: "x".to_string(),
                extras: ScoreExtras::default(),
            },
        );
        let json = serde_json::to_value(&r).unwrap();
        assert!(json.get("multiplier").is_none());
        assert!(json.get("mods").is_none());
    }

    #[test]
    fn msgpack_named_encoding_survives_storage() {
        let mut r = record();
        r.placement = Some(12);
        let bytes = rmp_serde::to_vec_named(&r).expect("serialize");
        let decoded: ScoreRecord = rmp_serde::from_slice(&bytes).expect("deserialize");
        assert_eq!(decoded, r);
    }

    #[test]
    fn extras_is_empty() {
        assert!(ScoreExtras::default().is_empty());
        assert!(!ScoreExtras {
            multiplier: Some(1.0),
            mods: None
        }
        .is_empty());
    }
}
