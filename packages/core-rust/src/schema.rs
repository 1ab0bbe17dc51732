//! Per-mode submission schemas.
//!
//! Each mode declares which optional fields a submission may carry. The
//! username and score rules are shared by every mode.

use crate::types::{NewScore, ScoreExtras};

/// Shortest accepted username, in characters.
pub const USERNAME_MIN_CHARS: usize = 1;
/// Longest accepted username, in characters.
pub const USERNAME_MAX_CHARS: usize = 3;

/// Which mode-specific fields a mode accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeSchema {
    pub accepts_multiplier: bool,
    pub accepts_mods: bool,
}

impl ModeSchema {
    /// Schema with no mode-specific fields.
    pub const PLAIN: Self = Self {
        accepts_multiplier: false,
        accepts_mods: false,
    };

    /// Validates a submission against this schema.
    #[must_use]
    pub fn validate(&self, score: &NewScore) -> ValidationResult {
        let mut errors = Vec::new();

        let chars = score.username.chars().count();
        if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&chars) {
            errors.push(format!(
                "username must be {USERNAME_MIN_CHARS}-{USERNAME_MAX_CHARS} characters, got {chars}"
            ));
        }

        errors.extend(self.check_extras(&score.extras));

        if errors.is_empty() {
            ValidationResult::Valid
        } else {
            ValidationResult::Invalid { errors }
        }
    }

    fn check_extras(&self, extras: &ScoreExtras) -> Vec<String> {
        let mut errors = Vec::new();
        if let Some(multiplier) = extras.multiplier {
            if !self.accepts_multiplier {
                errors.push("multiplier is not accepted by this mode".to_string());
            } else if !multiplier.is_finite() {
                errors.push("multiplier must be a finite number".to_string());
            }
        }
        if extras.mods.is_some() && !self.accepts_mods {
            errors.push("mods are not accepted by this mode".to_string());
        }
        errors
    }
}

/// Result of validating a submission against a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// The submission conforms to the schema.
    Valid,
    /// The submission violates one or more schema constraints.
    Invalid {
        /// Human-readable descriptions of each validation failure.
        errors: Vec<String>,
    },
}

impl ValidationResult {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMING: ModeSchema = ModeSchema {
        accepts_multiplier: true,
        accepts_mods: true,
    };

    fn submission(username: &str, extras: ScoreExtras) -> NewScore {
        NewScore {
            score: 100,
            username: username.to_string(),
            extras,
        }
    }

    #[test]
    fn accepts_one_to_three_characters() {
        for name in ["a", "ab", "abc", "äöü"] {
            assert!(ModeSchema::PLAIN
                .validate(&submission(name, ScoreExtras::default()))
                .is_valid());
        }
    }

    #[test]
    fn rejects_empty_and_long_usernames() {
        for name in ["", "abcd"] {
            let result = ModeSchema::PLAIN.validate(&submission(name, ScoreExtras::default()));
            assert!(!result.is_valid(), "{name:?} should be rejected");
        }
    }

    #[test]
    fn plain_mode_rejects_extras() {
        let extras = ScoreExtras {
            multiplier: Some(2.0),
            mods: Some(vec!["HR".to_string()]),
        };
        let ValidationResult::Invalid { errors } =
            ModeSchema::PLAIN.validate(&submission("abc", extras))
        else {
            panic!("expected invalid");
        };
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn timing_mode_accepts_extras() {
        let extras = ScoreExtras {
            multiplier: Some(1.25),
            mods: Some(vec!["HR".to_string()]),
        };
        assert!(TIMING.validate(&submission("abc", extras)).is_valid());
    }

    #[test]
    fn rejects_non_finite_multiplier() {
        let extras = ScoreExtras {
            multiplier: Some(f64::NAN),
            mods: None,
        };
        assert!(!TIMING.validate(&submission("abc", extras)).is_valid());
    }
}
