//! Configuration surface for the director, validated at construction time.
//!
//! Invalid tunables are rejected with a [`ConfigError`] rather than silently
//! clamped; a misconfigured director must never start.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Permitted drift of the scoring weight sum away from 1.0.
const WEIGHT_SUM_TOLERANCE: f32 = 0.01;

/// Normalization targets and weights used by the performance scorer.
///
/// Each weight scales one sub-score; the three must sum to 1 within
/// [`WEIGHT_SUM_TOLERANCE`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Wave duration that scores exactly 0.5 on clear speed, in seconds.
    pub target_clear_time_sec: f32,
    /// Damage per wave beyond which the survival score reaches zero.
    pub max_acceptable_damage: f32,
    /// Accuracy ratio that scores exactly 0.5; must stay strictly below 1.
    pub target_accuracy01: f32,
    /// Weight of the survival sub-score.
    pub weight_survival: f32,
    /// Weight of the clear-speed sub-score.
    pub weight_speed: f32,
    /// Weight of the accuracy sub-score.
    pub weight_accuracy: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            target_clear_time_sec: 12.0,
            max_acceptable_damage: 60.0,
            target_accuracy01: 0.35,
            weight_survival: 0.45,
            weight_speed: 0.35,
            weight_accuracy: 0.20,
        }
    }
}

impl ScoringConfig {
    /// Validates every tunable, returning the first violation found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = [
            ("weight_survival", self.weight_survival),
            ("weight_speed", self.weight_speed),
            ("weight_accuracy", self.weight_accuracy),
        ];
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { name, value });
            }
        }

        let sum = self.weight_survival + self.weight_speed + self.weight_accuracy;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::WeightSum { sum });
        }

        if !self.target_accuracy01.is_finite() || !(0.0..1.0).contains(&self.target_accuracy01) {
            return Err(ConfigError::TargetAccuracy {
                value: self.target_accuracy01,
            });
        }

        if !self.target_clear_time_sec.is_finite() || self.target_clear_time_sec <= 0.0 {
            return Err(ConfigError::TargetClearTime {
                value: self.target_clear_time_sec,
            });
        }

        if !self.max_acceptable_damage.is_finite() || self.max_acceptable_damage <= 0.0 {
            return Err(ConfigError::MaxAcceptableDamage {
                value: self.max_acceptable_damage,
            });
        }

        Ok(())
    }
}

/// Mapping and smoothing tunables for the difficulty controller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyConfig {
    /// Difficulty produced when recent performance sits exactly at par (0.5).
    pub base_difficulty01: f32,
    /// How strongly performance deviation from par shifts the target.
    pub gain: f32,
    /// Minimum target/current gap below which transitions are ignored.
    pub deadzone: f32,
    /// Fraction of the remaining gap closed per adjustment event, in `(0, 1]`.
    pub smooth_lerp: f32,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            base_difficulty01: 0.50,
            gain: 0.65,
            deadzone: 0.05,
            smooth_lerp: 0.20,
        }
    }
}

impl DifficultyConfig {
    /// Validates every tunable, returning the first violation found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.base_difficulty01.is_finite() || !(0.0..=1.0).contains(&self.base_difficulty01) {
            return Err(ConfigError::BaseDifficulty {
                value: self.base_difficulty01,
            });
        }

        if !self.gain.is_finite() || self.gain < 0.0 {
            return Err(ConfigError::Gain { value: self.gain });
        }

        if !self.deadzone.is_finite() || self.deadzone < 0.0 {
            return Err(ConfigError::Deadzone {
                value: self.deadzone,
            });
        }

        if !self.smooth_lerp.is_finite() || self.smooth_lerp <= 0.0 || self.smooth_lerp > 1.0 {
            return Err(ConfigError::SmoothLerp {
                value: self.smooth_lerp,
            });
        }

        Ok(())
    }
}

/// Cadence and timing tunables for the wave lifecycle manager.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Inter-wave countdown duration, in seconds.
    pub countdown_sec: f32,
    /// Difficulty adjustment is considered every this many waves.
    pub adjustment_period: u32,
    /// Difficulty applied to the very first spawned encounter.
    pub initial_difficulty01: f32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            countdown_sec: 3.0,
            adjustment_period: 2,
            initial_difficulty01: 0.50,
        }
    }
}

impl LifecycleConfig {
    /// Validates every tunable, returning the first violation found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.countdown_sec.is_finite() || self.countdown_sec < 0.0 {
            return Err(ConfigError::Countdown {
                value: self.countdown_sec,
            });
        }

        if self.adjustment_period == 0 {
            return Err(ConfigError::AdjustmentPeriod);
        }

        if !self.initial_difficulty01.is_finite()
            || !(0.0..=1.0).contains(&self.initial_difficulty01)
        {
            return Err(ConfigError::InitialDifficulty {
                value: self.initial_difficulty01,
            });
        }

        Ok(())
    }
}

/// Complete configuration object supplied to the director at construction.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorConfig {
    /// Performance scoring tunables.
    pub scoring: ScoringConfig,
    /// Difficulty mapping and smoothing tunables.
    pub difficulty: DifficultyConfig,
    /// Wave cadence and timing tunables.
    pub lifecycle: LifecycleConfig,
}

impl DirectorConfig {
    /// Validates all three sections, returning the first violation found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scoring.validate()?;
        self.difficulty.validate()?;
        self.lifecycle.validate()
    }
}

/// Rejections produced by configuration validation.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// A scoring weight was negative or non-finite.
    #[error("scoring weight `{name}` must be finite and non-negative, got {value}")]
    InvalidWeight {
        /// Field name of the offending weight.
        name: &'static str,
        /// Rejected value.
        value: f32,
    },
    /// The scoring weights do not sum to 1.
    #[error("scoring weights must sum to 1.0, got {sum}")]
    WeightSum {
        /// Actual sum of the three weights.
        sum: f32,
    },
    /// The accuracy target would make the accuracy score divide by zero.
    #[error("target_accuracy01 must lie in [0, 1), got {value}")]
    TargetAccuracy {
        /// Rejected value.
        value: f32,
    },
    /// The clear-time target was zero, negative, or non-finite.
    #[error("target_clear_time_sec must be positive and finite, got {value}")]
    TargetClearTime {
        /// Rejected value.
        value: f32,
    },
    /// The damage normalizer was zero, negative, or non-finite.
    #[error("max_acceptable_damage must be positive and finite, got {value}")]
    MaxAcceptableDamage {
        /// Rejected value.
        value: f32,
    },
    /// The base difficulty was outside the unit interval.
    #[error("base_difficulty01 must lie in [0, 1], got {value}")]
    BaseDifficulty {
        /// Rejected value.
        value: f32,
    },
    /// The mapping gain was negative or non-finite.
    #[error("gain must be finite and non-negative, got {value}")]
    Gain {
        /// Rejected value.
        value: f32,
    },
    /// The deadzone was negative or non-finite.
    #[error("deadzone must be finite and non-negative, got {value}")]
    Deadzone {
        /// Rejected value.
        value: f32,
    },
    /// The smoothing fraction was outside `(0, 1]`.
    #[error("smooth_lerp must lie in (0, 1], got {value}")]
    SmoothLerp {
        /// Rejected value.
        value: f32,
    },
    /// The countdown duration was negative or non-finite.
    #[error("countdown_sec must be finite and non-negative, got {value}")]
    Countdown {
        /// Rejected value.
        value: f32,
    },
    /// The adjustment period was zero.
    #[error("adjustment_period must be at least 1")]
    AdjustmentPeriod,
    /// The initial difficulty was outside the unit interval.
    #[error("initial_difficulty01 must lie in [0, 1], got {value}")]
    InitialDifficulty {
        /// Rejected value.
        value: f32,
    },
}

#[cfg(test)]
mod tests {
    use super::{
        ConfigError, DifficultyConfig, DirectorConfig, LifecycleConfig, ScoringConfig,
    };

    #[test]
    fn default_configuration_validates() {
        DirectorConfig::default().validate().expect("defaults valid");
    }

    #[test]
    fn negative_weight_is_rejected() {
        let config = ScoringConfig {
            weight_speed: -0.1,
            ..ScoringConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidWeight {
                name: "weight_speed",
                value: -0.1,
            }),
        );
    }

    #[test]
    fn weight_sum_far_from_one_is_rejected() {
        let config = ScoringConfig {
            weight_survival: 0.45,
            weight_speed: 0.35,
            weight_accuracy: 0.10,
            ..ScoringConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::WeightSum { .. }),
        ));
    }

    #[test]
    fn saturated_accuracy_target_is_rejected() {
        let config = ScoringConfig {
            target_accuracy01: 1.0,
            ..ScoringConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::TargetAccuracy { value: 1.0 }),
        );
    }

    #[test]
    fn non_positive_clear_time_is_rejected() {
        let config = ScoringConfig {
            target_clear_time_sec: 0.0,
            ..ScoringConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::TargetClearTime { value: 0.0 }),
        );
    }

    #[test]
    fn negative_damage_normalizer_is_rejected() {
        let config = ScoringConfig {
            max_acceptable_damage: -5.0,
            ..ScoringConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::MaxAcceptableDamage { value: -5.0 }),
        );
    }

    #[test]
    fn out_of_range_base_difficulty_is_rejected() {
        let config = DifficultyConfig {
            base_difficulty01: 1.5,
            ..DifficultyConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::BaseDifficulty { value: 1.5 }),
        );
    }

    #[test]
    fn negative_gain_is_rejected() {
        let config = DifficultyConfig {
            gain: -0.65,
            ..DifficultyConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::Gain { value: -0.65 }));
    }

    #[test]
    fn negative_deadzone_is_rejected() {
        let config = DifficultyConfig {
            deadzone: -0.01,
            ..DifficultyConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::Deadzone { value: -0.01 }),
        );
    }

    #[test]
    fn smooth_lerp_bounds_are_enforced() {
        for value in [0.0, -0.2, 1.5] {
            let config = DifficultyConfig {
                smooth_lerp: value,
                ..DifficultyConfig::default()
            };
            assert_eq!(config.validate(), Err(ConfigError::SmoothLerp { value }));
        }

        let full_step = DifficultyConfig {
            smooth_lerp: 1.0,
            ..DifficultyConfig::default()
        };
        full_step.validate().expect("smooth_lerp of 1.0 is allowed");
    }

    #[test]
    fn negative_countdown_is_rejected() {
        let config = LifecycleConfig {
            countdown_sec: -1.0,
            ..LifecycleConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::Countdown { value: -1.0 }),
        );
    }

    #[test]
    fn zero_adjustment_period_is_rejected() {
        let config = LifecycleConfig {
            adjustment_period: 0,
            ..LifecycleConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::AdjustmentPeriod));
    }

    #[test]
    fn out_of_range_initial_difficulty_is_rejected() {
        let config = LifecycleConfig {
            initial_difficulty01: -0.2,
            ..LifecycleConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InitialDifficulty { value: -0.2 }),
        );
    }
}
