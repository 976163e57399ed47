//! Pure performance scoring for completed waves.
//!
//! Each sub-score follows the same shape: 0.5 exactly at the configured
//! target, rising toward 1 when the player does better and falling toward 0
//! when worse, clamped at the extremes.

use arena_director_core::{PlayerWaveMetrics, ScoringConfig};

/// Scores a completed wave into `[0, 1]`.
///
/// Pure function: the same metrics and configuration always produce the same
/// score. Degenerate inputs (no shots fired, near-zero duration) stay
/// well-defined because accuracy defaults to zero and durations are floored
/// before they reach this function.
#[must_use]
pub fn score(metrics: &PlayerWaveMetrics, config: &ScoringConfig) -> f32 {
    let survival = survival_score(metrics, config);
    let clear = clear_score(metrics, config);
    let accuracy = accuracy_score(metrics, config);

    clamp01(
        config.weight_survival * survival
            + config.weight_speed * clear
            + config.weight_accuracy * accuracy,
    )
}

fn survival_score(metrics: &PlayerWaveMetrics, config: &ScoringConfig) -> f32 {
    1.0 - clamp01(metrics.damage_taken / config.max_acceptable_damage.max(1.0))
}

fn clear_score(metrics: &PlayerWaveMetrics, config: &ScoringConfig) -> f32 {
    let duration = metrics.wave_duration.as_secs_f32();
    clamp01(0.5 + 0.5 * (config.target_clear_time_sec - duration) / config.target_clear_time_sec)
}

fn accuracy_score(metrics: &PlayerWaveMetrics, config: &ScoringConfig) -> f32 {
    // target_accuracy01 < 1 is enforced by config validation.
    clamp01(
        0.5 + 0.5 * (metrics.accuracy01 - config.target_accuracy01)
            / (1.0 - config.target_accuracy01),
    )
}

pub(crate) fn clamp01(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}
