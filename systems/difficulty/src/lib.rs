#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Closed-loop difficulty controller with smoothing and deadzone.
//!
//! The controller maps the average performance of the last two waves into a
//! target difficulty, then closes the gap between current and target in
//! single smoothed steps, ignoring sub-deadzone drift so the difficulty never
//! visibly oscillates.

use arena_director_core::{
    ConfigError, Difficulty01, DifficultyConfig, PlayerWaveMetrics, ScoringConfig,
};

pub mod scoring;

/// Performance par: the score at which difficulty sits exactly at base.
const PAR_PERFORMANCE: f32 = 0.5;

/// Breakdown of a freshly computed difficulty target, for observers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdjustmentPreview {
    /// Performance score of the older of the two waves.
    pub perf_prev: f32,
    /// Performance score of the newer of the two waves.
    pub perf_last: f32,
    /// Two-wave average that drives the mapping.
    pub perf2: f32,
    /// Target difficulty the controller now steers toward.
    pub target: Difficulty01,
}

/// Stateful controller holding the current and target difficulty.
#[derive(Debug)]
pub struct DifficultyController {
    scoring: ScoringConfig,
    mapping: DifficultyConfig,
    current: Difficulty01,
    target: Difficulty01,
}

impl DifficultyController {
    /// Creates a controller, rejecting invalid configuration.
    ///
    /// Both current and target start at the configured base difficulty;
    /// sessions that start elsewhere call
    /// [`DifficultyController::set_current`] once during initialization.
    pub fn new(scoring: ScoringConfig, mapping: DifficultyConfig) -> Result<Self, ConfigError> {
        scoring.validate()?;
        mapping.validate()?;

        let initial = Difficulty01::new(mapping.base_difficulty01);
        Ok(Self {
            scoring,
            mapping,
            current: initial,
            target: initial,
        })
    }

    /// Difficulty presently applied to spawned encounters.
    #[must_use]
    pub const fn current(&self) -> Difficulty01 {
        self.current
    }

    /// Difficulty the controller is steering toward.
    #[must_use]
    pub const fn target(&self) -> Difficulty01 {
        self.target
    }

    /// Resets both current and target difficulty, for session initialization
    /// or a non-adjusting transition's resync.
    pub fn set_current(&mut self, difficulty: Difficulty01) {
        self.current = difficulty;
        self.target = difficulty;
    }

    /// Scores a single wave with this controller's scoring configuration.
    #[must_use]
    pub fn score(&self, metrics: &PlayerWaveMetrics) -> f32 {
        scoring::score(metrics, &self.scoring)
    }

    /// Computes a new target difficulty from the two most recent waves.
    ///
    /// Averaging two waves damps the influence of a single anomalous one. The
    /// target moves away from base proportionally to how far the average sits
    /// from par; only the target changes here, never the current value.
    pub fn compute_target_from_last_two(
        &mut self,
        prev: &PlayerWaveMetrics,
        last: &PlayerWaveMetrics,
    ) -> AdjustmentPreview {
        let perf_prev = scoring::score(prev, &self.scoring);
        let perf_last = scoring::score(last, &self.scoring);
        let perf2 = scoring::clamp01((perf_prev + perf_last) * 0.5);

        let target = Difficulty01::new(
            self.mapping.base_difficulty01 + (perf2 - PAR_PERFORMANCE) * self.mapping.gain,
        );
        self.target = target;

        AdjustmentPreview {
            perf_prev,
            perf_last,
            perf2,
            target,
        }
    }

    /// Moves the current difficulty one smoothed step toward the target.
    ///
    /// Returns `false` without mutating anything when the gap is inside the
    /// deadzone; otherwise closes `smooth_lerp` of the gap and returns `true`.
    /// Invoked once per scheduled adjustment event, not per tick.
    pub fn apply_target_with_smoothing(&mut self) -> bool {
        let gap = self.target.get() - self.current.get();
        if gap.abs() < self.mapping.deadzone {
            return false;
        }

        self.current = self.current.lerp(self.target, self.mapping.smooth_lerp);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::DifficultyController;
    use arena_director_core::{
        ConfigError, Difficulty01, DifficultyConfig, PlayerWaveMetrics, ScoringConfig, WaveIndex,
    };
    use std::time::Duration;

    fn on_target_wave(wave: u32) -> PlayerWaveMetrics {
        PlayerWaveMetrics {
            wave: WaveIndex::new(wave),
            wave_duration: Duration::from_secs(12),
            damage_taken: 0.0,
            shots_fired: 20,
            shots_hit: 7,
            accuracy01: 0.35,
            perf01: 0.0,
        }
    }

    fn controller_with(mapping: DifficultyConfig) -> DifficultyController {
        DifficultyController::new(ScoringConfig::default(), mapping).expect("valid config")
    }

    #[test]
    fn construction_rejects_invalid_configuration() {
        let result = DifficultyController::new(
            ScoringConfig {
                target_accuracy01: 1.0,
                ..ScoringConfig::default()
            },
            DifficultyConfig::default(),
        );
        assert_eq!(
            result.expect_err("must reject"),
            ConfigError::TargetAccuracy { value: 1.0 },
        );
    }

    #[test]
    fn target_follows_two_wave_average() {
        // Two on-target waves score 0.725 each, so with base 0.5 and gain
        // 0.65 the target lands at 0.5 + 0.225 * 0.65 = 0.64625.
        let mut controller = controller_with(DifficultyConfig::default());
        let preview =
            controller.compute_target_from_last_two(&on_target_wave(0), &on_target_wave(1));

        assert!((preview.perf_prev - 0.725).abs() < 1e-4);
        assert!((preview.perf_last - 0.725).abs() < 1e-4);
        assert!((preview.perf2 - 0.725).abs() < 1e-4);
        assert!((preview.target.get() - 0.64625).abs() < 1e-4);
        assert_eq!(controller.target(), preview.target);
        assert!((controller.current().get() - 0.5).abs() < 1e-6, "current untouched");
    }

    #[test]
    fn one_bad_wave_is_damped_by_the_average() {
        let mut controller = controller_with(DifficultyConfig::default());
        let collapsed = PlayerWaveMetrics {
            damage_taken: 200.0,
            wave_duration: Duration::from_secs(60),
            shots_fired: 30,
            shots_hit: 0,
            accuracy01: 0.0,
            ..on_target_wave(1)
        };

        let mixed = controller
            .compute_target_from_last_two(&on_target_wave(0), &collapsed)
            .perf2;
        let all_bad = controller
            .compute_target_from_last_two(&collapsed, &collapsed)
            .perf2;

        assert!(mixed > all_bad, "averaging softens a single collapse");
    }

    #[test]
    fn sub_deadzone_drift_is_ignored() {
        // gain 0 pins the computed target at base, giving precise control
        // over the gap under test.
        let mut controller = controller_with(DifficultyConfig {
            base_difficulty01: 0.53,
            gain: 0.0,
            deadzone: 0.05,
            smooth_lerp: 0.20,
        });
        controller.set_current(Difficulty01::new(0.50));
        let _ = controller.compute_target_from_last_two(&on_target_wave(0), &on_target_wave(1));

        assert!(!controller.apply_target_with_smoothing());
        assert!((controller.current().get() - 0.50).abs() < 1e-6);
    }

    #[test]
    fn gap_beyond_deadzone_closes_by_the_smoothing_fraction() {
        let mut controller = controller_with(DifficultyConfig {
            base_difficulty01: 0.60,
            gain: 0.0,
            deadzone: 0.05,
            smooth_lerp: 0.20,
        });
        controller.set_current(Difficulty01::new(0.50));
        let _ = controller.compute_target_from_last_two(&on_target_wave(0), &on_target_wave(1));

        assert!(controller.apply_target_with_smoothing());
        assert!((controller.current().get() - 0.52).abs() < 1e-6);
    }

    #[test]
    fn smoothing_converges_into_the_deadzone_and_stays_fixed() {
        let mut controller = controller_with(DifficultyConfig {
            base_difficulty01: 0.90,
            gain: 0.0,
            deadzone: 0.01,
            smooth_lerp: 0.50,
        });
        controller.set_current(Difficulty01::new(0.50));
        let _ = controller.compute_target_from_last_two(&on_target_wave(0), &on_target_wave(1));

        let mut previous_gap = (controller.target().get() - controller.current().get()).abs();
        let mut steps = 0;
        while controller.apply_target_with_smoothing() {
            let gap = (controller.target().get() - controller.current().get()).abs();
            assert!(gap < previous_gap, "gap must shrink monotonically");
            previous_gap = gap;
            steps += 1;
            assert!(steps < 64, "smoothing failed to converge");
        }

        assert!(previous_gap < 0.01, "converged inside the deadzone");

        let settled = controller.current();
        assert!(!controller.apply_target_with_smoothing());
        assert_eq!(controller.current(), settled, "fixed point once converged");
    }

    #[test]
    fn set_current_resyncs_the_target() {
        let mut controller = controller_with(DifficultyConfig::default());
        let _ = controller.compute_target_from_last_two(&on_target_wave(0), &on_target_wave(1));

        controller.set_current(Difficulty01::new(0.3));
        assert_eq!(controller.current(), Difficulty01::new(0.3));
        assert_eq!(controller.target(), Difficulty01::new(0.3));
        assert!(!controller.apply_target_with_smoothing());
    }
}
