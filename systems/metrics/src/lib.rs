#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-wave metrics collection feeding the difficulty loop.
//!
//! The collector accumulates combat counters for exactly one active wave and
//! materializes them into frozen records at the wave boundary. Event intake is
//! scoped: damage and shot reports arriving while no wave is active are
//! dropped, so a finished encounter can never leak counts into the next one.

use std::time::Duration;

use arena_director_core::{
    CollectError, EnemyTelemetrySource, EnemyWaveTelemetry, PlayerWaveMetrics, WaveHistory,
    WaveIndex,
};

/// Shortest duration a finalized wave may report.
const MIN_WAVE_DURATION: Duration = Duration::from_millis(10);

/// Accumulates player combat events for the currently active wave.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    active: Option<ActiveWave>,
    history: WaveHistory,
}

#[derive(Debug)]
struct ActiveWave {
    wave: WaveIndex,
    started_at: Duration,
    damage_taken: f32,
    shots_fired: u32,
    shots_hit: u32,
}

impl MetricsCollector {
    /// Creates a collector with no active wave and empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts accumulation for `wave` at session time `now`.
    ///
    /// Any un-finalized wave still in progress is discarded; the enemy
    /// telemetry source is reset for the fresh wave.
    pub fn begin_wave(
        &mut self,
        wave: WaveIndex,
        now: Duration,
        telemetry: &mut dyn EnemyTelemetrySource,
    ) {
        if let Some(discarded) = self.active.take() {
            log::warn!(
                "discarding un-finalized wave {} before starting wave {}",
                discarded.wave.get(),
                wave.get(),
            );
        }

        self.active = Some(ActiveWave {
            wave,
            started_at: now,
            damage_taken: 0.0,
            shots_fired: 0,
            shots_hit: 0,
        });
        telemetry.reset_telemetry_for_wave(now);
    }

    /// Adds damage dealt to the player; negative amounts are discarded.
    pub fn on_player_damaged(&mut self, amount: f32) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        active.damage_taken += amount.max(0.0);
    }

    /// Records a resolved player shot.
    pub fn on_player_shot_resolved(&mut self, hit: bool) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        active.shots_fired += 1;
        if hit {
            active.shots_hit += 1;
        }
    }

    /// Finalizes the active wave into frozen records and stores them.
    ///
    /// The wave duration is floored to a small positive epsilon so downstream
    /// scoring never divides by zero. Calling this without a preceding
    /// [`MetricsCollector::begin_wave`] is a lifecycle-ordering error.
    pub fn end_wave_and_store(
        &mut self,
        now: Duration,
        telemetry: &dyn EnemyTelemetrySource,
    ) -> Result<(PlayerWaveMetrics, EnemyWaveTelemetry), CollectError> {
        let active = self.active.take().ok_or(CollectError::NoActiveWave)?;

        let wave_duration = now
            .saturating_sub(active.started_at)
            .max(MIN_WAVE_DURATION);
        let accuracy01 = if active.shots_fired > 0 {
            active.shots_hit as f32 / active.shots_fired as f32
        } else {
            0.0
        };

        let player = PlayerWaveMetrics {
            wave: active.wave,
            wave_duration,
            damage_taken: active.damage_taken,
            shots_fired: active.shots_fired,
            shots_hit: active.shots_hit,
            accuracy01,
            perf01: 0.0,
        };
        let enemy = telemetry.snapshot_telemetry(active.wave);

        self.history.push(player.clone(), enemy.clone());
        Ok((player, enemy))
    }

    /// Returns the wave currently accumulating, if any.
    #[must_use]
    pub fn active_wave(&self) -> Option<WaveIndex> {
        self.active.as_ref().map(|active| active.wave)
    }

    /// Read-only access to the depth-2 rolling history.
    #[must_use]
    pub fn history(&self) -> &WaveHistory {
        &self.history
    }

    /// Stamps deferred performance scores onto the stored records.
    pub fn stamp_performance(&mut self, prev_perf01: Option<f32>, last_perf01: f32) {
        self.history.stamp_performance(prev_perf01, last_perf01);
    }
}

#[cfg(test)]
mod tests {
    use super::{MetricsCollector, MIN_WAVE_DURATION};
    use arena_director_core::{
        CollectError, EnemyTelemetrySource, EnemyWaveTelemetry, WaveIndex,
    };
    use std::time::Duration;

    #[derive(Default)]
    struct StubTelemetry {
        resets: Vec<Duration>,
    }

    impl EnemyTelemetrySource for StubTelemetry {
        fn reset_telemetry_for_wave(&mut self, start: Duration) {
            self.resets.push(start);
        }

        fn snapshot_telemetry(&self, wave: WaveIndex) -> EnemyWaveTelemetry {
            EnemyWaveTelemetry {
                strafe_percent01: 0.5,
                ..EnemyWaveTelemetry::empty(wave)
            }
        }
    }

    #[test]
    fn collects_counters_into_a_finalized_record() {
        let mut collector = MetricsCollector::new();
        let mut telemetry = StubTelemetry::default();

        collector.begin_wave(WaveIndex::new(0), Duration::from_secs(5), &mut telemetry);
        assert_eq!(telemetry.resets, vec![Duration::from_secs(5)]);
        assert_eq!(collector.active_wave(), Some(WaveIndex::new(0)));

        collector.on_player_damaged(10.0);
        collector.on_player_damaged(6.5);
        collector.on_player_shot_resolved(true);
        collector.on_player_shot_resolved(false);
        collector.on_player_shot_resolved(true);

        let (player, enemy) = collector
            .end_wave_and_store(Duration::from_secs(17), &telemetry)
            .expect("active wave finalizes");

        assert_eq!(player.wave, WaveIndex::new(0));
        assert_eq!(player.wave_duration, Duration::from_secs(12));
        assert!((player.damage_taken - 16.5).abs() < 1e-6);
        assert_eq!(player.shots_fired, 3);
        assert_eq!(player.shots_hit, 2);
        assert!((player.accuracy01 - 2.0 / 3.0).abs() < 1e-6);
        assert_eq!(player.perf01, 0.0);
        assert_eq!(enemy.wave, WaveIndex::new(0));
        assert_eq!(collector.active_wave(), None);
        assert_eq!(
            collector.history().last().expect("stored").player,
            player,
        );
    }

    #[test]
    fn zero_shots_produce_zero_accuracy() {
        let mut collector = MetricsCollector::new();
        let mut telemetry = StubTelemetry::default();

        collector.begin_wave(WaveIndex::new(0), Duration::ZERO, &mut telemetry);
        let (player, _) = collector
            .end_wave_and_store(Duration::from_secs(4), &telemetry)
            .expect("finalize");

        assert_eq!(player.shots_fired, 0);
        assert_eq!(player.accuracy01, 0.0);
    }

    #[test]
    fn instantaneous_wave_duration_is_floored() {
        let mut collector = MetricsCollector::new();
        let mut telemetry = StubTelemetry::default();

        collector.begin_wave(WaveIndex::new(0), Duration::from_secs(3), &mut telemetry);
        let (player, _) = collector
            .end_wave_and_store(Duration::from_secs(3), &telemetry)
            .expect("finalize");

        assert_eq!(player.wave_duration, MIN_WAVE_DURATION);
    }

    #[test]
    fn negative_damage_is_discarded() {
        let mut collector = MetricsCollector::new();
        let mut telemetry = StubTelemetry::default();

        collector.begin_wave(WaveIndex::new(0), Duration::ZERO, &mut telemetry);
        collector.on_player_damaged(-25.0);
        collector.on_player_damaged(4.0);

        let (player, _) = collector
            .end_wave_and_store(Duration::from_secs(1), &telemetry)
            .expect("finalize");
        assert!((player.damage_taken - 4.0).abs() < 1e-6);
    }

    #[test]
    fn intake_outside_an_active_wave_is_dropped() {
        let mut collector = MetricsCollector::new();
        let mut telemetry = StubTelemetry::default();

        collector.on_player_damaged(50.0);
        collector.on_player_shot_resolved(true);

        collector.begin_wave(WaveIndex::new(0), Duration::ZERO, &mut telemetry);
        let (player, _) = collector
            .end_wave_and_store(Duration::from_secs(1), &telemetry)
            .expect("finalize");

        assert_eq!(player.damage_taken, 0.0);
        assert_eq!(player.shots_fired, 0);
    }

    #[test]
    fn finalize_without_begin_fails_loudly() {
        let mut collector = MetricsCollector::new();
        let telemetry = StubTelemetry::default();

        assert_eq!(
            collector
                .end_wave_and_store(Duration::from_secs(1), &telemetry)
                .unwrap_err(),
            CollectError::NoActiveWave,
        );
    }

    #[test]
    fn begin_while_active_discards_the_wave_in_progress() {
        let mut collector = MetricsCollector::new();
        let mut telemetry = StubTelemetry::default();

        collector.begin_wave(WaveIndex::new(0), Duration::ZERO, &mut telemetry);
        collector.on_player_shot_resolved(true);

        collector.begin_wave(WaveIndex::new(1), Duration::from_secs(2), &mut telemetry);
        let (player, _) = collector
            .end_wave_and_store(Duration::from_secs(6), &telemetry)
            .expect("finalize");

        assert_eq!(player.wave, WaveIndex::new(1));
        assert_eq!(player.shots_fired, 0);
        assert!(collector.history().prev().is_none(), "wave 0 never stored");
    }

    #[test]
    fn history_keeps_the_two_most_recent_waves() {
        let mut collector = MetricsCollector::new();
        let mut telemetry = StubTelemetry::default();

        for wave in 0..3 {
            let start = Duration::from_secs(u64::from(wave) * 10);
            collector.begin_wave(WaveIndex::new(wave), start, &mut telemetry);
            let _ = collector
                .end_wave_and_store(start + Duration::from_secs(8), &telemetry)
                .expect("finalize");
        }

        let (prev, last) = collector.history().last_pair().expect("two records");
        assert_eq!(prev.player.wave, WaveIndex::new(1));
        assert_eq!(last.player.wave, WaveIndex::new(2));
    }
}
