#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave lifecycle state machine driving the adaptive difficulty loop.
//!
//! The manager consumes collaborator [`Event`]s (time ticks, player combat
//! reports, enemy fate signals) and emits [`Command`]s for the spawner. One
//! full cycle runs spawn → combat → metrics collection → countdown →
//! optional difficulty adjustment → respawn, repeating until the owning
//! session stops driving it. The countdown is an explicit polled timer value
//! decremented by ticks, so the whole loop stays deterministic and
//! single-threaded.

use std::time::Duration;

use arena_director_core::{
    Command, ConfigError, Difficulty01, DirectorConfig, EnemyTelemetrySource, Event, WaveHistory,
    WaveIndex, WavePhase, WaveStatusSnapshot,
};
use arena_director_system_difficulty::DifficultyController;
use arena_director_system_metrics::MetricsCollector;
use log::{debug, info, warn};

/// Orchestrates wave transitions and owns the difficulty loop state.
#[derive(Debug)]
pub struct WaveLifecycle {
    countdown: Duration,
    adjustment_period: u32,
    phase: WavePhase,
    wave: WaveIndex,
    clock: Duration,
    countdown_remaining: Duration,
    adjusting: bool,
    collector: MetricsCollector,
    controller: DifficultyController,
}

impl WaveLifecycle {
    /// Creates a lifecycle manager, rejecting invalid configuration.
    pub fn new(config: DirectorConfig) -> Result<Self, ConfigError> {
        config.lifecycle.validate()?;

        let mut controller = DifficultyController::new(config.scoring, config.difficulty)?;
        controller.set_current(Difficulty01::new(config.lifecycle.initial_difficulty01));

        Ok(Self {
            countdown: Duration::from_secs_f32(config.lifecycle.countdown_sec),
            adjustment_period: config.lifecycle.adjustment_period,
            phase: WavePhase::Idle,
            wave: WaveIndex::new(0),
            clock: Duration::ZERO,
            countdown_remaining: Duration::ZERO,
            adjusting: false,
            collector: MetricsCollector::new(),
            controller,
        })
    }

    /// Consumes collaborator events, in order, and emits spawn commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        telemetry: &mut dyn EnemyTelemetrySource,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            match event {
                Event::SessionStarted => self.start_session(telemetry, out),
                Event::TimeAdvanced { dt } => self.advance_time(*dt, telemetry, out),
                Event::PlayerDamaged { amount } => self.collector.on_player_damaged(*amount),
                Event::PlayerShotResolved { hit } => {
                    self.collector.on_player_shot_resolved(*hit);
                }
                Event::EnemyDefeated { wave } => self.wave_ended(*wave, "defeated", telemetry),
                Event::EnemyOutOfBounds { wave } => {
                    self.wave_ended(*wave, "out of bounds", telemetry);
                }
            }
        }
    }

    /// Read-only snapshot of the lifecycle state for display collaborators.
    #[must_use]
    pub fn status(&self) -> WaveStatusSnapshot {
        WaveStatusSnapshot {
            wave: self.wave,
            phase: self.phase,
            countdown_remaining: self.countdown_remaining,
            adjusting: self.adjusting,
            current_difficulty: self.controller.current(),
            next_target_difficulty: self.controller.target(),
        }
    }

    /// Read-only access to the last two finalized wave records.
    #[must_use]
    pub fn history(&self) -> &WaveHistory {
        self.collector.history()
    }

    fn start_session(&mut self, telemetry: &mut dyn EnemyTelemetrySource, out: &mut Vec<Command>) {
        if self.phase != WavePhase::Idle {
            warn!("session start ignored: lifecycle already running");
            return;
        }
        self.spawn_wave(telemetry, out);
    }

    fn advance_time(
        &mut self,
        dt: Duration,
        telemetry: &mut dyn EnemyTelemetrySource,
        out: &mut Vec<Command>,
    ) {
        self.clock = self.clock.saturating_add(dt);

        if self.phase != WavePhase::CountingDown {
            return;
        }

        self.countdown_remaining = self.countdown_remaining.saturating_sub(dt);
        if !self.countdown_remaining.is_zero() {
            return;
        }

        if self.adjusting {
            let changed = self.controller.apply_target_with_smoothing();
            info!(
                "difficulty applied: changed={changed} current={:.2} target={:.2}",
                self.controller.current().get(),
                self.controller.target().get(),
            );
            self.adjusting = false;
        }

        self.wave = self.wave.next();
        self.spawn_wave(telemetry, out);
    }

    fn wave_ended(
        &mut self,
        wave: WaveIndex,
        reason: &str,
        telemetry: &mut dyn EnemyTelemetrySource,
    ) {
        match self.phase {
            WavePhase::Active => {
                if wave != self.wave {
                    warn!(
                        "stale wave-end signal for wave {} ignored; wave {} is live",
                        wave.get(),
                        self.wave.get(),
                    );
                    return;
                }
                self.finish_wave(reason, telemetry);
            }
            WavePhase::CountingDown => {
                // Defensive: a second wave-end while waiting restarts the
                // single countdown timer; the adjust decision stays armed and
                // is still consumed exactly once at expiry.
                warn!(
                    "wave-end signal for wave {} during countdown; restarting countdown",
                    wave.get(),
                );
                self.countdown_remaining = self.countdown;
            }
            WavePhase::Idle => {
                warn!("wave-end signal for wave {} ignored: no session", wave.get());
            }
        }
    }

    fn finish_wave(&mut self, reason: &str, telemetry: &mut dyn EnemyTelemetrySource) {
        let (player, enemy) = match self.collector.end_wave_and_store(self.clock, telemetry) {
            Ok(records) => records,
            Err(error) => {
                log::error!("wave {} finalize failed: {error}", self.wave.get());
                return;
            }
        };

        let perf_last = self.controller.score(&player);
        let perf_prev = self
            .collector
            .history()
            .prev()
            .map(|record| self.controller.score(&record.player));
        self.collector.stamp_performance(perf_prev, perf_last);

        info!(
            "wave {} ended ({reason}): damage={:.1} duration={:.2}s shots={}/{} accuracy={:.0}% perf={:.2}",
            player.wave.get(),
            player.damage_taken,
            player.wave_duration.as_secs_f32(),
            player.shots_hit,
            player.shots_fired,
            player.accuracy01 * 100.0,
            perf_last,
        );
        debug!(
            "enemy telemetry wave {}: strafe={:.0}% avg_dist={:.2} first_hit_sec={:.2} shots={}/{}",
            enemy.wave.get(),
            enemy.strafe_percent01 * 100.0,
            enemy.avg_distance,
            enemy.time_to_first_hit_sec,
            enemy.shots_fired,
            enemy.shots_requested,
        );

        // The cadence is evaluated against the upcoming wave index, and
        // adjustment always waits for two full historical samples.
        let upcoming = self.wave.next();
        self.adjusting = upcoming.get() % self.adjustment_period == 0
            && self.collector.history().has_two();

        if self.adjusting {
            if let Some((prev, last)) = self.collector.history().last_pair() {
                let preview = self
                    .controller
                    .compute_target_from_last_two(&prev.player, &last.player);
                info!(
                    "difficulty adjustment before wave {}: perf_prev={:.2} perf_last={:.2} perf2={:.2} target={:.2}",
                    upcoming.get(),
                    preview.perf_prev,
                    preview.perf_last,
                    preview.perf2,
                    preview.target.get(),
                );
            }
        } else {
            let current = self.controller.current();
            self.controller.set_current(current);
            debug!("no adjustment before wave {}", upcoming.get());
        }

        self.phase = WavePhase::CountingDown;
        self.countdown_remaining = self.countdown;
    }

    fn spawn_wave(&mut self, telemetry: &mut dyn EnemyTelemetrySource, out: &mut Vec<Command>) {
        let difficulty = self.controller.current();
        out.push(Command::SpawnEncounter {
            wave: self.wave,
            difficulty,
        });
        self.collector.begin_wave(self.wave, self.clock, telemetry);
        self.phase = WavePhase::Active;
        self.countdown_remaining = Duration::ZERO;
        debug!(
            "spawned wave {} at difficulty {:.2}",
            self.wave.get(),
            difficulty.get(),
        );
    }
}
