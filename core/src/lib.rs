#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the arena director.
//!
//! This crate defines the message surface that connects the wave lifecycle
//! system to its collaborators. Collaborators feed [`Event`] values into the
//! lifecycle manager (time ticks, player combat telemetry, enemy fate
//! signals), the manager drives the closed difficulty loop, and responds with
//! [`Command`] values the spawner collaborator executes. Display collaborators
//! read state exclusively through snapshot views; nothing is ever pushed to
//! them.

use std::time::Duration;

use serde::{Deserialize, Serialize};

mod config;

pub use config::{ConfigError, DifficultyConfig, DirectorConfig, LifecycleConfig, ScoringConfig};

/// Sentinel stored in [`EnemyWaveTelemetry::time_to_first_hit_sec`] when the
/// enemy never landed a hit during the wave.
pub const TIME_TO_FIRST_HIT_NEVER: f32 = -1.0;

/// Index of a wave within a session, monotonically increasing from zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WaveIndex(u32);

impl WaveIndex {
    /// Creates a new wave index with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Returns the index of the wave that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Normalized difficulty scalar, always clamped to `[0, 1]`.
///
/// The current session difficulty only ever changes through the controller's
/// smoothing step; direct assignment is reserved for session initialization.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Difficulty01(f32);

impl Difficulty01 {
    /// Creates a difficulty value, clamping the input into `[0, 1]`.
    #[must_use]
    pub fn new(value: f32) -> Self {
        Self(value.clamp(0.0, 1.0))
    }

    /// Retrieves the underlying scalar.
    #[must_use]
    pub const fn get(&self) -> f32 {
        self.0
    }

    /// Moves this value a fraction `t` of the way toward `target`.
    #[must_use]
    pub fn lerp(self, target: Difficulty01, t: f32) -> Difficulty01 {
        Self::new(self.0 + (target.0 - self.0) * t)
    }
}

/// Events fed into the lifecycle manager by its collaborators.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Requests that the session leave `Idle` and spawn the first wave.
    SessionStarted,
    /// Advances the cooperative scheduling clock by the provided delta.
    TimeAdvanced {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Reports damage dealt to the player by the live encounter.
    PlayerDamaged {
        /// Damage amount; negative values are discarded at intake.
        amount: f32,
    },
    /// Reports that a player shot finished resolving.
    PlayerShotResolved {
        /// Whether the shot connected with the enemy.
        hit: bool,
    },
    /// Signals that the enemy of the given wave was defeated.
    EnemyDefeated {
        /// Wave the defeated enemy belonged to.
        wave: WaveIndex,
    },
    /// Signals that the enemy of the given wave left the playable area.
    EnemyOutOfBounds {
        /// Wave the removed enemy belonged to.
        wave: WaveIndex,
    },
}

/// Commands emitted by the lifecycle manager for the spawner collaborator.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Requests that the spawner instantiate the next encounter.
    SpawnEncounter {
        /// Wave the encounter belongs to.
        wave: WaveIndex,
        /// Difficulty the spawner must apply to the encounter's parameters.
        difficulty: Difficulty01,
    },
}

/// Resident phases of the wave lifecycle state machine.
///
/// The spawning and ending transitions are instantaneous, so observers only
/// ever witness one of these three phases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WavePhase {
    /// No session is running yet.
    Idle,
    /// An encounter is live and metrics are accumulating.
    Active,
    /// The inter-wave countdown is running.
    CountingDown,
}

/// Player-side record of one completed wave.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerWaveMetrics {
    /// Wave the record describes.
    pub wave: WaveIndex,
    /// Elapsed time from wave start to wave end; always positive.
    pub wave_duration: Duration,
    /// Accumulated damage dealt to the player during the wave.
    pub damage_taken: f32,
    /// Number of shots the player fired during the wave.
    pub shots_fired: u32,
    /// Number of shots that connected; never exceeds `shots_fired`.
    pub shots_hit: u32,
    /// `shots_hit / shots_fired`, or zero when no shots were fired.
    pub accuracy01: f32,
    /// Normalized performance score; zero until stamped by the scorer.
    pub perf01: f32,
}

/// Enemy-side telemetry record of one completed wave.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyWaveTelemetry {
    /// Wave the record describes.
    pub wave: WaveIndex,
    /// Fraction of movement spent strafing, in `[0, 1]`.
    pub strafe_percent01: f32,
    /// Average distance kept from the player, in world units.
    pub avg_distance: f32,
    /// Seconds until the enemy first hit the player, or
    /// [`TIME_TO_FIRST_HIT_NEVER`] when it never did.
    pub time_to_first_hit_sec: f32,
    /// Number of shots the enemy's policy requested.
    pub shots_requested: u32,
    /// Number of requested shots that actually fired; never exceeds
    /// `shots_requested`.
    pub shots_fired: u32,
    /// `shots_fired / shots_requested`, or zero when none were requested.
    pub timing_quality01: f32,
}

impl EnemyWaveTelemetry {
    /// Creates an all-zero telemetry record for the provided wave.
    #[must_use]
    pub const fn empty(wave: WaveIndex) -> Self {
        Self {
            wave,
            strafe_percent01: 0.0,
            avg_distance: 0.0,
            time_to_first_hit_sec: TIME_TO_FIRST_HIT_NEVER,
            shots_requested: 0,
            shots_fired: 0,
            timing_quality01: 0.0,
        }
    }

    /// Reports whether the enemy never hit the player during the wave.
    #[must_use]
    pub fn never_hit(&self) -> bool {
        self.time_to_first_hit_sec < 0.0
    }
}

/// One finalized wave: the player record and its enemy companion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveRecord {
    /// Player-side metrics for the wave.
    pub player: PlayerWaveMetrics,
    /// Enemy-side telemetry for the same wave.
    pub enemy: EnemyWaveTelemetry,
}

/// Fixed-depth retention of the two most recent finalized waves.
///
/// Records are frozen at push; the single permitted later mutation is the
/// deferred `perf01` stamp applied by [`WaveHistory::stamp_performance`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WaveHistory {
    prev: Option<WaveRecord>,
    last: Option<WaveRecord>,
}

impl WaveHistory {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a finalized wave, displacing the oldest retained record.
    pub fn push(&mut self, player: PlayerWaveMetrics, enemy: EnemyWaveTelemetry) {
        self.prev = self.last.take();
        self.last = Some(WaveRecord { player, enemy });
    }

    /// Reports whether two full wave records are retained.
    #[must_use]
    pub fn has_two(&self) -> bool {
        self.prev.is_some() && self.last.is_some()
    }

    /// Returns the older of the two retained records, if present.
    #[must_use]
    pub fn prev(&self) -> Option<&WaveRecord> {
        self.prev.as_ref()
    }

    /// Returns the most recent retained record, if present.
    #[must_use]
    pub fn last(&self) -> Option<&WaveRecord> {
        self.last.as_ref()
    }

    /// Returns the `(prev, last)` pair when both records are retained.
    #[must_use]
    pub fn last_pair(&self) -> Option<(&WaveRecord, &WaveRecord)> {
        match (self.prev.as_ref(), self.last.as_ref()) {
            (Some(prev), Some(last)) => Some((prev, last)),
            _ => None,
        }
    }

    /// Stamps the deferred performance scores onto the retained records.
    ///
    /// Values are clamped into `[0, 1]` so the record invariant holds even if
    /// a caller passes an unclamped score.
    pub fn stamp_performance(&mut self, prev_perf01: Option<f32>, last_perf01: f32) {
        if let (Some(record), Some(perf)) = (self.prev.as_mut(), prev_perf01) {
            record.player.perf01 = perf.clamp(0.0, 1.0);
        }
        if let Some(record) = self.last.as_mut() {
            record.player.perf01 = last_perf01.clamp(0.0, 1.0);
        }
    }
}

/// Read-only snapshot of the lifecycle manager state for display collaborators.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaveStatusSnapshot {
    /// Wave the session is currently on.
    pub wave: WaveIndex,
    /// Resident phase of the state machine.
    pub phase: WavePhase,
    /// Time left on the inter-wave countdown; zero outside the countdown.
    pub countdown_remaining: Duration,
    /// Whether the upcoming transition will adjust difficulty.
    pub adjusting: bool,
    /// Difficulty applied to the most recently spawned encounter.
    pub current_difficulty: Difficulty01,
    /// Difficulty the controller is steering toward.
    pub next_target_difficulty: Difficulty01,
}

impl WaveStatusSnapshot {
    /// Reports whether the inter-wave countdown is running.
    #[must_use]
    pub fn is_in_countdown(&self) -> bool {
        self.phase == WavePhase::CountingDown
    }
}

/// Capability contract implemented by the live enemy's telemetry source.
///
/// Supplied explicitly at the lifecycle entry points; the director never
/// locates collaborators by name or other runtime discovery.
pub trait EnemyTelemetrySource {
    /// Clears per-wave telemetry accumulation at the provided session time.
    fn reset_telemetry_for_wave(&mut self, start: Duration);

    /// Returns a frozen telemetry snapshot attributed to the provided wave.
    fn snapshot_telemetry(&self, wave: WaveIndex) -> EnemyWaveTelemetry;
}

/// Errors raised by the metrics collector on misused lifecycle ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CollectError {
    /// A wave finalize was requested while no wave was active.
    #[error("end_wave_and_store called without an active wave")]
    NoActiveWave,
}
