//! Headless driver that closes the difficulty loop with scripted collaborators.
//!
//! A [`SimulatedEnemy`] plays the spawner and telemetry-source roles while a
//! per-wave [`WavePlan`] scripts the player's behavior. Both draw from one
//! seeded RNG, so a session replays identically for the same arguments.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context};
use arena_director_core::{
    Command, Difficulty01, DirectorConfig, EnemyTelemetrySource, EnemyWaveTelemetry, Event,
    WaveIndex, TIME_TO_FIRST_HIT_NEVER,
};
use arena_director_system_wave_lifecycle::WaveLifecycle;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Ticks after which a session is declared stuck and aborted.
const MAX_TICKS: u64 = 10_000_000;

/// Fraction of policy-requested enemy shots that actually fire.
const ENEMY_TIMING_QUALITY: f64 = 0.85;

/// Seconds between scripted player shots.
const PLAYER_SHOT_INTERVAL_SEC: f32 = 0.4;

/// Options controlling a simulated session.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SessionOptions {
    /// Number of waves to complete before the session ends.
    pub(crate) waves: u32,
    /// Seed shared by the player and enemy models.
    pub(crate) seed: u64,
    /// Scheduling tick length.
    pub(crate) tick: Duration,
    /// Scripted player skill in `[0, 1]`.
    pub(crate) skill: f32,
}

/// Loads the director configuration, falling back to defaults without a file.
pub(crate) fn load_config(path: Option<&Path>) -> anyhow::Result<DirectorConfig> {
    let Some(path) = path else {
        return Ok(DirectorConfig::default());
    };

    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read director config at {}", path.display()))?;
    let config: DirectorConfig =
        toml::from_str(&contents).context("failed to parse director config toml contents")?;
    Ok(config)
}

/// Enemy tuning knobs scaled by the difficulty scalar.
#[derive(Clone, Copy, Debug)]
pub(crate) struct EnemyKnobs {
    /// Aiming error applied to enemy shots, in degrees.
    pub(crate) aim_error_deg: f32,
    /// Seconds between enemy shot requests.
    pub(crate) shoot_cooldown_sec: f32,
    /// Enemy movement speed in world units per second.
    pub(crate) move_speed: f32,
}

impl EnemyKnobs {
    /// Interpolates each knob between its easy and hard extreme.
    pub(crate) fn for_difficulty(difficulty: Difficulty01) -> Self {
        let d = difficulty.get();
        Self {
            aim_error_deg: lerp(7.0, 5.0, d),
            shoot_cooldown_sec: lerp(0.45, 0.30, d),
            move_speed: lerp(11.0, 13.0, d),
        }
    }
}

fn lerp(easy: f32, hard: f32, t: f32) -> f32 {
    easy + (hard - easy) * t
}

/// One row of the per-wave session report.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct WaveReportRow {
    /// Wave index the row describes.
    pub(crate) wave: u32,
    /// Difficulty the encounter was spawned with.
    pub(crate) difficulty: f32,
    /// Wave duration in seconds.
    pub(crate) duration_sec: f32,
    /// Damage the player took during the wave.
    pub(crate) damage_taken: f32,
    /// Player accuracy over the wave.
    pub(crate) accuracy01: f32,
    /// Stamped performance score of the wave.
    pub(crate) perf01: f32,
}

/// Complete outcome of a simulated session.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SessionReport {
    /// One row per completed wave, in order.
    pub(crate) rows: Vec<WaveReportRow>,
    /// Difficulty left applied when the session ended.
    pub(crate) final_difficulty: f32,
}

/// Runs a full closed-loop session and collects the per-wave report.
pub(crate) fn run(
    config: DirectorConfig,
    options: &SessionOptions,
) -> anyhow::Result<SessionReport> {
    let mut lifecycle = WaveLifecycle::new(config).context("invalid director configuration")?;
    let mut rng = ChaCha8Rng::seed_from_u64(options.seed);
    let mut enemy = SimulatedEnemy::new();
    let mut difficulties: Vec<f32> = Vec::new();
    let mut plan: Option<WavePlan> = None;
    let mut rows = Vec::new();

    let mut events = vec![Event::SessionStarted];
    let mut commands = Vec::new();
    let mut ticks: u64 = 0;
    let dt = options.tick;
    let dt_sec = dt.as_secs_f32();

    while rows.len() < options.waves as usize {
        lifecycle.handle(&events, &mut enemy, &mut commands);
        events.clear();

        for command in commands.drain(..) {
            let Command::SpawnEncounter { wave, difficulty } = command;
            let knobs = EnemyKnobs::for_difficulty(difficulty);
            log::debug!(
                "spawn apply wave={} diff={:.2} aim_err={:.2} cooldown={:.2} move={:.2}",
                wave.get(),
                difficulty.get(),
                knobs.aim_error_deg,
                knobs.shoot_cooldown_sec,
                knobs.move_speed,
            );
            enemy.arm(knobs);
            difficulties.push(difficulty.get());
            plan = Some(WavePlan::sample(wave, difficulty, options.skill, &mut rng));
        }

        if plan.is_some() && lifecycle.status().is_in_countdown() {
            plan = None;
            if let Some(record) = lifecycle.history().last() {
                let wave = record.player.wave.get();
                rows.push(WaveReportRow {
                    wave,
                    difficulty: difficulties.get(wave as usize).copied().unwrap_or(0.0),
                    duration_sec: record.player.wave_duration.as_secs_f32(),
                    damage_taken: record.player.damage_taken,
                    accuracy01: record.player.accuracy01,
                    perf01: record.player.perf01,
                });
            }
            continue;
        }

        events.push(Event::TimeAdvanced { dt });

        if let Some(active) = plan.as_mut() {
            active.elapsed_sec += dt_sec;

            active.player_shot_accum += dt_sec;
            while active.player_shot_accum >= PLAYER_SHOT_INTERVAL_SEC {
                active.player_shot_accum -= PLAYER_SHOT_INTERVAL_SEC;
                let hit = rng.gen_bool(active.player_hit_chance);
                events.push(Event::PlayerShotResolved { hit });
            }

            if let Some(amount) = enemy.step(dt_sec, active.enemy_hit_chance, &mut rng) {
                events.push(Event::PlayerDamaged { amount });
            }

            if active.elapsed_sec >= active.fight_duration_sec {
                let wave = active.wave;
                events.push(if active.ends_out_of_bounds {
                    Event::EnemyOutOfBounds { wave }
                } else {
                    Event::EnemyDefeated { wave }
                });
            }
        }

        ticks += 1;
        if ticks > MAX_TICKS {
            bail!("session failed to complete within {MAX_TICKS} ticks");
        }
    }

    Ok(SessionReport {
        rows,
        final_difficulty: lifecycle.status().current_difficulty.get(),
    })
}

/// Prints the session report as a fixed-width table.
pub(crate) fn print_report(report: &SessionReport) {
    println!("wave  diff  time(s)  damage  accuracy  perf");
    for row in &report.rows {
        println!(
            "{:>4}  {:>4.2}  {:>7.2}  {:>6.1}  {:>7.0}%  {:>4.2}",
            row.wave,
            row.difficulty,
            row.duration_sec,
            row.damage_taken,
            row.accuracy01 * 100.0,
            row.perf01,
        );
    }
    println!("final difficulty: {:.2}", report.final_difficulty);
}

/// Scripted outcome parameters for one wave, sampled at spawn time.
#[derive(Debug)]
struct WavePlan {
    wave: WaveIndex,
    fight_duration_sec: f32,
    ends_out_of_bounds: bool,
    player_hit_chance: f64,
    enemy_hit_chance: f64,
    player_shot_accum: f32,
    elapsed_sec: f32,
}

impl WavePlan {
    fn sample(
        wave: WaveIndex,
        difficulty: Difficulty01,
        skill: f32,
        rng: &mut ChaCha8Rng,
    ) -> Self {
        let d = difficulty.get();

        // Harder encounters outlast the same player; better players finish
        // sooner. Jitter keeps consecutive waves from being identical.
        let pressure = (1.0 + 0.8 * (d - skill)).max(0.4);
        let jitter = 0.75 + 0.5 * rng.gen::<f32>();
        let fight_duration_sec = (12.0 * pressure * jitter).clamp(2.0, 45.0);

        Self {
            wave,
            fight_duration_sec,
            ends_out_of_bounds: rng.gen::<f32>() < 0.04,
            player_hit_chance: f64::from((0.25 + 0.6 * skill - 0.15 * d).clamp(0.05, 0.95)),
            enemy_hit_chance: f64::from((0.2 + 0.5 * d - 0.2 * skill).clamp(0.05, 0.9)),
            player_shot_accum: 0.0,
            elapsed_sec: 0.0,
        }
    }
}

/// Stand-in for the live enemy agent: spawner target and telemetry source.
#[derive(Debug)]
struct SimulatedEnemy {
    knobs: EnemyKnobs,
    cooldown_left: f32,
    elapsed_sec: f32,
    shots_requested: u32,
    shots_fired: u32,
    first_hit_sec: Option<f32>,
    distance_sum: f32,
    strafe_sum: f32,
    samples: u32,
}

impl SimulatedEnemy {
    fn new() -> Self {
        Self {
            knobs: EnemyKnobs::for_difficulty(Difficulty01::new(0.0)),
            cooldown_left: 0.0,
            elapsed_sec: 0.0,
            shots_requested: 0,
            shots_fired: 0,
            first_hit_sec: None,
            distance_sum: 0.0,
            strafe_sum: 0.0,
            samples: 0,
        }
    }

    fn arm(&mut self, knobs: EnemyKnobs) {
        self.knobs = knobs;
        self.cooldown_left = knobs.shoot_cooldown_sec;
    }

    /// Advances the enemy by one tick; returns damage dealt to the player.
    fn step(&mut self, dt_sec: f32, hit_chance: f64, rng: &mut ChaCha8Rng) -> Option<f32> {
        self.elapsed_sec += dt_sec;

        self.distance_sum += 7.0 + 4.0 * rng.gen::<f32>();
        self.strafe_sum += 0.8 * rng.gen::<f32>();
        self.samples += 1;

        self.cooldown_left -= dt_sec;
        if self.cooldown_left > 0.0 {
            return None;
        }
        self.cooldown_left = self.knobs.shoot_cooldown_sec.max(0.05);

        self.shots_requested += 1;
        if !rng.gen_bool(ENEMY_TIMING_QUALITY) {
            return None;
        }
        self.shots_fired += 1;

        if rng.gen_bool(hit_chance) {
            if self.first_hit_sec.is_none() {
                self.first_hit_sec = Some(self.elapsed_sec);
            }
            return Some(8.0 + 6.0 * rng.gen::<f32>());
        }
        None
    }
}

impl EnemyTelemetrySource for SimulatedEnemy {
    fn reset_telemetry_for_wave(&mut self, _start: Duration) {
        self.cooldown_left = self.knobs.shoot_cooldown_sec;
        self.elapsed_sec = 0.0;
        self.shots_requested = 0;
        self.shots_fired = 0;
        self.first_hit_sec = None;
        self.distance_sum = 0.0;
        self.strafe_sum = 0.0;
        self.samples = 0;
    }

    fn snapshot_telemetry(&self, wave: WaveIndex) -> EnemyWaveTelemetry {
        let samples = self.samples.max(1) as f32;
        EnemyWaveTelemetry {
            wave,
            strafe_percent01: (self.strafe_sum / samples).clamp(0.0, 1.0),
            avg_distance: self.distance_sum / samples,
            time_to_first_hit_sec: self.first_hit_sec.unwrap_or(TIME_TO_FIRST_HIT_NEVER),
            shots_requested: self.shots_requested,
            shots_fired: self.shots_fired,
            timing_quality01: if self.shots_requested > 0 {
                self.shots_fired as f32 / self.shots_requested as f32
            } else {
                0.0
            },
        }
    }
}
