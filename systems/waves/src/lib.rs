#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave scheduler walking a session through its fixed wave table.
//!
//! The scheduler owns the table and its cursor. Every transition is mirrored
//! into the world with `Command::SetWaveStage`, and enemies are emitted with
//! `Command::SpawnEnemy` on core paths whose main path is active in the
//! current phase.

use std::{ops::RangeInclusive, time::Duration};

use pit_defence_core::{Command, CorePath, Event, MapLayout, PathId, ShiftOutcome, WaveStage};
use pit_defence_system_loot::roll_waste;
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Number of waves in a session.
pub const WAVE_COUNT: u32 = 15;

/// Total enemy hit points of the first wave.
pub const WAVE_HP_BUDGET: f32 = 600.0;

/// Time over which a wave's enemies are spread.
pub const WAVE_SPAWN_WINDOW: Duration = Duration::from_secs(30);

/// Pause between the last spawn of a wave and the next wave.
pub const WAVE_DELAY: Duration = Duration::from_secs(10);

/// Waves whose number is a multiple of this are preceded by a break and led
/// by a mini-boss.
pub const BREAK_INTERVAL: u32 = 5;

/// Range the enemy count of a wave is drawn from.
pub const ENEMY_COUNT: RangeInclusive<u32> = 20..=40;

/// Highest phase a session can reach.
pub const MAX_PHASE: u8 = 3;

/// One row of the wave table.
#[derive(Clone, Debug, PartialEq)]
pub struct WaveRecord {
    /// One-based wave number.
    pub number: u32,
    /// Phase the wave belongs to.
    pub phase: u8,
    /// Enemies emitted by the wave.
    pub enemy_count: u32,
    /// Hit point budget of each enemy before size and rarity scaling.
    pub enemy_hp: f32,
    /// Time between two spawns.
    pub spawn_interval: Duration,
    /// Whether the first enemy is a mini-boss.
    pub boss: bool,
}

/// Phase of a wave: waves 1-4 are phase 1, 5-9 phase 2, the rest phase 3.
#[must_use]
pub const fn phase_for_wave(number: u32) -> u8 {
    match number / BREAK_INTERVAL {
        0 => 1,
        1 => 2,
        _ => MAX_PHASE,
    }
}

/// Number of leading main paths that spawn enemies in a phase.
#[must_use]
pub fn active_main_paths(phase: u8, main_paths: usize) -> usize {
    let active = match phase {
        0 | 1 => 1,
        2 => 2,
        _ => main_paths,
    };
    active.min(main_paths)
}

/// Rolls the complete wave table.
pub fn wave_table<R: Rng + ?Sized>(rng: &mut R) -> Vec<WaveRecord> {
    (1..=WAVE_COUNT)
        .map(|number| {
            let enemy_count = rng.gen_range(ENEMY_COUNT);
            let budget = WAVE_HP_BUDGET * (1.0 + 0.2 * (number - 1) as f32);
            WaveRecord {
                number,
                phase: phase_for_wave(number),
                enemy_count,
                enemy_hp: budget / enemy_count as f32,
                spawn_interval: WAVE_SPAWN_WINDOW / enemy_count,
                boss: number % BREAK_INTERVAL == 0,
            }
        })
        .collect()
}

/// Pure system driving the wave state machine.
#[derive(Debug)]
pub struct WaveScheduler {
    table: Vec<WaveRecord>,
    cursor: usize,
    stage: WaveStage,
    elapsed: Duration,
    spawned: u32,
    rng: ChaCha8Rng,
}

impl WaveScheduler {
    /// Creates a scheduler whose table and spawns derive from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let table = wave_table(&mut rng);
        Self {
            table,
            cursor: 0,
            stage: WaveStage::Waiting,
            elapsed: Duration::ZERO,
            spawned: 0,
            rng,
        }
    }

    /// Current scheduler stage.
    #[must_use]
    pub const fn stage(&self) -> WaveStage {
        self.stage
    }

    /// Complete wave table.
    #[must_use]
    pub fn table(&self) -> &[WaveRecord] {
        &self.table
    }

    /// Reacts to world events, emitting stage and spawn commands.
    pub fn handle(&mut self, events: &[Event], map: &MapLayout, out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::WaveStartRequested if self.stage == WaveStage::Waiting => {
                    self.start_wave(0, out);
                }
                Event::BreakEndRequested if self.stage == WaveStage::Break => {
                    self.start_wave(self.cursor + 1, out);
                }
                Event::TimeAdvanced {
                    dt,
                    simulating: true,
                } => self.advance(*dt, map, out),
                _ => {}
            }
        }
    }

    fn start_wave(&mut self, index: usize, out: &mut Vec<Command>) {
        let Some(record) = self.table.get(index) else {
            return;
        };
        self.cursor = index;
        self.spawned = 0;
        self.elapsed = record.spawn_interval;
        self.set_stage(WaveStage::Spawning, out);
    }

    fn advance(&mut self, dt: Duration, map: &MapLayout, out: &mut Vec<Command>) {
        match self.stage {
            WaveStage::Spawning => {
                let Some(record) = self.table.get(self.cursor) else {
                    return;
                };
                let (count, interval) = (record.enemy_count, record.spawn_interval);
                self.elapsed = self.elapsed.saturating_add(dt);
                while self.spawned < count && self.elapsed >= interval {
                    self.elapsed -= interval;
                    self.spawn(map, out);
                }

                if self.spawned >= count {
                    self.elapsed = Duration::ZERO;
                    self.set_stage(WaveStage::Delay, out);
                }
            }
            WaveStage::Delay => {
                self.elapsed = self.elapsed.saturating_add(dt);
                if self.elapsed < WAVE_DELAY {
                    return;
                }
                self.elapsed = Duration::ZERO;

                let next = self.cursor + 1;
                let next_number = self.table.get(next).map(|record| record.number);
                match next_number {
                    None => {
                        self.set_stage(WaveStage::Completed, out);
                        out.push(Command::EndShift {
                            outcome: ShiftOutcome::Completed,
                        });
                    }
                    Some(number) if number % BREAK_INTERVAL == 0 => {
                        self.set_stage(WaveStage::Break, out);
                    }
                    Some(_) => self.start_wave(next, out),
                }
            }
            WaveStage::Waiting | WaveStage::Break | WaveStage::Completed => {}
        }
    }

    fn spawn(&mut self, map: &MapLayout, out: &mut Vec<Command>) {
        let Some(record) = self.table.get(self.cursor) else {
            return;
        };
        let boss = record.boss && self.spawned == 0;
        self.spawned += 1;

        let limit = active_main_paths(record.phase, map.main_path_count());
        let candidates: Vec<PathId> = map
            .core_paths()
            .iter()
            .filter(|path| path.main_path() < limit)
            .map(CorePath::id)
            .collect();
        let Some(path) = candidates.choose(&mut self.rng).copied() else {
            return;
        };

        let profile = roll_waste(&mut self.rng, record.number, record.enemy_hp, boss);
        out.push(Command::SpawnEnemy { path, profile });
    }

    fn set_stage(&mut self, stage: WaveStage, out: &mut Vec<Command>) {
        self.stage = stage;
        let (wave, phase) = self
            .table
            .get(self.cursor)
            .map_or((0, 1), |record| (record.number, record.phase));
        out.push(Command::SetWaveStage { stage, wave, phase });
    }
}
